//! Reconstruction of discrete level pulses from the raw sample stream.

use crate::error::DhtError;
use crate::io::{DhtPin, Sample};

/// Hard cap on the number of pulses recorded in one acquisition.
///
/// A healthy response is ~82 pulses; hitting this bound means the line never
/// settles to idle (stuck or floating pin) and aborts the attempt.
pub const MAX_PULSE_COUNT: usize = 16_000;

/// Consecutive same-level samples after which the idle timeout is checked.
const IDLE_POLL_SAMPLES: u32 = 20;

/// One contiguous run of a constant line level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pulse {
    /// `true` when the line was high for the duration of this pulse.
    pub level: bool,
    /// Width of the run in microseconds.
    pub duration_us: u32,
}

/// Fixed-capacity buffer the reconstructor records into.
pub type PulseBuffer = heapless::Vec<Pulse, MAX_PULSE_COUNT>;

/// Pull samples from `pin` and merge same-level runs into pulses until the
/// line has been quiet for `idle_timeout_ms`.
///
/// The first sample opens the first pulse; every level change closes the
/// current pulse with the time between the two transitions and opens the
/// next one. The final pulse is closed with exactly the timeout value, so a
/// complete recording always ends in one trailing idle pulse. Output order
/// is chronological.
pub fn record_pulses<P: DhtPin>(
    pin: &mut P,
    idle_timeout_ms: u32,
    pulses: &mut PulseBuffer,
) -> Result<(), DhtError<P::Error>> {
    pulses.clear();
    let timeout_us = u64::from(idle_timeout_ms) * 1_000;

    let first = pin.sample().map_err(DhtError::Io)?;
    let mut level = first.level;
    let mut opened_at = first.timestamp_us;
    let mut same_level_samples: u32 = 0;

    loop {
        let Sample {
            level: next,
            timestamp_us,
        } = pin.sample().map_err(DhtError::Io)?;

        if next != level {
            // Saturate rather than wrap: a collaborator handing back a
            // non-monotonic timestamp or a gap wider than u32 microseconds
            // must not corrupt the pulse train.
            let duration_us =
                u32::try_from(timestamp_us.saturating_sub(opened_at)).unwrap_or(u32::MAX);
            push(pulses, Pulse { level, duration_us })?;
            level = next;
            opened_at = timestamp_us;
            same_level_samples = 0;
            continue;
        }

        // Checking the clock on every sample would widen the loop; only do
        // it once a run of identical samples suggests the line has gone
        // idle. Ending on timeout is the normal terminal condition.
        if same_level_samples > IDLE_POLL_SAMPLES
            && timestamp_us.saturating_sub(opened_at) > timeout_us
        {
            push(
                pulses,
                Pulse {
                    level,
                    duration_us: timeout_us as u32,
                },
            )?;
            return Ok(());
        }
        same_level_samples += 1;
    }
}

fn push<E>(pulses: &mut PulseBuffer, pulse: Pulse) -> Result<(), DhtError<E>> {
    pulses.push(pulse).map_err(|_| DhtError::Capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::testing::{sample_stream, Attempt, ScriptError, ScriptedPin};

    const TIMEOUT_MS: u32 = 10;

    fn record(pin: &mut ScriptedPin) -> Result<PulseBuffer, DhtError<ScriptError>> {
        let mut pulses = PulseBuffer::new();
        record_pulses(pin, TIMEOUT_MS, &mut pulses)?;
        Ok(pulses)
    }

    #[test]
    fn merges_runs_into_chronological_pulses() {
        let stream = sample_stream(&[(true, 80), (false, 50), (true, 26)], false);
        let mut pin = ScriptedPin::single(stream);

        let pulses = record(&mut pin).unwrap();

        assert_eq!(pulses.len(), 4);
        assert_eq!(pulses[0], Pulse { level: true, duration_us: 80 });
        assert_eq!(pulses[1], Pulse { level: false, duration_us: 50 });
        assert_eq!(pulses[2], Pulse { level: true, duration_us: 26 });
        // The trailing idle pulse carries exactly the timeout width.
        assert_eq!(pulses[3], Pulse { level: false, duration_us: 10_000 });
    }

    #[test]
    fn intermediate_samples_do_not_split_pulses() {
        // Several samples inside one high run must still yield one pulse.
        let stream = vec![
            Sample { level: true, timestamp_us: 0 },
            Sample { level: true, timestamp_us: 30 },
            Sample { level: true, timestamp_us: 60 },
            Sample { level: false, timestamp_us: 90 },
        ]
        .into_iter()
        .chain(sample_stream(&[], false).into_iter().map(|mut s| {
            s.timestamp_us += 90;
            s
        }))
        .collect();
        let mut pin = ScriptedPin::single(stream);

        let pulses = record(&mut pin).unwrap();

        assert_eq!(pulses[0], Pulse { level: true, duration_us: 90 });
        assert_eq!(pulses.len(), 2);
    }

    #[test]
    fn out_of_range_transition_gaps_saturate_instead_of_panicking() {
        let base = u64::from(u32::MAX) + 1_000;
        let mut stream = vec![
            Sample { level: true, timestamp_us: 100 },
            Sample { level: false, timestamp_us: 40 }, // clock went backwards
            Sample { level: true, timestamp_us: base }, // gap wider than u32
        ];
        for i in 0u64..40 {
            stream.push(Sample {
                level: true,
                timestamp_us: base + i * 500,
            });
        }
        let mut pin = ScriptedPin::single(stream);

        let pulses = record(&mut pin).unwrap();

        assert_eq!(pulses.len(), 3);
        assert_eq!(pulses[0], Pulse { level: true, duration_us: 0 });
        assert_eq!(pulses[1], Pulse { level: false, duration_us: u32::MAX });
        assert_eq!(pulses[2], Pulse { level: true, duration_us: 10_000 });
    }

    #[test]
    fn stuck_line_exceeds_pulse_capacity() {
        let samples: Vec<Sample> = (0..MAX_PULSE_COUNT + 2)
            .map(|i| Sample {
                level: i % 2 == 0,
                timestamp_us: (i as u64) * 10,
            })
            .collect();
        let mut pin = ScriptedPin::single(samples);

        assert_eq!(record(&mut pin), Err(DhtError::Capacity));
    }

    #[test]
    fn hardware_failure_propagates_as_io() {
        let mut pin = ScriptedPin::new(vec![Attempt::Fail]);

        assert_eq!(record(&mut pin), Err(DhtError::Io(ScriptError)));
    }
}
