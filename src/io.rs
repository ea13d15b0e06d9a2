//! Hardware seam between the decoder and the physical data line.
//!
//! The DHT family uses one open-drain wire that both sides drive, so the
//! collaborator is a single reconfigurable pin rather than the split
//! `InputPin`/`OutputPin` pair of `embedded-hal` (which still has no trait
//! for switching a pin's direction at runtime).

/// One timestamped level sample taken from the data line.
///
/// Timestamps are microseconds on a monotonic clock; only differences are
/// ever taken, so the epoch is irrelevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    /// `true` when the line is high.
    pub level: bool,
    /// Monotonic timestamp in microseconds.
    pub timestamp_us: u64,
}

/// Exclusive access to the sensor's data pin.
///
/// Implementations wrap a platform GPIO pin plus a monotonic clock. The
/// sampling loop calls [`sample`](DhtPin::sample) as fast as the platform
/// allows; the timestamp must be taken at the moment the level is read.
pub trait DhtPin {
    /// Hardware error type.
    type Error;

    /// Reconfigure the pin as a push-pull output.
    fn set_output(&mut self) -> Result<(), Self::Error>;

    /// Reconfigure the pin as an input (with pull-up where available).
    fn set_input(&mut self) -> Result<(), Self::Error>;

    /// Drive the output high.
    fn write_high(&mut self) -> Result<(), Self::Error>;

    /// Drive the output low.
    fn write_low(&mut self) -> Result<(), Self::Error>;

    /// Read the current line level together with a monotonic timestamp.
    fn sample(&mut self) -> Result<Sample, Self::Error>;

    /// Hook bracketing the timing-critical part of an acquisition.
    ///
    /// Hosted implementations can raise the process to a realtime scheduling
    /// class here so the sampling loop is not preempted; the default is a
    /// no-op for platforms where the loop already runs uninterrupted.
    fn set_boost(&mut self, _enabled: bool) -> Result<(), Self::Error> {
        Ok(())
    }
}
