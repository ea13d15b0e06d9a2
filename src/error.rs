//! Error type shared by every stage of an acquisition attempt.

/// All the ways a single acquisition attempt can fail.
///
/// `E` is the hardware error type of the [`DhtPin`](crate::io::DhtPin)
/// implementation. Every variant is transient from the orchestrator's point
/// of view: [`read_with_retry`](crate::sensor::DhtSensor::read_with_retry)
/// retries uniformly and surfaces the last error once the budget is spent.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DhtError<E> {
    /// Hardware access failed in the pin collaborator.
    Io(E),
    /// Pulse polarity or width at `index` is outside protocol bounds,
    /// indicating line noise or bit-pair misalignment.
    Protocol { index: usize },
    /// The response contained a pulse count that cannot hold a frame.
    FrameLength { count: usize },
    /// The transmitted checksum byte does not match the wrapping sum of the
    /// four data bytes.
    Checksum { received: u8, computed: u8 },
    /// A decoded value is outside physical bounds, or too few pulses remain
    /// to decode a full byte.
    Range,
    /// The pulse buffer overflowed; the line never settled to idle.
    Capacity,
}
