//! Decoder for the single-wire protocol spoken by the DHT11 and DHT22
//! (AM2302) humidity/temperature sensors.
//!
//! The sensor answers a wake pulse with a burst of roughly 40 low/high pulse
//! pairs whose high-phase widths encode the data bits. This crate turns a raw
//! timestamped level-sample stream into verified readings:
//!
//! 1. [`pulse`] reconstructs (level, duration) pulses from the sample stream,
//!    terminating on an idle timeout.
//! 2. [`decode`] classifies pulse pairs into bits, assembles the 5-byte frame,
//!    verifies the checksum and converts to physical units.
//! 3. [`sensor`] drives one acquisition attempt end to end and wraps it in a
//!    bounded fixed-backoff retry policy.
//!
//! Hardware access goes through the [`DhtPin`] trait plus an
//! [`embedded_hal::delay::DelayNs`] provider, so the decode path is fully
//! testable on the host with scripted sample streams. Corrupted frames are
//! rejected, never repaired: the caller either gets a checksum-verified
//! [`Reading`] or a [`DhtError`].
//!
//! # Optional features
//! - `defmt`: derives `defmt::Format` on the public types and emits
//!   diagnostic logs (per-pulse dumps on frame-length errors, decoded bytes,
//!   retry warnings).

#![cfg_attr(not(test), no_std)]

pub mod decode;
pub mod error;
pub mod io;
pub mod pulse;
pub mod sensor;

pub use error::DhtError;
pub use io::{DhtPin, Sample};
pub use pulse::{Pulse, PulseBuffer, MAX_PULSE_COUNT};
pub use sensor::{DhtSensor, Reading, SensorVariant};
