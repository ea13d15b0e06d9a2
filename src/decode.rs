//! Bit, byte and frame decoding of a reconstructed pulse train.

use crate::error::DhtError;
use crate::pulse::Pulse;
use crate::sensor::{Reading, SensorVariant};

/// Midpoint between the nominal high widths of a 0 bit (~26 us) and a 1 bit
/// (~70 us); strictly wider counts as a 1.
// TODO verify against captured DHT22 timings; this is a heuristic midpoint,
// not a datasheet constant.
const HIGH_BIT_THRESHOLD_US: u32 = 24 + (70 - 24) / 2; // 47
/// High phases wider than this are physically implausible for either bit.
const HIGH_MAX_US: u32 = (70 + (70 + 54)) / 2; // 97

/// Pulse count of a trimmed, decodable response.
const FRAME_PULSES: usize = 82;
/// Data portion of the frame: 40 bit-pairs.
const DATA_PULSES: usize = 80;

/// Decode the 16 pulses (8 low/high bit-pairs) starting at `start` into one
/// byte, MSB first.
///
/// The caller guarantees `start` is bit-pair aligned; this does not search
/// for alignment.
pub(crate) fn decode_byte<E>(pulses: &[Pulse], start: usize) -> Result<u8, DhtError<E>> {
    if pulses.len().saturating_sub(start) < 16 {
        return Err(DhtError::Range);
    }
    let mut byte = 0u8;
    for i in 0..8 {
        let low = pulses[start + 2 * i];
        let high = pulses[start + 2 * i + 1];
        if low.level {
            return Err(DhtError::Protocol { index: start + 2 * i });
        }
        if !high.level {
            return Err(DhtError::Protocol { index: start + 2 * i + 1 });
        }
        if high.duration_us > HIGH_MAX_US {
            return Err(DhtError::Protocol { index: start + 2 * i + 1 });
        }
        if high.duration_us > HIGH_BIT_THRESHOLD_US {
            byte |= 1 << (7 - i);
        }
    }
    Ok(byte)
}

/// Decode one full acquisition's pulse train into a [`Reading`].
///
/// Valid recordings are 82 to 85 pulses long: up to 3 leading preamble or
/// noise pulses, 80 data pulses, and the trailing idle-timeout pulse. Any
/// other count aborts the attempt with a diagnostic dump of every pulse.
pub fn decode_frame<E>(variant: SensorVariant, pulses: &[Pulse]) -> Result<Reading, DhtError<E>> {
    let trimmed = match pulses.len() {
        82..=85 => &pulses[pulses.len() - FRAME_PULSES..],
        count => {
            log_pulses(pulses);
            return Err(DhtError::FrameLength { count });
        }
    };
    let data = &trimmed[..DATA_PULSES];

    let b0 = decode_byte(data, 0)?;
    let b1 = decode_byte(data, 16)?;
    let b2 = decode_byte(data, 32)?;
    let b3 = decode_byte(data, 48)?;
    let received = decode_byte(data, 64)?;

    let computed = b0.wrapping_add(b1).wrapping_add(b2).wrapping_add(b3);
    if received != computed {
        return Err(DhtError::Checksum { received, computed });
    }

    #[cfg(feature = "defmt")]
    defmt::debug!(
        "frame bytes: [{=u8}, {=u8}, {=u8}, {=u8}, {=u8}]",
        b0,
        b1,
        b2,
        b3,
        received
    );

    let reading = convert(variant, [b0, b1, b2, b3]);
    if reading.humidity_percent > 100.0 {
        return Err(DhtError::Range);
    }
    Ok(reading)
}

fn convert(variant: SensorVariant, bytes: [u8; 4]) -> Reading {
    match variant {
        // Whole-degree resolution; bytes 1 and 3 are reserved.
        SensorVariant::Dht11 => Reading {
            humidity_percent: f32::from(bytes[0]),
            temperature_celsius: f32::from(bytes[2]),
        },
        // Tenths resolution, temperature sign in the top bit of byte 2.
        SensorVariant::Dht22 => {
            let humidity = f32::from(u16::from_be_bytes([bytes[0], bytes[1]])) / 10.0;
            let magnitude = u16::from(bytes[2] & 0x7F) << 8 | u16::from(bytes[3]);
            let mut temperature = f32::from(magnitude) / 10.0;
            if bytes[2] & 0x80 != 0 {
                temperature = -temperature;
            }
            Reading {
                humidity_percent: humidity,
                temperature_celsius: temperature,
            }
        }
    }
}

fn log_pulses(pulses: &[Pulse]) {
    #[cfg(feature = "defmt")]
    for (i, pulse) in pulses.iter().enumerate() {
        defmt::debug!(
            "pulse {=usize}: level={=bool} {=u32}us",
            i,
            pulse.level,
            pulse.duration_us
        );
    }
    #[cfg(not(feature = "defmt"))]
    let _ = pulses;
}
