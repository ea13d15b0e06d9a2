//! Acquisition orchestration: wake the sensor, record the response, decode
//! it, and retry transient failures with a fixed backoff.

use embedded_hal::delay::DelayNs;

use crate::decode;
use crate::error::DhtError;
use crate::io::DhtPin;
use crate::pulse::{self, PulseBuffer};

/// Line held high before the start pulse so the sensor settles.
const WAKE_SETTLE_MS: u32 = 500;
/// Start pulse width: line held low to request a measurement.
const WAKE_START_MS: u32 = 18;
/// Quiet time on the line that ends one recording.
const IDLE_TIMEOUT_MS: u32 = 10;
/// Fixed pause between attempts. Failures are almost always single-shot
/// line contention, so there is nothing to gain from an exponential scheme.
const RETRY_BACKOFF_MS: u32 = 1_500;

/// The two supported data encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorVariant {
    /// Whole-degree resolution sensor.
    Dht11,
    /// Tenth-degree resolution sensor with signed temperature.
    Dht22,
}

impl SensorVariant {
    /// The AM2302 is a DHT22 in a different housing; same encoding.
    pub const AM2302: SensorVariant = SensorVariant::Dht22;

    pub const fn name(self) -> &'static str {
        match self {
            SensorVariant::Dht11 => "DHT11",
            SensorVariant::Dht22 => "DHT22",
        }
    }
}

/// One verified measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub temperature_celsius: f32,
    pub humidity_percent: f32,
}

/// Exclusive handle on one sensor's data pin.
///
/// Owning the pin makes the one-acquisition-at-a-time rule a type-system
/// fact: every read takes `&mut self`. Callers sharing a pin across threads
/// must serialize access to the sensor themselves.
///
/// The handle also owns the pulse buffer, which is sizeable; on small
/// targets place the sensor in a `static` rather than on the stack.
pub struct DhtSensor<P, D> {
    variant: SensorVariant,
    pin: P,
    delay: D,
    boost: bool,
    pulses: PulseBuffer,
}

impl<P, D> DhtSensor<P, D>
where
    P: DhtPin,
    D: DelayNs,
{
    pub fn new(variant: SensorVariant, pin: P, delay: D) -> Self {
        DhtSensor {
            variant,
            pin,
            delay,
            boost: false,
            pulses: PulseBuffer::new(),
        }
    }

    /// Request the platform performance boost around each acquisition.
    ///
    /// Useful on hosted targets (early Raspberry Pi models in particular)
    /// where scheduler preemption otherwise corrupts the sampling loop.
    pub fn with_boost(mut self, boost: bool) -> Self {
        self.boost = boost;
        self
    }

    pub fn variant(&self) -> SensorVariant {
        self.variant
    }

    /// Release the pin and delay provider.
    pub fn free(self) -> (P, D) {
        (self.pin, self.delay)
    }

    /// Perform exactly one wake-sample-reconstruct-decode cycle.
    ///
    /// Either a checksum-verified [`Reading`] comes back or the attempt
    /// failed as a whole; no partial data is ever returned and nothing is
    /// retried here.
    pub fn read(&mut self) -> Result<Reading, DhtError<P::Error>> {
        let acquired = self.acquire();
        if self.boost {
            // Drop the boost even when the acquisition failed.
            self.pin.set_boost(false).map_err(DhtError::Io)?;
        }
        acquired?;
        decode::decode_frame(self.variant, &self.pulses)
    }

    /// Like [`read`](Self::read), retrying failed attempts after a fixed
    /// 1.5 s backoff until one succeeds or the budget is spent, for
    /// `max_retries + 1` attempts in total.
    ///
    /// Returns the reading together with the number of retries it cost, or
    /// the last attempt's error. Every error kind is considered transient.
    pub fn read_with_retry(
        &mut self,
        max_retries: u8,
    ) -> Result<(Reading, u8), DhtError<P::Error>> {
        let mut remaining = max_retries;
        let mut retried: u8 = 0;
        loop {
            match self.read() {
                Ok(reading) => return Ok((reading, retried)),
                Err(err) => {
                    if remaining == 0 {
                        return Err(err);
                    }
                    remaining -= 1;
                    retried += 1;
                    #[cfg(feature = "defmt")]
                    defmt::warn!(
                        "{=str} read failed, retrying ({=u8} left)",
                        self.variant.name(),
                        remaining
                    );
                    self.delay.delay_ms(RETRY_BACKOFF_MS);
                }
            }
        }
    }

    /// Wake the sensor and record its response into the pulse buffer.
    fn acquire(&mut self) -> Result<(), DhtError<P::Error>> {
        if self.boost {
            self.pin.set_boost(true).map_err(DhtError::Io)?;
        }

        // Wake sequence: settle high, then hold low to request a read.
        self.pin.set_output().map_err(DhtError::Io)?;
        self.pin.write_high().map_err(DhtError::Io)?;
        self.delay.delay_ms(WAKE_SETTLE_MS);
        self.pin.write_low().map_err(DhtError::Io)?;
        self.delay.delay_ms(WAKE_START_MS);
        self.pin.set_input().map_err(DhtError::Io)?;

        // The response is over in ~5 ms and the bit widths are tens of
        // microseconds, so the sampling loop must not be interrupted.
        let Self { pin, pulses, .. } = self;
        critical_section::with(|_| pulse::record_pulses(pin, IDLE_TIMEOUT_MS, pulses))
    }
}
