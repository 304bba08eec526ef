use core::num::NonZeroU32;

use crate::error::DhtError;
use crate::filter::{DEFAULT_MAX_DEVIATION, MAX_BUFFER_CAPACITY};

/// How many times a frame acquisition may be tried.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attempts {
    /// Retry until a valid frame arrives.
    Unlimited,
    /// Give up after this many attempts.
    AtMost(NonZeroU32),
}

/// A negative attempt count was supplied.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NegativeAttempts(pub i32);

impl Attempts {
    /// Budget left after spending one attempt, or `None` if that was the last.
    pub fn consume(self) -> Option<Attempts> {
        match self {
            Attempts::Unlimited => Some(Attempts::Unlimited),
            Attempts::AtMost(n) => NonZeroU32::new(n.get() - 1).map(Attempts::AtMost),
        }
    }
}

impl From<NonZeroU32> for Attempts {
    fn from(value: NonZeroU32) -> Self {
        Attempts::AtMost(value)
    }
}

/// `0` means [`Attempts::Unlimited`]; negative counts are rejected.
impl TryFrom<i32> for Attempts {
    type Error = NegativeAttempts;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match u32::try_from(value) {
            Ok(n) => Ok(NonZeroU32::new(n).map_or(Attempts::Unlimited, Attempts::AtMost)),
            Err(_) => Err(NegativeAttempts(value)),
        }
    }
}

/// Options to modify the behavior of the DHT driver.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Size of each median window. `None` uses the sensor family's default,
    /// `Some(0)` disables noise filtering.
    pub buffer_capacity: Option<usize>,
    /// Largest accepted temperature deviation, as a fraction of the median.
    pub max_temperature_deviation: f64,
    /// Largest accepted humidity deviation, as a fraction of the median.
    pub max_humidity_deviation: f64,
    /// Frame acquisitions per reading.
    pub read_attempts: Attempts,
    /// Pause between failed acquisitions, in milliseconds.
    pub retry_delay_ms: u32,
    /// Transmissions tried before calibration falls back to default timing.
    pub calibration_attempts: u8,
    /// Fill the median windows on the first `read` before filtering.
    pub prime_on_first_read: bool,
    /// Bound deviations by the median's magnitude, so negative medians
    /// still accept nearby values. Off by default.
    pub magnitude_deviation_bound: bool,
}

const DEFAULT_READ_ATTEMPTS: NonZeroU32 = match NonZeroU32::new(100) {
    Some(n) => n,
    None => unreachable!(),
};

impl Default for Config {
    fn default() -> Self {
        Config {
            buffer_capacity: None,
            max_temperature_deviation: DEFAULT_MAX_DEVIATION,
            max_humidity_deviation: DEFAULT_MAX_DEVIATION,
            read_attempts: Attempts::AtMost(DEFAULT_READ_ATTEMPTS),
            retry_delay_ms: 1,
            calibration_attempts: 5,
            prime_on_first_read: true,
            magnitude_deviation_bound: false,
        }
    }
}

impl Config {
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity);
        self
    }

    pub fn with_max_temperature_deviation(mut self, fraction: f64) -> Self {
        self.max_temperature_deviation = fraction;
        self
    }

    pub fn with_max_humidity_deviation(mut self, fraction: f64) -> Self {
        self.max_humidity_deviation = fraction;
        self
    }

    pub fn with_read_attempts(mut self, attempts: Attempts) -> Self {
        self.read_attempts = attempts;
        self
    }

    pub fn with_retry_delay_ms(mut self, ms: u32) -> Self {
        self.retry_delay_ms = ms;
        self
    }

    pub fn with_calibration_attempts(mut self, attempts: u8) -> Self {
        self.calibration_attempts = attempts;
        self
    }

    pub fn with_prime_on_first_read(mut self, prime: bool) -> Self {
        self.prime_on_first_read = prime;
        self
    }

    pub fn with_magnitude_deviation_bound(mut self, enabled: bool) -> Self {
        self.magnitude_deviation_bound = enabled;
        self
    }

    /// Checks every field against its allowed range.
    pub fn validate<E>(&self) -> Result<(), DhtError<E>> {
        let deviation_ok = |d: f64| d.is_finite() && d >= 0.0;

        if self.buffer_capacity.is_some_and(|c| c > MAX_BUFFER_CAPACITY)
            || !deviation_ok(self.max_temperature_deviation)
            || !deviation_ok(self.max_humidity_deviation)
            || self.calibration_attempts == 0
        {
            return Err(DhtError::InvalidArgument);
        }
        Ok(())
    }
}
