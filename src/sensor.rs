use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::bus::Bus;
use crate::config::{Attempts, Config};
use crate::decoder::{Decoder, Dht11, Dht22, Reading};
use crate::error::DhtError;
use crate::filter::NoiseFilter;
use crate::frame::Frame;
use crate::timing::Timing;

/// Pause after each calibration transmission.
const CALIBRATION_PAUSE_MS: u32 = 1;

/// Driver for DHT11 and DHT22 temperature and humidity sensors.
///
/// `V` selects the payload layout; see [`Dht11`], [`Dht22`] and
/// [`Variant`](crate::Variant).
pub struct DhtSensor<PIN, D, V> {
    bus: Bus<PIN, D>,
    decoder: V,
    config: Config,
    timing: Timing,
    calibrated: bool,
    primed: bool,
    temperature: NoiseFilter,
    humidity: NoiseFilter,
}

/// DHT11 driver.
pub type Dht11Sensor<PIN, D> = DhtSensor<PIN, D, Dht11>;

/// DHT22 / AM2302 driver.
pub type Dht22Sensor<PIN, D> = DhtSensor<PIN, D, Dht22>;

impl<PIN, DELAY, E> DhtSensor<PIN, DELAY, Dht11>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
{
    /// Creates a DHT11 driver with the default [`Config`].
    pub fn dht11(pin: PIN, delay: DELAY) -> Result<Self, DhtError<E>> {
        Self::new(pin, delay, Dht11, Config::default())
    }
}

impl<PIN, DELAY, E> DhtSensor<PIN, DELAY, Dht22>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
{
    /// Creates a DHT22 driver with the default [`Config`].
    pub fn dht22(pin: PIN, delay: DELAY) -> Result<Self, DhtError<E>> {
        Self::new(pin, delay, Dht22, Config::default())
    }
}

impl<PIN, DELAY, V, E> DhtSensor<PIN, DELAY, V>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
    V: Decoder,
{
    /// Creates a new driver and calibrates it.
    ///
    /// # Arguments
    ///
    /// * `pin` - The GPIO pin connected to the data line. Must be open-drain
    ///   and support both input and output.
    /// * `delay` - A delay provider implementing the `DelayNs` trait.
    /// * `decoder` - The sensor family.
    /// * `config` - Filtering, retry and calibration options.
    ///
    /// Calibration talks to the sensor, so this blocks for up to
    /// `config.calibration_attempts` transmissions. A failed calibration is
    /// not an error here: the driver falls back to default timing, which
    /// [`is_calibrated`](Self::is_calibrated) reports.
    ///
    /// # Errors
    ///
    /// * `DhtError::InvalidArgument` if `config` is out of range.
    /// * `DhtError::PinError` if the pin fails.
    pub fn new(pin: PIN, delay: DELAY, decoder: V, config: Config) -> Result<Self, DhtError<E>> {
        config.validate()?;

        let capacity = config
            .buffer_capacity
            .unwrap_or_else(|| decoder.default_buffer_capacity());
        let temperature = NoiseFilter::new(capacity, config.max_temperature_deviation)
            .ok_or(DhtError::InvalidArgument)?
            .with_magnitude_bound(config.magnitude_deviation_bound);
        let humidity = NoiseFilter::new(capacity, config.max_humidity_deviation)
            .ok_or(DhtError::InvalidArgument)?
            .with_magnitude_bound(config.magnitude_deviation_bound);

        let mut sensor = DhtSensor {
            bus: Bus::new(pin, delay),
            decoder,
            config,
            timing: Timing::default(),
            calibrated: false,
            primed: false,
            temperature,
            humidity,
        };

        match sensor.calibrate() {
            Ok(_) | Err(DhtError::CalibrationFallback) => Ok(sensor),
            Err(e) => Err(e),
        }
    }

    /// Derives the bit threshold and timeout ceiling from live transmissions.
    ///
    /// Timing is reset to its defaults first, so a failed run leaves the
    /// driver with threshold 16 and the generous default ceiling.
    ///
    /// # Returns
    ///
    /// * `Ok(Timing)` with the new parameters.
    /// * `Err(DhtError::CalibrationFallback)` if no transmission decoded to a
    ///   valid frame. The driver stays usable.
    pub fn calibrate(&mut self) -> Result<Timing, DhtError<E>> {
        self.timing = Timing::default();
        self.calibrated = false;

        for attempt in 1..=self.config.calibration_attempts {
            let record = self.bus.record_pulses(self.timing.timeout_ceiling)?;
            self.bus.delay_ms(CALIBRATION_PAUSE_MS);

            if let Some(timing) = record.calibrate() {
                debug!(
                    "calibrated after {} attempt(s): threshold {}, ceiling {}",
                    attempt,
                    timing.threshold,
                    timing.timeout_ceiling
                );
                self.timing = timing;
                self.calibrated = true;
                return Ok(timing);
            }
            trace!("calibration attempt {} failed", attempt);
        }

        warn!(
            "calibration failed, using default threshold {}",
            self.timing.threshold
        );
        Err(DhtError::CalibrationFallback)
    }

    /// Reads frames until one is valid or `attempts` runs out.
    ///
    /// Waits `retry_delay_ms` between failed attempts. A bit that times out
    /// spoils its frame the same way a bad checksum does.
    ///
    /// # Errors
    ///
    /// * `DhtError::ChecksumMismatch` or `DhtError::DegenerateFrame` from the
    ///   last attempt once the budget is spent.
    /// * `DhtError::PinError` immediately if the pin fails.
    pub fn acquire_frame(
        &mut self,
        attempts: Attempts,
        retry_delay_ms: u32,
    ) -> Result<Frame, DhtError<E>> {
        let mut remaining = attempts;
        loop {
            let fault = match self.bus.read_frame(&self.timing)? {
                Some(frame) => match frame.validate() {
                    Ok(()) => return Ok(frame),
                    Err(fault) => fault,
                },
                None => DhtError::ChecksumMismatch,
            };

            remaining = match remaining.consume() {
                Some(left) => left,
                None => {
                    debug!("giving up on frame: {}", fault_name(&fault));
                    return Err(fault);
                }
            };
            trace!("bad frame ({}), retrying", fault_name(&fault));
            self.bus.delay_ms(retry_delay_ms);
        }
    }

    /// Performs one acquire-decode-filter cycle.
    ///
    /// On a filtered sensor the first call first fills the median windows
    /// (unless disabled in [`Config`]). Temperature and humidity are judged
    /// independently: a quantity that passes still updates its last-known
    /// value even if the other one is rejected.
    ///
    /// # Returns
    ///
    /// * `Ok(Reading)` if the frame was valid and both quantities passed.
    /// * `Err(DhtError::DeviationRejected { .. })` if the frame was valid but
    ///   a quantity strayed from its median.
    /// * `Err(DhtError::ChecksumMismatch)`, `Err(DhtError::DegenerateFrame)` or
    ///   `Err(DhtError::PinError(_))` from frame acquisition.
    pub fn read(&mut self) -> Result<Reading, DhtError<E>> {
        if !self.primed {
            self.primed = true;
            if self.config.prime_on_first_read {
                self.prime()?;
            }
        }

        let frame = self.acquire_frame(self.config.read_attempts, self.config.retry_delay_ms)?;
        let reading = self.decoder.decode(&frame);

        let temperature = self.temperature.accept(reading.temperature);
        let humidity = self.humidity.accept(reading.relative_humidity);

        if temperature.accepted && humidity.accepted {
            Ok(reading)
        } else {
            debug!(
                "reading rejected: temperature {} (kept {}), humidity {} (kept {})",
                reading.temperature,
                temperature.value,
                reading.relative_humidity,
                humidity.value
            );
            Err(DhtError::DeviationRejected {
                temperature: !temperature.accepted,
                humidity: !humidity.accepted,
            })
        }
    }

    /// Fills the median windows with one acquisition per slot.
    fn prime(&mut self) -> Result<(), DhtError<E>> {
        let slots = self.temperature.window().capacity();
        for _ in 0..slots {
            match self.acquire_frame(self.config.read_attempts, self.config.retry_delay_ms) {
                Ok(frame) => {
                    let reading = self.decoder.decode(&frame);
                    self.temperature.accept(reading.temperature);
                    self.humidity.accept(reading.relative_humidity);
                }
                Err(DhtError::PinError(e)) => return Err(DhtError::PinError(e)),
                Err(_) => {}
            }
        }
        debug!(
            "primed {} of {} window slots",
            self.temperature.window().len(),
            slots
        );
        Ok(())
    }

    /// Last accepted temperature, or [`NEVER_READ`](crate::NEVER_READ).
    pub fn last_temperature(&self) -> f64 {
        self.temperature.last()
    }

    /// Last accepted humidity, or [`NEVER_READ`](crate::NEVER_READ).
    pub fn last_humidity(&self) -> f64 {
        self.humidity.last()
    }

    /// Timing currently used to decode bits.
    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// False if the last calibration fell back to default timing.
    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    /// The sensor family's decoder.
    pub fn decoder(&self) -> &V {
        &self.decoder
    }

    /// Options the driver was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Median filter guarding the temperature.
    pub fn temperature_filter(&self) -> &NoiseFilter {
        &self.temperature
    }

    /// Median filter guarding the humidity.
    pub fn humidity_filter(&self) -> &NoiseFilter {
        &self.humidity
    }

    /// Returns the pin and delay provider.
    pub fn release(self) -> (PIN, DELAY) {
        self.bus.release()
    }
}

fn fault_name<E>(fault: &DhtError<E>) -> &'static str {
    match fault {
        DhtError::ChecksumMismatch => "checksum mismatch",
        DhtError::DegenerateFrame => "all-zero frame",
        _ => "other",
    }
}
