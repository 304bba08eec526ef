//! Single-wire transport: start signal, response handshake and pulse counting.

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin, PinState},
};

use crate::error::DhtError;
use crate::frame::{FRAME_BITS, Frame};
use crate::timing::{PulseRecord, Timing};

/// How long the host holds the line low to request a transmission.
const START_SIGNAL_MS: u32 = 18;

/// How long the host drives the line high before listening.
const RELEASE_US: u32 = 20;

/// Owns the data line and the delay provider.
///
/// The pin is expected to be open-drain: driving it high releases the line
/// so that the sensor can pull it low.
pub(crate) struct Bus<PIN, D> {
    pin: PIN,
    delay: D,
}

impl<PIN, DELAY, E> Bus<PIN, DELAY>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
{
    pub(crate) fn new(pin: PIN, delay: DELAY) -> Self {
        Bus { pin, delay }
    }

    pub(crate) fn release(self) -> (PIN, DELAY) {
        (self.pin, self.delay)
    }

    pub(crate) fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Sends the start signal and skips the sensor's response.
    ///
    /// The sensor answers 20-40us after release with an 80us low and an
    /// 80us high pulse. Their lengths are not checked.
    fn start(&mut self, ceiling: u32) -> Result<(), DhtError<E>> {
        // MCU sends start request
        self.pin.set_low()?;
        self.delay.delay_ms(START_SIGNAL_MS);
        self.pin.set_high()?;
        self.delay.delay_us(RELEASE_US);

        // Waiting for sensor response
        self.wait_while(PinState::High, ceiling)?;
        self.wait_while(PinState::Low, ceiling)?; // 80us
        self.wait_while(PinState::High, ceiling)?; // 80us
        Ok(())
    }

    /// Counts 1us polling iterations while the line stays at `level`.
    ///
    /// Stops at `ceiling`; a return value equal to `ceiling` means the
    /// level never changed.
    pub(crate) fn wait_while(&mut self, level: PinState, ceiling: u32) -> Result<u32, DhtError<E>> {
        let mut count = 0;
        while count < ceiling && self.level()? == level {
            self.delay.delay_us(1);
            count += 1;
        }
        Ok(count)
    }

    fn level(&mut self) -> Result<PinState, DhtError<E>> {
        Ok(PinState::from(self.pin.is_high()?))
    }

    /// Counts the LOW and HIGH phases of one bit.
    fn pulse_pair(&mut self, ceiling: u32) -> Result<(u32, u32), DhtError<E>> {
        let low = self.wait_while(PinState::Low, ceiling)?; // ~50us
        let high = self.wait_while(PinState::High, ceiling)?; // 26-28us or 70us
        Ok((low, high))
    }

    /// Reads a single bit; `None` if either phase timed out.
    fn read_bit(&mut self, timing: &Timing) -> Result<Option<bool>, DhtError<E>> {
        let (low, high) = self.pulse_pair(timing.timeout_ceiling)?;
        if timing.is_timeout(low) || timing.is_timeout(high) {
            return Ok(None);
        }
        Ok(Some(timing.bit(high)))
    }

    /// Requests one transmission and decodes its 40 bits with `timing`.
    ///
    /// Returns `None` as soon as a bit times out; the frame is unusable then.
    /// The checksum is not checked here.
    pub(crate) fn read_frame(&mut self, timing: &Timing) -> Result<Option<Frame>, DhtError<E>> {
        self.start(timing.timeout_ceiling)?;

        let mut frame = Frame::default();
        for i in 0..FRAME_BITS {
            match self.read_bit(timing)? {
                Some(true) => frame.set_bit(i),
                Some(false) => {}
                None => {
                    trace!("bit {} timed out", i);
                    return Ok(None);
                }
            }
        }
        Ok(Some(frame))
    }

    /// Requests one transmission and records the raw pulse counts of all
    /// 40 bits, for calibration.
    pub(crate) fn record_pulses(&mut self, ceiling: u32) -> Result<PulseRecord, DhtError<E>> {
        self.start(ceiling)?;

        let mut record = PulseRecord::default();
        for i in 0..FRAME_BITS {
            let (low, high) = self.pulse_pair(ceiling)?;
            record.record(i, low, high, ceiling);
        }
        Ok(record)
    }
}
