//! Timing parameters expressed in busy-wait iterations.
//!
//! No timer is assumed, so pulse lengths are measured as the number of 1 µs
//! polling iterations spent at a level. Absolute counts depend on the host's
//! speed; calibration derives the thresholds from the sensor's own pulses.

use crate::frame::{FRAME_BITS, Frame};

/// Threshold used when calibration fails.
pub const DEFAULT_THRESHOLD: u32 = 16;

/// Ceiling used before calibration, or after it fails.
pub const DEFAULT_TIMEOUT_CEILING: u32 = 1000;

/// Parameters used to decode bits from pulse counts.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// A HIGH phase longer than this many iterations is a logical 1.
    pub threshold: u32,
    /// A phase reaching this many iterations has timed out.
    pub timeout_ceiling: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            threshold: DEFAULT_THRESHOLD,
            timeout_ceiling: DEFAULT_TIMEOUT_CEILING,
        }
    }
}

impl Timing {
    /// Classifies a HIGH-phase count.
    pub fn bit(&self, high_count: u32) -> bool {
        high_count > self.threshold
    }

    /// True if `count` means the phase never ended.
    pub fn is_timeout(&self, count: u32) -> bool {
        count >= self.timeout_ceiling
    }
}

/// Pulse counts recorded for the 40 bits of one calibration transmission.
#[derive(Clone, Debug)]
pub struct PulseRecord {
    low: [u32; FRAME_BITS],
    high: [u32; FRAME_BITS],
    timed_out: bool,
}

impl Default for PulseRecord {
    fn default() -> Self {
        PulseRecord {
            low: [0; FRAME_BITS],
            high: [0; FRAME_BITS],
            timed_out: false,
        }
    }
}

impl PulseRecord {
    pub(crate) fn record(&mut self, bit: usize, low: u32, high: u32, ceiling: u32) {
        self.low[bit] = low;
        self.high[bit] = high;
        if low >= ceiling || high >= ceiling {
            self.timed_out = true;
        }
    }

    /// True if any phase hit the ceiling while recording.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Sum of all LOW-phase counts.
    pub fn low_sum(&self) -> u32 {
        self.low.iter().sum()
    }

    /// Longest HIGH-phase count.
    pub fn max_high(&self) -> u32 {
        self.high.iter().copied().max().unwrap_or(0)
    }

    /// Timing derived from these pulses.
    ///
    /// Both bit values start with a LOW phase of about 50 µs, while the HIGH
    /// phase lasts 26-28 µs for a 0 and 70 µs for a 1. The average LOW count
    /// therefore separates the two HIGH lengths. The ceiling leaves 25%
    /// headroom above the longest HIGH phase seen.
    pub fn timing(&self) -> Timing {
        let max_high = self.max_high();
        Timing {
            threshold: self.low_sum() / FRAME_BITS as u32,
            timeout_ceiling: max_high + max_high / 4,
        }
    }

    /// The frame these pulses encode under `timing`.
    pub fn frame(&self, timing: &Timing) -> Frame {
        let mut frame = Frame::default();
        for (i, high) in self.high.iter().enumerate() {
            if timing.bit(*high) {
                frame.set_bit(i);
            }
        }
        frame
    }

    /// The timing derived from these pulses, if they decode to a valid
    /// frame without any timeout.
    pub fn calibrate(&self) -> Option<Timing> {
        if self.timed_out {
            return None;
        }
        let timing = self.timing();
        self.frame(&timing).is_valid().then_some(timing)
    }
}
