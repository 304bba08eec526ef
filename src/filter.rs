//! Median-based rejection of checksum-valid outliers.
//!
//! The DHT family occasionally returns frames whose checksum matches but
//! whose values are nonsense. Each quantity keeps a short window of raw
//! values; a new value is only trusted if it stays close to the window's
//! median.

use heapless::Vec;

/// Largest median window a sensor can be configured with.
pub const MAX_BUFFER_CAPACITY: usize = 32;

/// Value reported for a quantity that has never been read successfully.
pub const NEVER_READ: f64 = -100.0;

/// Default maximum deviation from the median, as a fraction of the median.
pub const DEFAULT_MAX_DEVIATION: f64 = 0.2;

/// Fixed-capacity ring of the most recent raw values.
///
/// Slots fill in order until the capacity is reached; after that each push
/// overwrites the oldest slot.
#[derive(Clone, Debug)]
pub struct MedianWindow {
    slots: Vec<f64, MAX_BUFFER_CAPACITY>,
    capacity: usize,
    next: usize,
}

impl MedianWindow {
    /// Creates an empty window. Returns `None` if `capacity` exceeds
    /// [`MAX_BUFFER_CAPACITY`].
    pub fn new(capacity: usize) -> Option<Self> {
        if capacity > MAX_BUFFER_CAPACITY {
            return None;
        }
        Some(MedianWindow {
            slots: Vec::new(),
            capacity,
            next: 0,
        })
    }

    /// Number of slots, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of values stored so far.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True before the first push.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// True once every slot holds a value.
    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    /// Stores `value`, overwriting the oldest slot once full. A zero-capacity
    /// window ignores every value.
    pub fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.slots.len() < self.capacity {
            // Cannot fail: capacity <= MAX_BUFFER_CAPACITY.
            let _ = self.slots.push(value);
        } else {
            self.slots[self.next] = value;
        }
        self.next = (self.next + 1) % self.capacity;
    }

    /// The most recently pushed value.
    pub fn last(&self) -> Option<f64> {
        if self.slots.is_empty() {
            return None;
        }
        let index = if self.next == 0 {
            self.slots.len() - 1
        } else {
            self.next - 1
        };
        self.slots.get(index).copied()
    }

    /// Stored values in slot order (not chronological once wrapped).
    pub fn values(&self) -> &[f64] {
        &self.slots
    }

    /// Element at index `len / 2` of a sorted copy of the stored values.
    ///
    /// Even-sized windows use the upper middle element; the two middle
    /// values are never averaged.
    pub fn median(&self) -> Option<f64> {
        if self.slots.is_empty() {
            return None;
        }
        let mut sorted = self.slots.clone();
        sorted.sort_unstable_by(f64::total_cmp);
        Some(sorted[sorted.len() / 2])
    }
}

/// Outcome of offering one raw value to a [`NoiseFilter`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Verdict {
    /// Last-known-good value after this call.
    pub value: f64,
    /// Whether the raw value became the new last-known-good value.
    pub accepted: bool,
}

/// Per-quantity filter: a median window plus the last accepted value.
#[derive(Clone, Debug)]
pub struct NoiseFilter {
    window: MedianWindow,
    max_deviation: f64,
    magnitude_bound: bool,
    last: f64,
}

impl NoiseFilter {
    /// Creates a filter with a window of `capacity` values. A capacity of 0
    /// disables filtering. Returns `None` if `capacity` exceeds
    /// [`MAX_BUFFER_CAPACITY`].
    pub fn new(capacity: usize, max_deviation: f64) -> Option<Self> {
        Some(NoiseFilter {
            window: MedianWindow::new(capacity)?,
            max_deviation,
            magnitude_bound: false,
            last: NEVER_READ,
        })
    }

    /// Bounds the deviation by `|median| * max_deviation` instead of
    /// `median * max_deviation`.
    ///
    /// Off by default. With the plain bound a negative median rejects every
    /// value, so sub-zero DHT22 temperatures are never accepted once the
    /// window is full.
    pub fn with_magnitude_bound(mut self, enabled: bool) -> Self {
        self.magnitude_bound = enabled;
        self
    }

    /// Offers a raw value.
    ///
    /// While the window is filling every value is accepted. Once full, the
    /// value is accepted only if `|raw - median| <= median * max_deviation`.
    /// The raw value is stored in the window either way so that the median
    /// follows sustained changes.
    pub fn accept(&mut self, raw: f64) -> Verdict {
        let accepted = if self.window.capacity() == 0 || !self.window.is_full() {
            true
        } else {
            match self.window.median() {
                Some(median) => {
                    let median_bound = if self.magnitude_bound {
                        libm::fabs(median)
                    } else {
                        median
                    };
                    libm::fabs(raw - median) <= median_bound * self.max_deviation
                }
                None => true,
            }
        };

        if accepted {
            self.last = raw;
        }
        self.window.push(raw);

        Verdict {
            value: self.last,
            accepted,
        }
    }

    /// Last accepted value, or [`NEVER_READ`].
    pub fn last(&self) -> f64 {
        self.last
    }

    /// True while the window still accepts values unconditionally.
    pub fn is_warming_up(&self) -> bool {
        self.window.capacity() > 0 && !self.window.is_full()
    }

    /// Largest accepted deviation, as a fraction of the median.
    pub fn max_deviation(&self) -> f64 {
        self.max_deviation
    }

    /// True if the bound uses the median's magnitude.
    pub fn has_magnitude_bound(&self) -> bool {
        self.magnitude_bound
    }

    /// The window of raw values behind the median.
    pub fn window(&self) -> &MedianWindow {
        &self.window
    }
}
