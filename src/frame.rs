use crate::error::DhtError;

/// Number of bytes in one sensor transmission.
pub const FRAME_BYTES: usize = 5;

/// Number of bits in one sensor transmission.
pub const FRAME_BITS: usize = FRAME_BYTES * 8;

/// One raw transmission: four payload bytes followed by a checksum byte.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame([u8; FRAME_BYTES]);

impl Frame {
    /// Wraps five raw bytes as received from the sensor.
    pub const fn new(bytes: [u8; FRAME_BYTES]) -> Self {
        Frame(bytes)
    }

    /// Builds a frame from four payload bytes, appending the matching checksum.
    pub fn with_checksum(payload: [u8; 4]) -> Self {
        let [a, b, c, d] = payload;
        Frame([a, b, c, d, checksum(&payload)])
    }

    /// All five bytes, checksum last.
    pub fn bytes(&self) -> &[u8; FRAME_BYTES] {
        &self.0
    }

    /// The four payload bytes.
    pub fn payload(&self) -> [u8; 4] {
        let [a, b, c, d, _] = self.0;
        [a, b, c, d]
    }

    /// The checksum byte as transmitted.
    pub fn checksum(&self) -> u8 {
        self.0[4]
    }

    /// True if the checksum byte equals the wrapping sum of the payload.
    pub fn has_valid_checksum(&self) -> bool {
        checksum(&self.payload()) == self.checksum()
    }

    /// True when every byte, checksum included, is zero.
    pub fn is_all_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Checks the checksum and rejects the degenerate all-zero frame.
    pub fn validate<E>(&self) -> Result<(), DhtError<E>> {
        if !self.has_valid_checksum() {
            Err(DhtError::ChecksumMismatch)
        } else if self.is_all_zero() {
            Err(DhtError::DegenerateFrame)
        } else {
            Ok(())
        }
    }

    /// Boolean form of [`validate`](Self::validate).
    pub fn is_valid(&self) -> bool {
        self.validate::<()>().is_ok()
    }

    /// Sets bit `index` of the 40-bit stream, MSB of byte 0 first.
    pub(crate) fn set_bit(&mut self, index: usize) {
        self.0[index / 8] |= 1 << (7 - (index % 8));
    }
}

fn checksum(payload: &[u8; 4]) -> u8 {
    payload.iter().fold(0u8, |sum, v| sum.wrapping_add(*v))
}
