use core::fmt;

/// Possible errors from the DHT driver.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub enum DhtError<E> {
    /// Checksum did not match the received data, or a bit timed out.
    ChecksumMismatch,
    /// All five bytes were zero. Treated as a sensor fault, not a 0 °C / 0 %RH reading.
    DegenerateFrame,
    /// The frame was valid but at least one quantity strayed too far from its
    /// recent median. The raw values were still recorded.
    DeviationRejected {
        /// Temperature was rejected.
        temperature: bool,
        /// Humidity was rejected.
        humidity: bool,
    },
    /// No calibration attempt produced a valid frame; default timing is in use.
    CalibrationFallback,
    /// A configuration value was out of range.
    InvalidArgument,
    /// Error from the GPIO pin (input/output).
    PinError(E),
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}

impl<E: fmt::Debug> fmt::Display for DhtError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChecksumMismatch => f.write_str("checksum mismatch"),
            Self::DegenerateFrame => f.write_str("all-zero frame"),
            Self::DeviationRejected {
                temperature,
                humidity,
            } => write!(
                f,
                "reading deviates from median (temperature: {temperature}, humidity: {humidity})"
            ),
            Self::CalibrationFallback => f.write_str("calibration failed, using default timing"),
            Self::InvalidArgument => f.write_str("invalid argument"),
            Self::PinError(e) => write!(f, "pin error: {e:?}"),
        }
    }
}
