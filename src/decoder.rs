//! Conversion of validated frames into physical values.
//!
//! DHT11 and DHT22 share the wire protocol but pack their payload
//! differently. Each family implements [`Decoder`]; [`Variant`] picks one at
//! run time.

use crate::frame::Frame;

/// Reading returned by the sensor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub relative_humidity: f64,
}

/// Turns a validated frame into a [`Reading`].
pub trait Decoder {
    /// Decodes the payload of `frame`. The frame's checksum is not inspected.
    fn decode(&self, frame: &Frame) -> Reading;

    /// Median window size used when the configuration does not override it.
    fn default_buffer_capacity(&self) -> usize;
}

/// DHT11: integral byte followed by a decimal byte for each quantity.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dht11;

/// DHT22 / AM2302: big-endian tenths, temperature with a sign bit.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dht22;

/// Sensor family chosen at run time.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    Dht11,
    Dht22,
}

impl Decoder for Dht11 {
    fn decode(&self, frame: &Frame) -> Reading {
        let [hum_int, hum_dec, temp_int, temp_dec] = frame.payload();

        Reading {
            temperature: temp_int as f64 + fractional(temp_dec),
            relative_humidity: hum_int as f64 + fractional(hum_dec),
        }
    }

    fn default_buffer_capacity(&self) -> usize {
        11
    }
}

impl Decoder for Dht22 {
    fn decode(&self, frame: &Frame) -> Reading {
        let [hum_hi, hum_lo, temp_hi, temp_lo] = frame.payload();

        let joined_humidity = u16::from_be_bytes([hum_hi, hum_lo]);
        let relative_humidity = joined_humidity as f64 / 10.0;

        let is_temp_negative = (temp_hi >> 7) != 0;
        let temp_hi = temp_hi & 0b0111_1111;
        let joined_temp = u16::from_be_bytes([temp_hi, temp_lo]);
        let mut temperature = joined_temp as f64 / 10.0;
        if is_temp_negative {
            temperature = -temperature;
        }

        Reading {
            temperature,
            relative_humidity,
        }
    }

    fn default_buffer_capacity(&self) -> usize {
        7
    }
}

impl Decoder for Variant {
    fn decode(&self, frame: &Frame) -> Reading {
        match self {
            Variant::Dht11 => Dht11.decode(frame),
            Variant::Dht22 => Dht22.decode(frame),
        }
    }

    fn default_buffer_capacity(&self) -> usize {
        match self {
            Variant::Dht11 => Dht11.default_buffer_capacity(),
            Variant::Dht22 => Dht22.default_buffer_capacity(),
        }
    }
}

/// Reads the decimal digits of `n` as a fraction: 5 -> 0.5, 23 -> 0.23, 100 -> 0.1.
pub fn fractional(n: u8) -> f64 {
    let n = n as f64;
    let mut scale = 1.0;
    while n >= scale {
        scale *= 10.0;
    }
    n / scale
}
