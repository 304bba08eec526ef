//! DHT11 / DHT22 Sensor Driver for Embedded Rust
//!
//! This crate provides a platform-agnostic driver for the DHT11 and DHT22
//! (AM2302) temperature and humidity sensors, built on top of the
//! [`embedded-hal`] traits.
//!
//! Bits are told apart by counting busy-wait iterations, so no timer is
//! needed. The driver calibrates its bit threshold against the sensor when it
//! is created, validates every frame's checksum, and keeps a short median
//! window per quantity to reject readings that pass the checksum but are
//! implausible.
//!
//! # Features
//! - Blocking synchronous API using `embedded-hal` traits
//! - Designed for `no_std` environments, no allocator required
//! - Optional logging support via `defmt` or `log`
//!
//! # Dependencies
//! This driver depends on the following `embedded-hal` traits:
//! - [`InputPin`] and [`OutputPin`] for GPIO access (the pin must be open-drain)
//! - [`DelayNs`] for the start signal and polling interval
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` and logs through `defmt`
//! - `log`: Logs through the `log` facade
//!
//! # Example
//!
//! ```ignore
//! let mut dht = DhtSensor::dht22(pin, delay)?;
//! loop {
//!     match dht.read() {
//!         Ok(reading) => { /* fresh, filtered values */ }
//!         Err(_) => { /* dht.last_temperature() still holds the last good value */ }
//!     }
//! }
//! ```
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

mod bus;
pub mod config;
pub mod decoder;
pub mod error;
pub mod filter;
pub mod frame;
pub mod sensor;
pub mod timing;

#[cfg(test)]
mod testing;

pub use config::{Attempts, Config, NegativeAttempts};
pub use decoder::{Decoder, Dht11, Dht22, Reading, Variant};
pub use error::DhtError;
pub use filter::{MAX_BUFFER_CAPACITY, MedianWindow, NEVER_READ, NoiseFilter, Verdict};
pub use frame::Frame;
pub use sensor::{Dht11Sensor, Dht22Sensor, DhtSensor};
pub use timing::Timing;
