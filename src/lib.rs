//! Timer-free DHT11/DHT22 Sensor Driver for Embedded Rust
//!
//! This crate reads the DHT family of temperature and humidity sensors from
//! hosts that cannot time microsecond pulses, such as a single-board computer
//! running a general-purpose OS. Instead of timing each pulse, it polls the
//! data line as fast as it can into a buffer and decodes the capture
//! afterwards, built on top of the [`embedded-hal`] traits.
//!
//! A read happens in two stages:
//! - [`sampler::acquire`] sends the wake pulse and records the raw level stream
//! - [`decoder::decode`] measures the pulses, derives a bit threshold from the
//!   capture itself, checks the checksum and tells DHT11 frames from DHT22
//!   frames
//!
//! A capture that fails to decode is useless: read again. [`Dht::read_retrying`]
//! does this with a fixed backoff.
//!
//! # Features
//! - Blocking synchronous API using `embedded-hal` traits
//! - Designed for `no_std` environments
//! - Pluggable debug tracing through [`Trace`]
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` and provides [`DefmtTrace`](trace::DefmtTrace)
//! - `log`: Provides [`LogTrace`](trace::LogTrace) for the `log` facade
//!
//! # Example
//!
//! ```ignore
//! use dht_bitbang::{DEFAULT_SAMPLE_COUNT, Dht, Level, OpenDrain, Retry};
//!
//! let mut dht = Dht::new(OpenDrain::new(pin), delay);
//! let mut samples = [Level::Low; DEFAULT_SAMPLE_COUNT];
//!
//! let measurement = dht.read_retrying(&mut samples, Retry::default())?;
//! println!("{}", measurement.reading);
//! ```
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod decoder;
pub mod dht;
pub mod error;
pub mod line;
pub mod sampler;
pub mod trace;

pub use config::{Config, DEFAULT_SAMPLE_COUNT, MIN_WAKE_LOW_US, Retry};
pub use decoder::{Family, Frame, Reading, decode, decode_traced};
pub use dht::{Dht, Measurement};
pub use error::{DecodeError, DhtError};
pub use line::{DataLine, Direction, Level, OpenDrain};
pub use sampler::acquire;
pub use trace::Trace;
