//! Board-agnostic core of the twipoll sensor relay
//!
//! This crate contains all logic that does not depend on a specific chip:
//!
//! - Bus status decoding
//! - Blocking TWI master primitives with a bounded wait
//! - MPU6050 wake-up and register read transactions
//! - Polling state machine
//! - Configuration type definitions
//! - A deterministic simulator for host testing (`sim` feature)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to the other modules
mod fmt;

pub mod config;
pub mod error;
pub mod poll;
pub mod sensor;
pub mod status;
pub mod twi;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use config::{ConfigError, PollerConfig, SensorConfig};
pub use error::ErrorCode;
pub use poll::{Phase, PollState, Poller};
pub use status::BusStatus;
