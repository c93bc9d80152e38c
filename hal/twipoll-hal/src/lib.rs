//! twipoll Hardware Abstraction Layer
//!
//! This crate defines the two hardware-facing ports of the sensor polling
//! loop. Chip-specific or bit-banged implementations live elsewhere, so the
//! same core logic runs on real hardware and against a simulator.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  twipoll-core (session, driver, poller) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  twipoll-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ twipoll-      │       │ twipoll-core  │
//! │   drivers     │       │   ::sim       │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`twi::TwiController`] - TWI master controller
//! - [`serial::SerialSink`] - Byte-oriented serial output

#![no_std]
#![deny(unsafe_code)]

pub mod serial;
pub mod twi;

// Re-export key traits at crate root for convenience
pub use serial::SerialSink;
pub use twi::TwiController;
