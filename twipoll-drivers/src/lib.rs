//! Hardware driver implementations
//!
//! Concrete implementations of the twipoll-hal traits on top of the
//! embedded-hal and embedded-io ecosystems:
//!
//! - TWI controller bit-banged over two open-drain GPIOs
//! - Serial sink over any blocking `embedded_io::Write`

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod serial;
pub mod twi;

pub use serial::IoSink;
pub use twi::BitBangTwi;
