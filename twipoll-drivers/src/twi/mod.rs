//! TWI controller implementations

mod bitbang;

pub use bitbang::{BitBangTwi, STRETCH_LIMIT};
