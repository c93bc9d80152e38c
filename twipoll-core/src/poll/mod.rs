//! Sensor polling state machine
//!
//! A single cooperative loop: wait, read the axis high and low bytes,
//! relay them over the serial sink, repeat. The first bus fault moves the
//! loop into an absorbing error state.

pub mod poller;
pub mod state;

pub use poller::{MeasurementSample, Poller, WAKEUP_FAILURE, WAKEUP_SUCCESS};
pub use state::{Event, Phase, PollState};
