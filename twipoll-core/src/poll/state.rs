//! Poll state definition
//!
//! The transition function is pure: the poller performs the action of the
//! current state and feeds the outcome back as an [`Event`].

use crate::error::ErrorCode;

/// Polling loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PollState {
    /// Waiting for the next cycle
    Wait = 0,
    /// Reading the axis high byte
    ReadHigh = 1,
    /// Reading the axis low byte
    ReadLow = 2,
    /// Sending the high byte
    SendHigh = 3,
    /// Sending the low byte
    SendLow = 4,
    /// Sending the line terminator
    SendNewline = 5,
    /// Bus fault; only line terminators are sent from here on
    Error = 6,
}

/// Outcome of a state's action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Poll interval elapsed
    DelayElapsed,
    /// Register read completed
    ReadSucceeded,
    /// Register read failed at the given step
    ReadFailed(ErrorCode),
    /// Byte handed to the serial sink
    ByteSent,
}

/// Lifecycle of the poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Sensor not yet woken
    Startup,
    /// Wake-up failed; nothing happens any more
    Halted,
    /// Polling loop running
    Polling(PollState),
}

impl PollState {
    /// Decode a raw state discriminator
    ///
    /// Unknown values map to [`PollState::Error`].
    pub fn from_raw(value: u8) -> Self {
        match value {
            0 => PollState::Wait,
            1 => PollState::ReadHigh,
            2 => PollState::ReadLow,
            3 => PollState::SendHigh,
            4 => PollState::SendLow,
            5 => PollState::SendNewline,
            _ => PollState::Error,
        }
    }

    /// Process an event and return the next state
    ///
    /// Any pairing without a defined edge lands in `Error`.
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use PollState::*;

        match (self, event) {
            (Wait, DelayElapsed) => ReadHigh,

            (ReadHigh, ReadSucceeded) => ReadLow,
            (ReadHigh, ReadFailed(_)) => Error,

            (ReadLow, ReadSucceeded) => SendHigh,
            (ReadLow, ReadFailed(_)) => Error,

            (SendHigh, ByteSent) => SendLow,
            (SendLow, ByteSent) => SendNewline,
            (SendNewline, ByteSent) => Wait,

            (Error, _) => Error,

            _ => Error,
        }
    }
}
