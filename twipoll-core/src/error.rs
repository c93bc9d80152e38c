//! Error taxonomy for sensor bus transactions
//!
//! One code per protocol step that the bus can reject, plus a timeout for
//! a controller that never completes. Codes are sent verbatim over the
//! serial line, so the discriminants are part of the wire format.

/// Failure of one protocol step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ErrorCode {
    /// Start condition not acknowledged by the controller
    Start = 1,
    /// Address with write bit not acknowledged
    AddressAckWrite = 2,
    /// Register or data byte not acknowledged
    DataAck = 3,
    /// Repeated start condition not transmitted
    RepeatedStart = 4,
    /// Address with read bit not acknowledged
    AddressAckRead = 5,
    /// Final byte not received with NACK
    DataNack = 6,
    /// Controller did not complete an operation in time
    Timeout = 7,
}

impl ErrorCode {
    /// Wire code for a successful transaction
    pub const OK_CODE: u8 = 0x00;

    /// Wire code of this error
    pub fn code(self) -> u8 {
        self as u8
    }
}
