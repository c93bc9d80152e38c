//! Two-wire interface (TWI) controller abstractions
//!
//! Models a TWI master peripheral at the register level: operations are
//! issued without blocking, completion is reported through a flag, and the
//! outcome is read back from a status register. The blocking wait and the
//! protocol checks live above this layer.

/// Raw status register codes (prescaler bits already masked off)
///
/// These follow the classic AVR TWI status register encoding. Controllers
/// that do not have such a register synthesize the same values from what
/// they observe on the wire.
pub mod status {
    /// Illegal start or stop condition
    pub const BUS_ERROR: u8 = 0x00;
    /// Start condition transmitted
    pub const START: u8 = 0x08;
    /// Repeated start condition transmitted
    pub const REP_START: u8 = 0x10;
    /// SLA+W transmitted, ACK received
    pub const MT_SLA_ACK: u8 = 0x18;
    /// SLA+W transmitted, NACK received
    pub const MT_SLA_NACK: u8 = 0x20;
    /// Data byte transmitted, ACK received
    pub const MT_DATA_ACK: u8 = 0x28;
    /// Data byte transmitted, NACK received
    pub const MT_DATA_NACK: u8 = 0x30;
    /// Arbitration lost in SLA+W/R or data
    pub const ARB_LOST: u8 = 0x38;
    /// SLA+R transmitted, ACK received
    pub const MR_SLA_ACK: u8 = 0x40;
    /// SLA+R transmitted, NACK received
    pub const MR_SLA_NACK: u8 = 0x48;
    /// Data byte received, ACK returned
    pub const MR_DATA_ACK: u8 = 0x50;
    /// Data byte received, NACK returned
    pub const MR_DATA_NACK: u8 = 0x58;
    /// No relevant state information available
    pub const NO_INFO: u8 = 0xF8;

    /// Mask selecting the status bits of the register
    pub const MASK: u8 = 0xF8;
}

/// TWI bus controller (master side)
///
/// Every `issue_*` call starts one elementary bus operation and returns
/// immediately. Start, write and read operations raise the completion flag
/// when they finish; stop does not.
pub trait TwiController {
    /// Transmit a start condition (or repeated start if the bus is held)
    fn issue_start(&mut self);

    /// Transmit one byte (address+direction or data)
    fn issue_write(&mut self, byte: u8);

    /// Receive one byte, answering with ACK if `ack` is set, NACK otherwise
    fn issue_read(&mut self, ack: bool);

    /// Transmit a stop condition and release the bus
    fn issue_stop(&mut self);

    /// Check whether the last start/write/read operation has completed
    fn is_complete(&mut self) -> bool;

    /// Last byte received by a read operation
    fn data(&mut self) -> u8;

    /// Raw content of the status register
    ///
    /// May include non-status bits (e.g. prescaler); callers mask with
    /// [`status::MASK`].
    fn status(&mut self) -> u8;
}

/// TWI configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TwiConfig {
    /// SCL frequency in Hz
    pub frequency: u32,
}

impl Default for TwiConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl TwiConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };

    /// Half of one SCL period in nanoseconds
    pub fn half_period_ns(&self) -> u32 {
        500_000_000 / self.frequency.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_period() {
        assert_eq!(TwiConfig::STANDARD.half_period_ns(), 5_000);
        assert_eq!(TwiConfig::FAST.half_period_ns(), 1_250);
    }

    #[test]
    fn test_zero_frequency_does_not_divide_by_zero() {
        let config = TwiConfig { frequency: 0 };
        assert_eq!(config.half_period_ns(), 500_000_000);
    }

    #[test]
    fn test_status_codes_are_masked_values() {
        for code in [
            status::START,
            status::REP_START,
            status::MT_SLA_ACK,
            status::MT_DATA_ACK,
            status::MR_SLA_ACK,
            status::MR_DATA_NACK,
            status::NO_INFO,
        ] {
            assert_eq!(code & status::MASK, code);
        }
    }
}
