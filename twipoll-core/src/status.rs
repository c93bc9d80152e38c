//! Bus status inspection
//!
//! Decodes the controller's status register into the protocol outcome of
//! the most recent bus operation.

use twipoll_hal::twi::status as raw;

/// Outcome of the most recent bus operation
///
/// Read right after each primitive and compared against the value the
/// protocol expects at that step. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusStatus {
    /// Illegal start or stop condition
    BusError,
    /// Start condition transmitted
    Start,
    /// Repeated start condition transmitted
    RepeatedStart,
    /// Address with write bit acknowledged
    MtSlaAck,
    /// Address with write bit not acknowledged
    MtSlaNack,
    /// Data byte acknowledged
    MtDataAck,
    /// Data byte not acknowledged
    MtDataNack,
    /// Arbitration lost
    ArbitrationLost,
    /// Address with read bit acknowledged
    MrSlaAck,
    /// Address with read bit not acknowledged
    MrSlaNack,
    /// Byte received, ACK returned
    MrDataAck,
    /// Byte received, NACK returned
    MrDataNack,
    /// No relevant state information
    NoInfo,
    /// Any other (slave mode or reserved) status value
    Other(u8),
    /// The controller did not complete the operation within the wait budget
    Timeout,
}

impl BusStatus {
    /// Decode a raw status register value
    ///
    /// Bits outside [`raw::MASK`] (the prescaler on AVR parts) are ignored.
    pub fn from_register(value: u8) -> Self {
        match value & raw::MASK {
            raw::BUS_ERROR => BusStatus::BusError,
            raw::START => BusStatus::Start,
            raw::REP_START => BusStatus::RepeatedStart,
            raw::MT_SLA_ACK => BusStatus::MtSlaAck,
            raw::MT_SLA_NACK => BusStatus::MtSlaNack,
            raw::MT_DATA_ACK => BusStatus::MtDataAck,
            raw::MT_DATA_NACK => BusStatus::MtDataNack,
            raw::ARB_LOST => BusStatus::ArbitrationLost,
            raw::MR_SLA_ACK => BusStatus::MrSlaAck,
            raw::MR_SLA_NACK => BusStatus::MrSlaNack,
            raw::MR_DATA_ACK => BusStatus::MrDataAck,
            raw::MR_DATA_NACK => BusStatus::MrDataNack,
            raw::NO_INFO => BusStatus::NoInfo,
            other => BusStatus::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prescaler_bits_ignored() {
        // TWPS1:0 live in the low bits of TWSR
        assert_eq!(BusStatus::from_register(0x08 | 0x03), BusStatus::Start);
        assert_eq!(BusStatus::from_register(0x58 | 0x01), BusStatus::MrDataNack);
    }

    #[test]
    fn test_unknown_code() {
        // Slave receiver status, never expected in master mode
        assert_eq!(BusStatus::from_register(0x60), BusStatus::Other(0x60));
        assert_eq!(BusStatus::from_register(0x63), BusStatus::Other(0x60));
    }

    #[test]
    fn test_master_mode_codes() {
        for (code, status) in [
            (raw::BUS_ERROR, BusStatus::BusError),
            (raw::START, BusStatus::Start),
            (raw::REP_START, BusStatus::RepeatedStart),
            (raw::MT_SLA_ACK, BusStatus::MtSlaAck),
            (raw::MT_SLA_NACK, BusStatus::MtSlaNack),
            (raw::MT_DATA_ACK, BusStatus::MtDataAck),
            (raw::MT_DATA_NACK, BusStatus::MtDataNack),
            (raw::ARB_LOST, BusStatus::ArbitrationLost),
            (raw::MR_SLA_ACK, BusStatus::MrSlaAck),
            (raw::MR_SLA_NACK, BusStatus::MrSlaNack),
            (raw::MR_DATA_ACK, BusStatus::MrDataAck),
            (raw::MR_DATA_NACK, BusStatus::MrDataNack),
            (raw::NO_INFO, BusStatus::NoInfo),
        ] {
            assert_eq!(BusStatus::from_register(code), status, "{:#04x}", code);
        }
    }

    #[test]
    fn test_register_never_decodes_to_timeout() {
        for value in 0..=u8::MAX {
            assert_ne!(BusStatus::from_register(value), BusStatus::Timeout);
        }
    }
}
