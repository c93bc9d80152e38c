//! TWI master transaction primitives
//!
//! Each primitive issues one elementary bus operation, waits for the
//! controller to finish and reports the observed [`BusStatus`]. Primitives
//! never fail on their own; the caller compares the status against what
//! the protocol expects at that step.
//!
//! The wait is bounded: a controller that does not raise its completion
//! flag within `wait_polls` checks yields [`BusStatus::Timeout`], so an
//! absent device cannot hang the caller.

use twipoll_hal::TwiController;

use crate::error::ErrorCode;
use crate::status::BusStatus;

/// Default number of completion flag checks per primitive
pub const DEFAULT_WAIT_POLLS: u32 = 10_000;

/// Data direction encoded in the R/W bit of the address byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Direction {
    Write = 0,
    Read = 1,
}

/// Build the address byte for a 7-bit device address
pub fn address_byte(address: u8, direction: Direction) -> u8 {
    (address << 1) | direction as u8
}

/// Compare an observed status against the expected one
///
/// A timeout is always reported as [`ErrorCode::Timeout`]; any other
/// mismatch is attributed to the step through `error`.
pub fn expect(status: BusStatus, expected: BusStatus, error: ErrorCode) -> Result<(), ErrorCode> {
    if status == expected {
        Ok(())
    } else if status == BusStatus::Timeout {
        Err(ErrorCode::Timeout)
    } else {
        debug!("expected {:?}, got {:?}", expected, status);
        Err(error)
    }
}

/// Blocking TWI master built on a [`TwiController`]
pub struct TwiMaster<C> {
    controller: C,
    wait_polls: u32,
}

impl<C: TwiController> TwiMaster<C> {
    /// Create a master that checks the completion flag at most
    /// `wait_polls` times per operation
    pub fn new(controller: C, wait_polls: u32) -> Self {
        Self {
            controller,
            wait_polls,
        }
    }

    /// Get access to the underlying controller
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Get mutable access to the underlying controller
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    /// Consume the master and return the controller
    pub fn release(self) -> C {
        self.controller
    }

    /// Decode the current status register
    pub fn status(&mut self) -> BusStatus {
        BusStatus::from_register(self.controller.status())
    }

    /// Transmit a start or repeated start condition
    pub fn start(&mut self) -> BusStatus {
        self.controller.issue_start();
        self.finish()
    }

    /// Transmit one byte (address+direction, register or data)
    pub fn write_byte(&mut self, value: u8) -> BusStatus {
        self.controller.issue_write(value);
        self.finish()
    }

    /// Receive one byte and acknowledge it (more bytes expected)
    pub fn read_byte_ack(&mut self) -> (u8, BusStatus) {
        self.read(true)
    }

    /// Receive one byte without acknowledging it (final byte)
    pub fn read_byte_nack(&mut self) -> (u8, BusStatus) {
        self.read(false)
    }

    /// Transmit a stop condition
    ///
    /// Does not wait for completion. Issuing a stop on an idle bus is
    /// harmless.
    pub fn stop(&mut self) {
        self.controller.issue_stop();
    }

    /// Open a bus session that issues exactly one stop when dropped
    pub fn session(&mut self) -> Session<'_, C> {
        Session { master: self }
    }

    fn read(&mut self, ack: bool) -> (u8, BusStatus) {
        self.controller.issue_read(ack);
        if !self.wait() {
            return (0x00, BusStatus::Timeout);
        }
        let data = self.controller.data();
        (data, self.status())
    }

    fn finish(&mut self) -> BusStatus {
        if self.wait() {
            self.status()
        } else {
            BusStatus::Timeout
        }
    }

    fn wait(&mut self) -> bool {
        for _ in 0..self.wait_polls {
            if self.controller.is_complete() {
                return true;
            }
        }
        warn!("bus operation did not complete after {} polls", self.wait_polls);
        false
    }
}

/// Scoped ownership of the bus for one transaction
///
/// Dropping the session transmits the stop condition, so every exit path
/// of a transaction (including early returns through `?`) releases the bus
/// exactly once.
pub struct Session<'a, C: TwiController> {
    master: &'a mut TwiMaster<C>,
}

impl<C: TwiController> Session<'_, C> {
    /// Transmit a start or repeated start condition
    pub fn start(&mut self) -> BusStatus {
        self.master.start()
    }

    /// Transmit one byte
    pub fn write_byte(&mut self, value: u8) -> BusStatus {
        self.master.write_byte(value)
    }

    /// Transmit the address byte for `address` in the given direction
    pub fn write_address(&mut self, address: u8, direction: Direction) -> BusStatus {
        self.master.write_byte(address_byte(address, direction))
    }

    /// Receive the final byte without acknowledging it
    pub fn read_byte_nack(&mut self) -> (u8, BusStatus) {
        self.master.read_byte_nack()
    }
}

impl<C: TwiController> Drop for Session<'_, C> {
    fn drop(&mut self) {
        self.master.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{BusOp, SimController};
    use twipoll_hal::twi::status;

    fn master() -> TwiMaster<SimController> {
        TwiMaster::new(SimController::mpu6050(), DEFAULT_WAIT_POLLS)
    }

    #[test]
    fn test_address_byte() {
        assert_eq!(address_byte(0x68, Direction::Write), 0xD0);
        assert_eq!(address_byte(0x68, Direction::Read), 0xD1);
    }

    #[test]
    fn test_start_then_repeated_start() {
        let mut m = master();
        assert_eq!(m.start(), BusStatus::Start);
        assert_eq!(m.start(), BusStatus::RepeatedStart);
        m.stop();
        assert_eq!(m.start(), BusStatus::Start);
    }

    #[test]
    fn test_address_ack_and_nack() {
        let mut m = master();
        m.start();
        assert_eq!(m.write_byte(0xD0), BusStatus::MtSlaAck);
        m.stop();

        m.start();
        assert_eq!(m.write_byte(address_byte(0x69, Direction::Write)), BusStatus::MtSlaNack);
        m.stop();

        m.start();
        assert_eq!(m.write_byte(0xD1), BusStatus::MrSlaAck);
        m.stop();
    }

    #[test]
    fn test_read_ack_and_nack() {
        let mut m = TwiMaster::new(
            SimController::mpu6050()
                .with_register(0x3F, 0xAB)
                .with_register(0x40, 0xCD),
            DEFAULT_WAIT_POLLS,
        );
        m.start();
        m.write_byte(0xD0);
        m.write_byte(0x3F);
        m.start();
        m.write_byte(0xD1);
        assert_eq!(m.read_byte_ack(), (0xAB, BusStatus::MrDataAck));
        assert_eq!(m.read_byte_nack(), (0xCD, BusStatus::MrDataNack));
        m.stop();
    }

    #[test]
    fn test_timeout_when_controller_stalls() {
        let mut sim = SimController::mpu6050();
        sim.stall_from(0);
        let mut m = TwiMaster::new(sim, 16);
        assert_eq!(m.start(), BusStatus::Timeout);
        assert_eq!(m.read_byte_nack(), (0x00, BusStatus::Timeout));
        assert_eq!(m.controller().completion_checks(), 32);
    }

    #[test]
    fn test_zero_budget_times_out_immediately() {
        let mut m = TwiMaster::new(SimController::mpu6050(), 0);
        assert_eq!(m.start(), BusStatus::Timeout);
    }

    #[test]
    fn test_session_stops_once_on_drop() {
        let mut m = master();
        {
            let mut session = m.session();
            session.start();
            session.write_address(0x68, Direction::Write);
        }
        assert_eq!(m.controller().stops(), 1);
        assert_eq!(
            m.controller().ops(),
            &[BusOp::Start, BusOp::Write(0xD0), BusOp::Stop]
        );
    }

    #[test]
    fn test_session_stops_on_early_return() {
        fn failing(m: &mut TwiMaster<SimController>) -> Result<(), ErrorCode> {
            let mut session = m.session();
            expect(session.start(), BusStatus::Start, ErrorCode::Start)?;
            expect(
                session.write_address(0x10, Direction::Write),
                BusStatus::MtSlaAck,
                ErrorCode::AddressAckWrite,
            )?;
            unreachable!("address 0x10 is not on the bus");
        }

        let mut m = master();
        assert_eq!(failing(&mut m), Err(ErrorCode::AddressAckWrite));
        assert_eq!(m.controller().stops(), 1);
        assert!(!m.controller().bus_held());
    }

    #[test]
    fn test_expect() {
        assert_eq!(expect(BusStatus::Start, BusStatus::Start, ErrorCode::Start), Ok(()));
        assert_eq!(
            expect(BusStatus::NoInfo, BusStatus::Start, ErrorCode::Start),
            Err(ErrorCode::Start)
        );
        assert_eq!(
            expect(BusStatus::Timeout, BusStatus::MrDataNack, ErrorCode::DataNack),
            Err(ErrorCode::Timeout)
        );
    }

    #[test]
    fn test_status_reads_register() {
        let mut m = master();
        m.start();
        m.controller_mut().inject_status(1, status::MT_SLA_NACK);
        assert_eq!(m.write_byte(0xD0), BusStatus::MtSlaNack);
        assert_eq!(m.status(), BusStatus::MtSlaNack);
    }
}
