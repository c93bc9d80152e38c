//! MPU6050 register access
//!
//! Composes the TWI primitives into the two transactions the polling loop
//! needs: waking the device and reading a single register. Each expected
//! status is checked in order; the first mismatch names the failing step.
//!
//! On failure the driver writes the error code to the serial sink itself,
//! after the bus has been released, and returns it to the caller.

use twipoll_hal::{SerialSink, TwiController};

use crate::config::SensorConfig;
use crate::error::ErrorCode;
use crate::status::BusStatus;
use crate::twi::{expect, Direction, TwiMaster};

/// Default 7-bit address (AD0 low)
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Register addresses used by the polling loop
pub mod register {
    /// Power management 1 (sleep bit 6)
    pub const PWR_MGMT_1: u8 = 0x6B;
    /// Accelerometer Z axis, high byte
    pub const ACCEL_ZOUT_H: u8 = 0x3F;
    /// Accelerometer Z axis, low byte
    pub const ACCEL_ZOUT_L: u8 = 0x40;
}

/// MPU6050 driver over a blocking TWI master
pub struct Mpu6050<C> {
    master: TwiMaster<C>,
    config: SensorConfig,
}

impl<C: TwiController> Mpu6050<C> {
    /// Create a new driver
    pub fn new(master: TwiMaster<C>, config: SensorConfig) -> Self {
        Self { master, config }
    }

    /// Sensor configuration in use
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Get access to the underlying bus master
    pub fn master(&self) -> &TwiMaster<C> {
        &self.master
    }

    /// Get mutable access to the underlying bus master
    pub fn master_mut(&mut self) -> &mut TwiMaster<C> {
        &mut self.master
    }

    /// Take the device out of sleep mode
    ///
    /// start, SLA+W, power register, wake value, stop.
    pub fn wakeup<S: SerialSink>(&mut self, sink: &mut S) -> Result<(), ErrorCode> {
        let result = self.write_register(self.config.power_register, self.config.wake_value);
        if result.is_ok() {
            debug!("sensor at {:#x} awake", self.config.address);
        }
        report(result, sink)
    }

    /// Read a single register
    ///
    /// start, SLA+W, register, repeated start, SLA+R, read with NACK, stop.
    pub fn read_register<S: SerialSink>(&mut self, reg: u8, sink: &mut S) -> Result<u8, ErrorCode> {
        let result = self.read_single(reg);
        if let Err(code) = result {
            warn!("read of register {:#x} failed: {:?}", reg, code);
        }
        report(result, sink)
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), ErrorCode> {
        let address = self.config.address;
        let mut session = self.master.session();

        expect(session.start(), BusStatus::Start, ErrorCode::Start)?;
        expect(
            session.write_address(address, Direction::Write),
            BusStatus::MtSlaAck,
            ErrorCode::AddressAckWrite,
        )?;
        expect(session.write_byte(reg), BusStatus::MtDataAck, ErrorCode::DataAck)?;
        expect(session.write_byte(value), BusStatus::MtDataAck, ErrorCode::DataAck)?;
        Ok(())
    }

    fn read_single(&mut self, reg: u8) -> Result<u8, ErrorCode> {
        let address = self.config.address;
        let mut session = self.master.session();

        expect(session.start(), BusStatus::Start, ErrorCode::Start)?;
        expect(
            session.write_address(address, Direction::Write),
            BusStatus::MtSlaAck,
            ErrorCode::AddressAckWrite,
        )?;
        expect(session.write_byte(reg), BusStatus::MtDataAck, ErrorCode::DataAck)?;
        expect(
            session.start(),
            BusStatus::RepeatedStart,
            ErrorCode::RepeatedStart,
        )?;
        expect(
            session.write_address(address, Direction::Read),
            BusStatus::MrSlaAck,
            ErrorCode::AddressAckRead,
        )?;
        let (byte, status) = session.read_byte_nack();
        expect(status, BusStatus::MrDataNack, ErrorCode::DataNack)?;
        Ok(byte)
    }
}

// Runs after the session guard has released the bus.
fn report<T, S: SerialSink>(result: Result<T, ErrorCode>, sink: &mut S) -> Result<T, ErrorCode> {
    if let Err(code) = &result {
        sink.send(code.code());
    }
    result
}
