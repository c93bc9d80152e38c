//! Deterministic simulation of the hardware ports
//!
//! [`SimController`] models a TWI controller with one MPU6050-like device
//! attached: a 128-byte register file behind a register pointer, ACK on
//! its own address, NACK on any other. Status responses can be overridden
//! per operation and the controller can be made to stall, which is how
//! tests drive the protocol into each failure path.
//!
//! [`RecordingSink`] and [`RecordingDelay`] capture what the polling loop
//! emits and how long it waits.

use embedded_hal::delay::DelayNs;
use heapless::{LinearMap, Vec};
use twipoll_hal::twi::status;
use twipoll_hal::{SerialSink, TwiController};

use crate::sensor::{register, DEFAULT_ADDRESS};

/// Maximum number of bus operations kept in the log
pub const MAX_LOGGED_OPS: usize = 128;

/// Maximum number of bytes kept by [`RecordingSink`]
pub const MAX_RECORDED_BYTES: usize = 256;

/// Maximum number of status overrides
pub const MAX_OVERRIDES: usize = 8;

/// Power-on value of PWR_MGMT_1 (sleep bit set)
const POWER_ON_SLEEP: u8 = 0x40;

/// One elementary operation observed by the simulated controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Start,
    Write(u8),
    Read { ack: bool },
    Stop,
}

/// Simulated TWI controller with one attached device
#[derive(Debug)]
pub struct SimController {
    device_address: u8,
    registers: [u8; 128],
    pointer: u8,
    /// Next written byte selects the register pointer
    pointer_pending: bool,
    /// Start issued, no stop yet
    held: bool,
    /// Next written byte is an address byte
    expect_address: bool,
    addressed: bool,
    reading: bool,
    complete: bool,
    data: u8,
    status: u8,
    /// Index of the next start/write/read operation
    next_op: u32,
    overrides: LinearMap<u32, u8, MAX_OVERRIDES>,
    stall_from: Option<u32>,
    ops: Vec<BusOp, MAX_LOGGED_OPS>,
    starts: u32,
    stops: u32,
    completion_checks: u32,
}

impl SimController {
    /// Create a controller with a device answering at `device_address`
    pub fn new(device_address: u8) -> Self {
        Self {
            device_address,
            registers: [0; 128],
            pointer: 0,
            pointer_pending: false,
            held: false,
            expect_address: false,
            addressed: false,
            reading: false,
            complete: false,
            data: 0,
            status: status::NO_INFO,
            next_op: 0,
            overrides: LinearMap::new(),
            stall_from: None,
            ops: Vec::new(),
            starts: 0,
            stops: 0,
            completion_checks: 0,
        }
    }

    /// Create a controller with an MPU6050 at its default address, asleep
    pub fn mpu6050() -> Self {
        Self::new(DEFAULT_ADDRESS).with_register(register::PWR_MGMT_1, POWER_ON_SLEEP)
    }

    /// Preload a device register
    pub fn with_register(mut self, reg: u8, value: u8) -> Self {
        self.set_register(reg, value);
        self
    }

    /// Set a device register
    pub fn set_register(&mut self, reg: u8, value: u8) {
        self.registers[usize::from(reg & 0x7F)] = value;
    }

    /// Read back a device register
    pub fn register(&self, reg: u8) -> u8 {
        self.registers[usize::from(reg & 0x7F)]
    }

    /// Report `raw` instead of the natural status for the operation with
    /// the given index
    ///
    /// Operations are numbered from zero in the order start, write and
    /// read operations are issued; stops are not counted. Overrides beyond
    /// [`MAX_OVERRIDES`] are ignored.
    pub fn inject_status(&mut self, op_index: u32, raw: u8) {
        let _ = self.overrides.insert(op_index, raw);
    }

    /// Never complete the operation with the given index or any later one
    pub fn stall_from(&mut self, op_index: u32) {
        self.stall_from = Some(op_index);
    }

    /// Operations issued so far (the first [`MAX_LOGGED_OPS`])
    pub fn ops(&self) -> &[BusOp] {
        &self.ops
    }

    /// Forget the operation log and counters
    pub fn clear_ops(&mut self) {
        self.ops.clear();
        self.starts = 0;
        self.stops = 0;
    }

    /// Number of start conditions (including repeated starts)
    pub fn starts(&self) -> u32 {
        self.starts
    }

    /// Number of repeated start conditions in the log
    pub fn repeated_starts(&self) -> usize {
        let mut held = false;
        let mut repeated = 0;
        for op in &self.ops {
            match op {
                BusOp::Start if held => repeated += 1,
                BusOp::Start => held = true,
                BusOp::Stop => held = false,
                _ => {}
            }
        }
        repeated
    }

    /// Number of stop conditions
    pub fn stops(&self) -> u32 {
        self.stops
    }

    /// Number of start/write/read operations issued
    pub fn issued(&self) -> u32 {
        self.next_op
    }

    /// Number of times the completion flag was checked
    pub fn completion_checks(&self) -> u32 {
        self.completion_checks
    }

    /// Check whether a transaction is open (start without stop)
    pub fn bus_held(&self) -> bool {
        self.held
    }

    fn log(&mut self, op: BusOp) {
        let _ = self.ops.push(op);
    }

    fn complete_with(&mut self, natural: u8) {
        let index = self.next_op;
        self.next_op += 1;

        if self.stall_from.is_some_and(|from| index >= from) {
            return;
        }

        self.status = self.overrides.get(&index).copied().unwrap_or(natural);
        self.complete = true;
    }

    fn advance_pointer(&mut self) {
        self.pointer = (self.pointer + 1) & 0x7F;
    }
}

impl TwiController for SimController {
    fn issue_start(&mut self) {
        self.complete = false;
        self.log(BusOp::Start);
        self.starts += 1;

        let natural = if self.held {
            status::REP_START
        } else {
            status::START
        };
        self.held = true;
        self.expect_address = true;
        self.complete_with(natural);
    }

    fn issue_write(&mut self, byte: u8) {
        self.complete = false;
        self.log(BusOp::Write(byte));

        let natural = if self.expect_address {
            self.expect_address = false;
            self.addressed = byte >> 1 == self.device_address;
            self.reading = byte & 1 == 1;
            self.pointer_pending = self.addressed && !self.reading;
            match (self.addressed, self.reading) {
                (true, false) => status::MT_SLA_ACK,
                (false, false) => status::MT_SLA_NACK,
                (true, true) => status::MR_SLA_ACK,
                (false, true) => status::MR_SLA_NACK,
            }
        } else if self.addressed && !self.reading {
            if self.pointer_pending {
                self.pointer = byte & 0x7F;
                self.pointer_pending = false;
            } else {
                self.registers[usize::from(self.pointer)] = byte;
                self.advance_pointer();
            }
            status::MT_DATA_ACK
        } else {
            status::MT_DATA_NACK
        };
        self.complete_with(natural);
    }

    fn issue_read(&mut self, ack: bool) {
        self.complete = false;
        self.log(BusOp::Read { ack });

        self.data = if self.addressed && self.reading {
            let value = self.registers[usize::from(self.pointer)];
            self.advance_pointer();
            value
        } else {
            // Nobody drives SDA
            0xFF
        };
        let natural = if ack {
            status::MR_DATA_ACK
        } else {
            status::MR_DATA_NACK
        };
        self.complete_with(natural);
    }

    fn issue_stop(&mut self) {
        self.complete = false;
        self.log(BusOp::Stop);
        self.stops += 1;

        self.held = false;
        self.expect_address = false;
        self.addressed = false;
        self.reading = false;
        self.pointer_pending = false;
        self.status = status::NO_INFO;
    }

    fn is_complete(&mut self) -> bool {
        self.completion_checks += 1;
        self.complete
    }

    fn data(&mut self) -> u8 {
        self.data
    }

    fn status(&mut self) -> u8 {
        self.status
    }
}

/// Serial sink that records every byte
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Vec<u8, MAX_RECORDED_BYTES>,
    init_calls: u32,
    dropped: u32,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes sent so far (the first [`MAX_RECORDED_BYTES`])
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Number of bytes that did not fit in the record
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Number of `init` calls
    pub fn init_calls(&self) -> u32 {
        self.init_calls
    }

    /// Forget the recorded bytes
    pub fn clear(&mut self) {
        self.sent.clear();
        self.dropped = 0;
    }
}

impl SerialSink for RecordingSink {
    fn init(&mut self) {
        self.init_calls += 1;
    }

    fn send(&mut self, byte: u8) {
        if self.sent.push(byte).is_err() {
            self.dropped += 1;
        }
    }
}

/// Delay that returns immediately and records the requested time
#[derive(Debug, Default)]
pub struct RecordingDelay {
    total_ns: u64,
    calls: u32,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total requested delay in milliseconds
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }

    /// Number of delay requests
    pub fn calls(&self) -> u32 {
        self.calls
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.calls += 1;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns += u64::from(ms) * 1_000_000;
        self.calls += 1;
    }
}
