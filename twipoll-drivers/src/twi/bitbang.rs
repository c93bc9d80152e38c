//! Bit-banged TWI controller
//!
//! Drives SDA and SCL as open-drain GPIOs (`set_high` releases the line,
//! `set_low` pulls it down) and synthesizes the status register codes a
//! hardware TWI peripheral would report.
//!
//! Operations run to completion inside `issue_*`. The only exception is a
//! slave holding SCL low for longer than the stretch budget: the operation
//! is then left incomplete, so the caller's bounded wait reports a timeout.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use twipoll_hal::twi::{status, TwiConfig};
use twipoll_hal::TwiController;

/// Half periods a slave may stretch SCL before the operation is abandoned
pub const STRETCH_LIMIT: u32 = 1_000;

/// Reasons a bit-level operation could not finish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum LineFault {
    /// A pin reported an error
    Pin,
    /// SCL stayed low past the stretch budget
    Stretched,
}

/// TWI master over two open-drain pins
pub struct BitBangTwi<SDA, SCL, D> {
    sda: SDA,
    scl: SCL,
    delay: D,
    half_period_ns: u32,
    /// Start issued, no stop yet
    held: bool,
    /// Next written byte is an address byte
    expect_address: bool,
    complete: bool,
    data: u8,
    status: u8,
}

impl<SDA, SCL, D> BitBangTwi<SDA, SCL, D>
where
    SDA: InputPin + OutputPin,
    SCL: InputPin + OutputPin,
    D: DelayNs,
{
    /// Create a new controller
    ///
    /// Both pins must already be configured as open-drain outputs with
    /// their input buffers enabled.
    pub fn new(sda: SDA, scl: SCL, delay: D, config: &TwiConfig) -> Self {
        Self {
            sda,
            scl,
            delay,
            half_period_ns: config.half_period_ns(),
            held: false,
            expect_address: false,
            complete: false,
            data: 0,
            status: status::NO_INFO,
        }
    }

    /// Consume the controller and return the pins and delay
    pub fn release(self) -> (SDA, SCL, D) {
        (self.sda, self.scl, self.delay)
    }

    fn half_period(&mut self) {
        self.delay.delay_ns(self.half_period_ns);
    }

    fn sda(&mut self, high: bool) -> Result<(), LineFault> {
        self.sda.set_state(high.into()).map_err(|_| LineFault::Pin)
    }

    fn sda_is_high(&mut self) -> Result<bool, LineFault> {
        self.sda.is_high().map_err(|_| LineFault::Pin)
    }

    fn scl_low(&mut self) -> Result<(), LineFault> {
        self.scl.set_low().map_err(|_| LineFault::Pin)
    }

    /// Release SCL and wait while a slave stretches the clock
    fn scl_high(&mut self) -> Result<(), LineFault> {
        self.scl.set_high().map_err(|_| LineFault::Pin)?;
        let mut budget = STRETCH_LIMIT;
        while self.scl.is_low().map_err(|_| LineFault::Pin)? {
            if budget == 0 {
                return Err(LineFault::Stretched);
            }
            budget -= 1;
            self.half_period();
        }
        Ok(())
    }

    /// One clock pulse with SDA already set up
    fn clock(&mut self) -> Result<(), LineFault> {
        self.half_period();
        self.scl_high()?;
        self.half_period();
        self.scl_low()
    }

    fn start(&mut self) -> Result<u8, LineFault> {
        let repeated = self.held;
        // SCL is low between bytes; bring both lines up before the edge
        self.sda(true)?;
        if repeated {
            self.half_period();
        }
        self.scl_high()?;
        self.half_period();
        self.sda(false)?;
        self.half_period();
        self.scl_low()?;

        self.held = true;
        self.expect_address = true;
        Ok(if repeated {
            status::REP_START
        } else {
            status::START
        })
    }

    fn write(&mut self, byte: u8) -> Result<u8, LineFault> {
        for bit in (0..8).rev() {
            self.sda((byte >> bit) & 1 == 1)?;
            self.clock()?;
        }

        // Acknowledge slot: release SDA and sample it while SCL is high
        self.sda(true)?;
        self.half_period();
        self.scl_high()?;
        let ack = !self.sda_is_high()?;
        self.half_period();
        self.scl_low()?;

        let code = if self.expect_address {
            self.expect_address = false;
            match (byte & 1 == 1, ack) {
                (false, true) => status::MT_SLA_ACK,
                (false, false) => status::MT_SLA_NACK,
                (true, true) => status::MR_SLA_ACK,
                (true, false) => status::MR_SLA_NACK,
            }
        } else if ack {
            status::MT_DATA_ACK
        } else {
            status::MT_DATA_NACK
        };
        Ok(code)
    }

    fn read(&mut self, ack: bool) -> Result<u8, LineFault> {
        self.sda(true)?;
        let mut byte = 0u8;
        for _ in 0..8 {
            self.half_period();
            self.scl_high()?;
            byte = (byte << 1) | u8::from(self.sda_is_high()?);
            self.half_period();
            self.scl_low()?;
        }

        // ACK pulls SDA low, NACK leaves it released
        self.sda(!ack)?;
        self.clock()?;
        self.sda(true)?;

        self.data = byte;
        Ok(if ack {
            status::MR_DATA_ACK
        } else {
            status::MR_DATA_NACK
        })
    }

    fn stop(&mut self) -> Result<(), LineFault> {
        self.sda(false)?;
        self.half_period();
        let clock = self.scl_high();
        self.half_period();
        // Release SDA even if SCL never came up
        self.sda(true)?;
        self.half_period();
        clock
    }

    fn finish(&mut self, result: Result<u8, LineFault>) {
        match result {
            Ok(code) => {
                self.status = code;
                self.complete = true;
            }
            Err(LineFault::Pin) => {
                self.held = false;
                self.status = status::BUS_ERROR;
                self.complete = true;
            }
            // Left incomplete; the master's bounded wait gives up
            Err(LineFault::Stretched) => {}
        }
    }
}

impl<SDA, SCL, D> TwiController for BitBangTwi<SDA, SCL, D>
where
    SDA: InputPin + OutputPin,
    SCL: InputPin + OutputPin,
    D: DelayNs,
{
    fn issue_start(&mut self) {
        self.complete = false;
        let result = self.start();
        self.finish(result);
    }

    fn issue_write(&mut self, byte: u8) {
        self.complete = false;
        let result = self.write(byte);
        self.finish(result);
    }

    fn issue_read(&mut self, ack: bool) {
        self.complete = false;
        let result = self.read(ack);
        self.finish(result);
    }

    fn issue_stop(&mut self) {
        let was_held = self.held;
        self.complete = false;
        self.held = false;
        self.expect_address = false;
        // Both lines are already released on an idle bus; a stop there
        // would put a start+stop pair on the wire
        if !was_held {
            self.status = status::NO_INFO;
            return;
        }
        self.status = match self.stop() {
            Ok(()) => status::NO_INFO,
            Err(_) => status::BUS_ERROR,
        };
    }

    fn is_complete(&mut self) -> bool {
        self.complete
    }

    fn data(&mut self) -> u8 {
        self.data
    }

    fn status(&mut self) -> u8 {
        self.status
    }
}
