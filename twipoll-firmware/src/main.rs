//! twipoll firmware
//!
//! Wakes an MPU6050 on a bit-banged TWI bus and streams its Z axis
//! acceleration over UART0, one `high, low, newline` triple per cycle.
//!
//! Board wiring (RP2040):
//! - GPIO0: UART0 TX
//! - GPIO4: SDA (open drain, external pull-up)
//! - GPIO5: SCL (open drain, external pull-up)

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, OutputOpenDrain};
use embassy_rp::uart::{self, UartTx};
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

use twipoll_core::Poller;
use twipoll_drivers::{BitBangTwi, IoSink};
use twipoll_hal::serial::{DataBits, Parity, StopBits, UartConfig};
use twipoll_hal::twi::TwiConfig;

/// Constants generated from sensor.toml
mod config {
    include!(concat!(env!("OUT_DIR"), "/config.rs"));
}

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("twipoll firmware starting...");

    let p = embassy_rp::init(Default::default());

    let serial_config = UartConfig {
        baudrate: config::SERIAL_BAUDRATE,
        ..UartConfig::default()
    };
    let tx = UartTx::new_blocking(p.UART0, p.PIN_0, rp_uart_config(&serial_config));
    let sink = IoSink::new(tx);
    info!("UART0 at {} baud", serial_config.baudrate);

    // Released (high) until the first start condition
    let sda = OutputOpenDrain::new(p.PIN_4, Level::High);
    let scl = OutputOpenDrain::new(p.PIN_5, Level::High);
    let twi_config = TwiConfig {
        frequency: config::TWI_FREQUENCY,
    };
    let twi = BitBangTwi::new(sda, scl, Delay, &twi_config);
    info!("TWI at {} Hz", twi_config.frequency);

    let mut poller = Poller::new(twi, sink, Delay, &config::POLLER);

    // Only returns if the sensor never woke up; a bus fault while polling
    // keeps the loop alive in its error state
    poller.run_until_halted();

    error!(
        "halted: {:?}, {} bytes dropped",
        poller.last_error(),
        poller.sink().dropped()
    );
    loop {
        cortex_m::asm::wfi();
    }
}

/// Map the board-agnostic line settings onto the RP2040 UART
fn rp_uart_config(config: &UartConfig) -> uart::Config {
    let mut rp = uart::Config::default();
    rp.baudrate = config.baudrate;
    rp.data_bits = match config.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    rp.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    rp.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    rp
}
