//! Configuration types
//!
//! Device and register addresses, the poll interval and the bus wait
//! budget are named values rather than literals so the loop can be
//! retargeted to another sensor or bus variant. The firmware builds its
//! configuration from `sensor.toml` at compile time.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sensor::{register, DEFAULT_ADDRESS};
use crate::twi::DEFAULT_WAIT_POLLS;

/// Default delay between poll cycles
pub const DEFAULT_INTERVAL_MS: u32 = 100;

/// Default line terminator token
pub const DEFAULT_NEWLINE: u8 = b'\n';

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Address outside the usable 7-bit range 0x08..=0x77
    ReservedAddress(u8),
    /// Poll interval of zero
    ZeroInterval,
    /// Bus wait budget of zero
    ZeroWaitBudget,
    /// Both axis bytes map to the same register
    DuplicateAxisRegister(u8),
}

/// Sensor addressing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SensorConfig {
    /// 7-bit device address
    pub address: u8,
    /// Power management register written on wake-up
    pub power_register: u8,
    /// Value written to the power register to leave sleep mode
    pub wake_value: u8,
    /// Register holding the high byte of the measured axis
    pub axis_high_register: u8,
    /// Register holding the low byte of the measured axis
    pub axis_low_register: u8,
}

impl SensorConfig {
    /// MPU6050 with AD0 low, accelerometer Z axis
    pub const MPU6050: Self = Self {
        address: DEFAULT_ADDRESS,
        power_register: register::PWR_MGMT_1,
        wake_value: 0x00,
        axis_high_register: register::ACCEL_ZOUT_H,
        axis_low_register: register::ACCEL_ZOUT_L,
    };

    /// Check addressing for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0x08..=0x77).contains(&self.address) {
            return Err(ConfigError::ReservedAddress(self.address));
        }
        if self.axis_high_register == self.axis_low_register {
            return Err(ConfigError::DuplicateAxisRegister(self.axis_high_register));
        }
        Ok(())
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self::MPU6050
    }
}

/// Polling loop configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PollerConfig {
    /// Sensor addressing
    pub sensor: SensorConfig,
    /// Delay before each poll cycle (ms)
    pub interval_ms: u32,
    /// Token sent after each sample and while in the error state
    pub newline: u8,
    /// Completion flag checks per bus operation before timing out
    pub bus_wait_polls: u32,
}

impl PollerConfig {
    /// Defaults for an MPU6050 polled every 100 ms
    pub const DEFAULT: Self = Self {
        sensor: SensorConfig::MPU6050,
        interval_ms: DEFAULT_INTERVAL_MS,
        newline: DEFAULT_NEWLINE,
        bus_wait_polls: DEFAULT_WAIT_POLLS,
    };

    /// Check the whole configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sensor.validate()?;
        if self.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.bus_wait_polls == 0 {
            return Err(ConfigError::ZeroWaitBudget);
        }
        Ok(())
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PollerConfig::default();
        assert_eq!(config.sensor.address, 0x68);
        assert_eq!(config.sensor.power_register, 0x6B);
        assert_eq!(config.sensor.axis_high_register, 0x3F);
        assert_eq!(config.sensor.axis_low_register, 0x40);
        assert_eq!(config.interval_ms, 100);
        assert_eq!(config.newline, 0x0A);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_reserved_addresses_rejected() {
        for address in [0x00, 0x07, 0x78, 0x7F, 0xD0] {
            let sensor = SensorConfig {
                address,
                ..SensorConfig::MPU6050
            };
            assert_eq!(sensor.validate(), Err(ConfigError::ReservedAddress(address)));
        }
    }

    #[test]
    fn test_alternate_address_accepted() {
        // AD0 high
        let sensor = SensorConfig {
            address: 0x69,
            ..SensorConfig::MPU6050
        };
        assert_eq!(sensor.validate(), Ok(()));
    }

    #[test]
    fn test_zero_values_rejected() {
        let config = PollerConfig {
            interval_ms: 0,
            ..PollerConfig::DEFAULT
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroInterval));

        let config = PollerConfig {
            bus_wait_polls: 0,
            ..PollerConfig::DEFAULT
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroWaitBudget));
    }

    #[test]
    fn test_duplicate_axis_register() {
        let config = PollerConfig {
            sensor: SensorConfig {
                axis_low_register: 0x3F,
                ..SensorConfig::MPU6050
            },
            ..PollerConfig::DEFAULT
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateAxisRegister(0x3F))
        );
    }
}
