//! Serial output abstractions
//!
//! The polling loop reports everything it does as single bytes on a serial
//! line. Implementations wrap a UART transmitter or, in tests, a buffer.

/// Byte-oriented serial sink
///
/// Bytes must leave the sink in the order they were sent.
pub trait SerialSink {
    /// Prepare the sink for use
    ///
    /// Calling this more than once must have no further effect.
    fn init(&mut self);

    /// Send one byte, blocking until it has been accepted
    fn send(&mut self, byte: u8);
}

impl<T: SerialSink + ?Sized> SerialSink for &mut T {
    fn init(&mut self) {
        (**self).init();
    }

    fn send(&mut self, byte: u8) {
        (**self).send(byte);
    }
}

/// UART configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingSink {
        inits: u32,
        last: Option<u8>,
        count: u32,
    }

    impl SerialSink for CountingSink {
        fn init(&mut self) {
            self.inits += 1;
        }

        fn send(&mut self, byte: u8) {
            self.last = Some(byte);
            self.count += 1;
        }
    }

    #[test]
    fn test_default_is_9600_8n1() {
        let config = UartConfig::default();
        assert_eq!(config.baudrate, 9600);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
    }

    #[test]
    fn test_forwarding_through_reference() {
        let mut sink = CountingSink {
            inits: 0,
            last: None,
            count: 0,
        };
        {
            let mut by_ref = &mut sink;
            by_ref.init();
            by_ref.send(1);
            by_ref.send(2);
            by_ref.send(3);
        }
        assert_eq!(sink.inits, 1);
        assert_eq!(sink.count, 3);
        assert_eq!(sink.last, Some(3));
    }
}
