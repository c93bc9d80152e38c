//! Serial sink over a blocking `embedded_io::Write`
//!
//! The polling loop has no way to act on a transmit failure, so bytes
//! the writer rejects are counted and dropped.

use embedded_io::Write;
use twipoll_hal::SerialSink;

/// Serial sink wrapping a UART transmitter
pub struct IoSink<W> {
    writer: W,
    initialized: bool,
    dropped: u32,
}

impl<W: Write> IoSink<W> {
    /// Wrap an already configured writer
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            initialized: false,
            dropped: 0,
        }
    }

    /// Bytes the writer refused
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Check if [`SerialSink::init`] has run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Get access to the underlying writer
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Consume the sink and return the writer
    pub fn release(self) -> W {
        self.writer
    }
}

impl<W: Write> SerialSink for IoSink<W> {
    fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        // Drain anything the HAL queued while configuring the line
        if self.writer.flush().is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("serial flush failed during init");
        }
    }

    fn send(&mut self, byte: u8) {
        if self.writer.write_all(&[byte]).is_err() {
            self.dropped = self.dropped.saturating_add(1);
            #[cfg(feature = "defmt")]
            defmt::warn!("serial byte {=u8:#x} dropped", byte);
        }
    }
}
