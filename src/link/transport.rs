//! Trait abstraction for line-oriented link I/O to enable testing

use async_trait::async_trait;
use std::io;
use std::time::Duration;

use tokio::io::BufReader;
use tokio_serial::SerialPortBuilderExt;

use crate::error::{BridgeError, Result};

/// Trait for newline-delimited I/O against the device
#[async_trait]
pub trait LinkTransport: Send {
    /// Write one complete frame (terminator included) and flush it
    async fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Read one newline-terminated line, waiting at most `timeout`.
    /// `Ok(None)` means nothing arrived in time.
    async fn read_line(&mut self, timeout: Duration) -> io::Result<Option<String>>;
}

/// Serial port transport (8N1, line-oriented)
pub struct SerialTransport {
    reader: BufReader<tokio_serial::SerialStream>,
    line: String,
}

impl SerialTransport {
    /// Open a serial port with the device's framing settings
    ///
    /// # Errors
    ///
    /// Returns `Serial` error if the port cannot be opened
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| BridgeError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(Self {
            reader: BufReader::new(port),
            line: String::new(),
        })
    }
}

#[async_trait]
impl LinkTransport for SerialTransport {
    async fn write_line(&mut self, line: &str) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        let port = self.reader.get_mut();
        port.write_all(line.as_bytes()).await?;
        port.flush().await
    }

    async fn read_line(&mut self, timeout: Duration) -> io::Result<Option<String>> {
        use tokio::io::AsyncBufReadExt;
        self.line.clear();
        match tokio::time::timeout(timeout, self.reader.read_line(&mut self.line)).await {
            // Window elapsed with no complete line. Normal.
            Err(_) => Ok(None),
            // EOF
            Ok(Ok(0)) => Ok(None),
            Ok(Ok(_)) => Ok(Some(std::mem::take(&mut self.line))),
            Ok(Err(e)) => Err(e),
        }
    }
}
