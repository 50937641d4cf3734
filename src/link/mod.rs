//! # Device Link Module
//!
//! Handles serial communication with the thruster device.
//!
//! This module handles:
//! - Opening the serial port (8N1) at the configured baud rate
//! - Framing outbound commands as one JSON object per line
//! - Reading inbound response lines bounded by a per-call timeout
//! - The Connected/Disconnected lifecycle
//!
//! ## Failure Semantics
//!
//! The link degrades rather than fails: sending while Disconnected is a
//! no-op, a missing response within the read window is a normal outcome,
//! and a write or read I/O error transitions the link to Disconnected and
//! surfaces one error for the caller to log. Reconnecting is always an
//! explicit external action.

pub mod transport;

use std::io;

use tracing::{debug, info};

use crate::config::SerialConfig;
use crate::error::{BridgeError, Result};
use crate::thruster::ThrustCommand;
use transport::{LinkTransport, SerialTransport};

/// Result of a send attempt that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Frame was written and flushed
    Sent,
    /// Link is Disconnected; the command was dropped without an error
    LinkDown,
}

/// Serial link to the thruster device.
///
/// Connected iff it holds an open transport. Exclusively owned by the
/// control loop; external collaborators request connect/disconnect through
/// the loop, never on the link directly.
pub struct DeviceLink {
    config: SerialConfig,
    transport: Option<Box<dyn LinkTransport>>,
}

impl std::fmt::Debug for DeviceLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLink")
            .field("port", &self.config.port)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl DeviceLink {
    /// Create a link in the Disconnected state
    #[must_use]
    pub fn new(config: SerialConfig) -> Self {
        Self {
            config,
            transport: None,
        }
    }

    /// Open the serial channel.
    ///
    /// A link that is already Connected is closed first, so a repeated
    /// connect request behaves as a reconnect.
    ///
    /// # Errors
    ///
    /// Returns `Serial` error if the port cannot be opened; the link
    /// remains Disconnected and the loop keeps running without it.
    pub fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            debug!("Reconnect requested on {}", self.config.port);
            self.disconnect();
        }

        let transport = SerialTransport::open(&self.config.port, self.config.baud_rate)?;
        info!(
            "Connected to device on {} at {} baud",
            self.config.port, self.config.baud_rate
        );
        self.transport = Some(Box::new(transport));
        Ok(())
    }

    /// Whether the link currently holds an open transport
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Send one command frame.
    ///
    /// Serializes the command as a single JSON object terminated by a
    /// newline and writes it. Returns `Ok(LinkDown)` without touching the
    /// wire when Disconnected.
    ///
    /// # Errors
    ///
    /// A write failure transitions the link to Disconnected and returns a
    /// `Serial` error. The caller logs it and continues; the next explicit
    /// connect request restores the link.
    pub async fn send(&mut self, command: &ThrustCommand) -> Result<SendOutcome> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(SendOutcome::LinkDown);
        };

        let mut frame = serde_json::to_string(command)?;
        frame.push('\n');

        match transport.write_line(&frame).await {
            Ok(()) => {
                debug!("Sent command frame ({} bytes)", frame.len());
                Ok(SendOutcome::Sent)
            }
            Err(e) => {
                self.transport = None;
                Err(BridgeError::Serial(format!("Failed to write frame: {}", e)))
            }
        }
    }

    /// Attempt to read one response line within the configured timeout.
    ///
    /// `Ok(None)` covers every normal absence: link down, nothing arrived
    /// in the window, an empty line, or an undecodable line. The device is
    /// not required to answer every command.
    ///
    /// # Errors
    ///
    /// A read I/O failure transitions the link to Disconnected and returns
    /// a `Serial` error.
    pub async fn receive(&mut self) -> Result<Option<String>> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(None);
        };

        match transport.read_line(self.config.read_timeout()).await {
            Ok(None) => Ok(None),
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(line.to_string()))
                }
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                // Undecodable bytes from the device count as no response.
                debug!("Dropping undecodable response line: {}", e);
                Ok(None)
            }
            Err(e) => {
                self.transport = None;
                Err(BridgeError::Serial(format!("Failed to read response: {}", e)))
            }
        }
    }

    /// Close the channel if open. Idempotent.
    pub fn disconnect(&mut self) {
        if self.transport.take().is_some() {
            info!("Serial connection closed");
        }
    }

    #[cfg(test)]
    pub(crate) fn attach_transport(&mut self, transport: Box<dyn LinkTransport>) {
        self.transport = Some(transport);
    }
}

#[cfg(test)]
mod tests {
    use super::transport::mocks::MockTransport;
    use super::*;

    fn test_command() -> ThrustCommand {
        ThrustCommand {
            left_thrust_power: 4300,
            right_thrust_power: 3300,
            z_thrust_power: 5200,
        }
    }

    fn connected_link() -> (DeviceLink, super::transport::mocks::MockProbe) {
        let mut link = DeviceLink::new(SerialConfig::default());
        let (transport, probe) = MockTransport::new();
        link.attach_transport(Box::new(transport));
        (link, probe)
    }

    #[tokio::test]
    async fn test_send_while_disconnected_is_noop() {
        let mut link = DeviceLink::new(SerialConfig::default());
        assert!(!link.is_connected());

        let outcome = link.send(&test_command()).await.unwrap();
        assert_eq!(outcome, SendOutcome::LinkDown);
    }

    #[tokio::test]
    async fn test_receive_while_disconnected_returns_none() {
        let mut link = DeviceLink::new(SerialConfig::default());
        let response = link.receive().await.unwrap();
        assert_eq!(response, None);
    }

    #[tokio::test]
    async fn test_send_writes_one_json_line() {
        let (mut link, probe) = connected_link();

        let outcome = link.send(&test_command()).await.unwrap();
        assert_eq!(outcome, SendOutcome::Sent);

        let written = probe.written();
        assert_eq!(written.len(), 1);
        assert_eq!(
            written[0],
            "{\"left_thrust_power\":4300,\"right_thrust_power\":3300,\"z_thrust_power\":5200}\n"
        );
    }

    #[tokio::test]
    async fn test_write_failure_disconnects_link() {
        let (mut link, probe) = connected_link();
        probe.set_write_error(io::ErrorKind::BrokenPipe);

        let result = link.send(&test_command()).await;
        assert!(result.is_err());
        assert!(!link.is_connected());

        // Subsequent sends degrade to no-ops, not errors
        let outcome = link.send(&test_command()).await.unwrap();
        assert_eq!(outcome, SendOutcome::LinkDown);
        assert!(probe.written().is_empty());
    }

    #[tokio::test]
    async fn test_receive_trims_response_line() {
        let (mut link, probe) = connected_link();
        probe.push_read(Ok(Some("depth=12.5\r\n".to_string())));

        let response = link.receive().await.unwrap();
        assert_eq!(response.as_deref(), Some("depth=12.5"));
        assert!(link.is_connected());
    }

    #[tokio::test]
    async fn test_receive_nothing_in_window_is_normal() {
        let (mut link, _probe) = connected_link();

        let response = link.receive().await.unwrap();
        assert_eq!(response, None);
        assert!(link.is_connected());
    }

    #[tokio::test]
    async fn test_receive_empty_line_is_absent() {
        let (mut link, probe) = connected_link();
        probe.push_read(Ok(Some("\n".to_string())));

        let response = link.receive().await.unwrap();
        assert_eq!(response, None);
    }

    #[tokio::test]
    async fn test_receive_undecodable_line_is_absent() {
        let (mut link, probe) = connected_link();
        probe.push_read(Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "stream did not contain valid UTF-8",
        )));

        let response = link.receive().await.unwrap();
        assert_eq!(response, None);
        // Decode failures are not link failures
        assert!(link.is_connected());
    }

    #[tokio::test]
    async fn test_read_failure_disconnects_link() {
        let (mut link, probe) = connected_link();
        probe.push_read(Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")));

        let result = link.receive().await;
        assert!(result.is_err());
        assert!(!link.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let (mut link, probe) = connected_link();

        link.disconnect();
        link.disconnect();

        assert!(!link.is_connected());
        assert_eq!(probe.closed_count(), 1);
    }

    #[tokio::test]
    async fn test_connect_to_missing_port_stays_disconnected() {
        let mut config = SerialConfig::default();
        config.port = "/dev/nonexistent_serial_device_12345".to_string();
        let mut link = DeviceLink::new(config);

        let result = link.connect();
        assert!(result.is_err());
        assert!(!link.is_connected());

        match result.unwrap_err() {
            BridgeError::Serial(msg) => {
                assert!(msg.contains("/dev/nonexistent_serial_device_12345"));
            }
            other => panic!("Expected Serial error, got: {:?}", other),
        }
    }

    // Integration test - only runs with the device attached
    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_roundtrip_with_real_hardware() {
        let mut link = DeviceLink::new(SerialConfig::default());
        link.connect().expect("device should be attached");

        let outcome = link.send(&test_command()).await.unwrap();
        assert_eq!(outcome, SendOutcome::Sent);

        if let Some(response) = link.receive().await.unwrap() {
            println!("Device answered: {}", response);
        } else {
            println!("No response within the read window (this is OK)");
        }

        link.disconnect();
    }
}
