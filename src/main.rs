//! # ROV Bridge
//!
//! Drive a multi-thruster ROV with a gamepad over a serial link.
//!
//! The binary is a headless host for the bridge: it wires a gilrs gamepad
//! source and the serial device link into the control loop, then drains the
//! state channel on a 50 ms cadence, logging device responses. A display
//! layer would consume the same channel instead.

use std::path::Path;

use anyhow::Result;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

use rov_bridge::bridge::{self, StateMessage};
use rov_bridge::config::Config;
use rov_bridge::controller::GamepadSource;
use rov_bridge::link::DeviceLink;

/// How often the consumer side drains the state channel
const DRAIN_INTERVAL_MS: u64 = 50;

/// Main entry point for the ROV Bridge application
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (first CLI argument, or `config/default.toml`)
///    - Initialize the gamepad source and the serial link
///    - Spawn the control loop and request the initial connect
///
/// 2. **Consumer Loop**
///    - Drain the state channel every 50 ms
///    - Log device responses; trace joystick snapshots
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Signal the stop token
///    - Wait for the control loop to disconnect the link and exit
///
/// # Errors
///
/// Returns error if:
/// - The configuration file exists but is invalid
/// - The platform input backend cannot be initialized
///
/// A missing device or gamepad is not fatal: the loop runs in monitoring
/// mode until one appears or a reconnect is requested.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("ROV Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/default.toml".to_string());
    let config = if Path::new(&config_path).exists() {
        info!("Loading configuration from {}", config_path);
        Config::load(&config_path)?
    } else {
        info!("No configuration file at {}, using defaults", config_path);
        Config::default()
    };

    let source = GamepadSource::new()?;
    let link = DeviceLink::new(config.serial.clone());

    // The profile sender is the seam a config UI would hold; edits are
    // picked up by the loop on its next tick.
    let (profile_tx, profile_rx) = tokio::sync::watch::channel(config.thrusters);

    let (handle, mut updates) = bridge::spawn(source, link, profile_rx, config.control.tick());
    handle.request_connect();

    info!("Control loop running; press Ctrl+C to exit");

    let mut drain_interval = interval(Duration::from_millis(DRAIN_INTERVAL_MS));

    loop {
        tokio::select! {
            _ = drain_interval.tick() => {
                for message in updates.drain() {
                    match message {
                        StateMessage::DeviceEcho(line) => info!("Device: {}", line),
                        StateMessage::JoystickUpdate(state) => {
                            debug!("Joystick: axes {:?}", state.axes());
                        }
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    handle.stop();
    handle.join().await;
    drop(profile_tx);

    Ok(())
}
