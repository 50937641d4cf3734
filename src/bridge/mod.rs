//! # Bridge Module
//!
//! The control loop and its channels.
//!
//! This module handles:
//! - Ticking the acquisition/mapping/transmission loop at a fixed period
//! - Publishing controller snapshots and device responses to the consumer
//! - Applying externally requested link connects/disconnects
//! - Cooperative shutdown through a single [`CancellationToken`]
//!
//! ## Concurrency Model
//!
//! Exactly two units run concurrently: the spawned loop task and the
//! consumer (a display layer, a logger, a test). The serial link and the
//! input source are owned by the loop task; the only shared data is the
//! state channel, which carries complete immutable messages. Per tick,
//! `send` precedes `receive`, and a `DeviceEcho` is always published before
//! that tick's `JoystickUpdate`.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::controller::{ControllerState, InputSource};
use crate::link::DeviceLink;
use crate::thruster::{map_thrust, ThrustProfile};

/// Message published to the consumer each tick
#[derive(Debug, Clone, PartialEq)]
pub enum StateMessage {
    /// Fresh controller snapshot. Published every tick, link up or down.
    JoystickUpdate(ControllerState),
    /// Response line from the device. Published only when one arrived.
    DeviceEcho(String),
}

/// Link lifecycle request, applied by the loop at the top of its next tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCommand {
    Connect,
    Disconnect,
}

/// Consumer end of the state channel.
///
/// FIFO, unbounded. The intended consumer polls faster than the loop
/// produces, so depth stays small; a consumer that never polls lets
/// messages accumulate without limit.
pub struct StateReceiver {
    rx: mpsc::UnboundedReceiver<StateMessage>,
}

impl StateReceiver {
    /// Take every currently queued message, oldest first. Never blocks;
    /// an empty result just means nothing happened since the last poll.
    pub fn drain(&mut self) -> Vec<StateMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    /// Await the next message. Returns `None` once the loop has stopped
    /// and the queue is empty.
    pub async fn recv(&mut self) -> Option<StateMessage> {
        self.rx.recv().await
    }
}

/// Handle to a running bridge.
///
/// Dropping the handle does not stop the loop; call [`stop`](Self::stop)
/// and then [`join`](Self::join).
pub struct BridgeHandle {
    task: JoinHandle<()>,
    shutdown: CancellationToken,
    link_commands: mpsc::UnboundedSender<LinkCommand>,
}

impl BridgeHandle {
    /// Ask the loop to open the serial link at the top of its next tick
    pub fn request_connect(&self) {
        let _ = self.link_commands.send(LinkCommand::Connect);
    }

    /// Ask the loop to close the serial link at the top of its next tick
    pub fn request_disconnect(&self) {
        let _ = self.link_commands.send(LinkCommand::Disconnect);
    }

    /// Signal shutdown. Idempotent; the loop observes it at its next
    /// iteration boundary, so exit takes at most one tick period.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Wait for the loop task to finish
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!("Control loop task failed: {}", e);
        }
    }
}

/// Spawn the control loop as a background task.
///
/// The loop starts with the link in whatever state `link` is in (normally
/// Disconnected; use [`BridgeHandle::request_connect`]). The current
/// `ThrustProfile` is read from `profile_rx` every tick, so profile edits
/// take effect without a restart.
///
/// Must be called from within a tokio runtime.
///
/// # Examples
///
/// ```no_run
/// use rov_bridge::bridge;
/// use rov_bridge::config::Config;
/// use rov_bridge::controller::GamepadSource;
/// use rov_bridge::link::DeviceLink;
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let config = Config::default();
/// let source = GamepadSource::new()?;
/// let link = DeviceLink::new(config.serial.clone());
/// let (_profile_tx, profile_rx) = tokio::sync::watch::channel(config.thrusters);
///
/// let (handle, mut updates) = bridge::spawn(source, link, profile_rx, config.control.tick());
/// handle.request_connect();
/// # handle.stop();
/// # handle.join().await;
/// # Ok(())
/// # }
/// ```
pub fn spawn<S>(
    source: S,
    link: DeviceLink,
    profile_rx: watch::Receiver<ThrustProfile>,
    tick: Duration,
) -> (BridgeHandle, StateReceiver)
where
    S: InputSource + 'static,
{
    let shutdown = CancellationToken::new();
    let (updates_tx, updates_rx) = mpsc::unbounded_channel();
    let (link_tx, link_rx) = mpsc::unbounded_channel();

    let control = ControlLoop {
        source,
        link,
        profile_rx,
        tick,
        updates: updates_tx,
        link_commands: link_rx,
        shutdown: shutdown.clone(),
    };
    let task = tokio::spawn(control.run());

    (
        BridgeHandle {
            task,
            shutdown,
            link_commands: link_tx,
        },
        StateReceiver { rx: updates_rx },
    )
}

struct ControlLoop<S: InputSource> {
    source: S,
    link: DeviceLink,
    profile_rx: watch::Receiver<ThrustProfile>,
    tick: Duration,
    updates: mpsc::UnboundedSender<StateMessage>,
    link_commands: mpsc::UnboundedReceiver<LinkCommand>,
    shutdown: CancellationToken,
}

impl<S: InputSource> ControlLoop<S> {
    /// One iteration: stop-check, pending link requests, poll, map,
    /// send/receive when connected, publish, throttle. No step's failure
    /// ends the loop; only the stop signal does.
    async fn run(mut self) {
        info!("Control loop started (tick {:?})", self.tick);

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            while let Ok(command) = self.link_commands.try_recv() {
                match command {
                    LinkCommand::Connect => {
                        if let Err(e) = self.link.connect() {
                            warn!("Connect failed: {}", e);
                        }
                    }
                    LinkCommand::Disconnect => self.link.disconnect(),
                }
            }

            let state = self.source.poll();
            let profile = *self.profile_rx.borrow();
            let command = map_thrust(&state, &profile);

            if self.link.is_connected() {
                if let Err(e) = self.link.send(&command).await {
                    warn!("Dropping command, {}", e);
                }
                match self.link.receive().await {
                    Ok(Some(response)) => {
                        let _ = self.updates.send(StateMessage::DeviceEcho(response));
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Response read failed: {}", e),
                }
            }

            let _ = self.updates.send(StateMessage::JoystickUpdate(state));

            sleep(self.tick).await;
        }

        // Input backend resources go first, then the link.
        drop(self.source);
        self.link.disconnect();
        info!("Control loop stopped");
    }
}
