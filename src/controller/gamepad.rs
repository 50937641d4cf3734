//! # Gamepad Source Module
//!
//! gilrs-backed [`InputSource`] implementation.
//!
//! ## Event Handling
//!
//! gilrs delivers input as an event stream rather than a state snapshot, so
//! [`GamepadSource`] keeps a cached [`ControllerState`] and folds every
//! pending event into it on each `poll`. Draining the event queue doubles as
//! the platform event pump: without it, stick values go stale on backends
//! that coalesce events.
//!
//! ## Axis and Button Mapping
//!
//! | gilrs input | State field |
//! |-------------|-------------|
//! | `Axis::LeftStickX` / `LeftStickY` | `left_stick_x` / `left_stick_y` |
//! | `Axis::RightStickX` / `RightStickY` | `right_stick_x` / `right_stick_y` |
//! | `Axis::LeftZ` / `RightZ` | `trigger_l2` / `trigger_r2` (renormalized) |
//! | `Button::LeftTrigger2` / `RightTrigger2` (analog) | `trigger_l2` / `trigger_r2` |
//!
//! Some backends report triggers as axes in [-1, 1], others as analog
//! buttons in [0, 1]; both paths land in the same [0, 1] trigger fields.

use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use tracing::{debug, info, warn};

use super::state::{ControllerState, InputSource};
use crate::error::{BridgeError, Result};

/// Polls a connected gamepad through gilrs.
///
/// The first gamepad seen (at startup or on its first event) becomes the
/// active one; events from other pads are ignored. When the active pad
/// disconnects the cached state is retained, so the control loop keeps
/// receiving the last-known values rather than a sudden zero command.
pub struct GamepadSource {
    gilrs: Gilrs,
    active: Option<GamepadId>,
    state: ControllerState,
}

impl std::fmt::Debug for GamepadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamepadSource")
            .field("active", &self.active)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl GamepadSource {
    /// Initialize the gilrs backend and pick the first connected gamepad.
    ///
    /// Starting with no gamepad connected is not an error; the source stays
    /// idle and adopts the first pad that shows up.
    ///
    /// # Errors
    ///
    /// Returns `Controller` error if the platform input backend cannot be
    /// initialized at all.
    pub fn new() -> Result<Self> {
        let gilrs = Gilrs::new()
            .map_err(|e| BridgeError::Controller(format!("Failed to initialize gilrs: {}", e)))?;

        let mut active = None;
        for (id, gamepad) in gilrs.gamepads() {
            info!("Found gamepad [{}]: {}", id, gamepad.name());
            if active.is_none() {
                active = Some(id);
            }
        }
        if active.is_none() {
            warn!("No gamepad connected, waiting for one to appear");
        }

        Ok(Self {
            gilrs,
            active,
            state: ControllerState::default(),
        })
    }

    fn handle_event(&mut self, id: GamepadId, event: &EventType) {
        match event {
            EventType::Connected => {
                if self.active.is_none() {
                    info!("Gamepad [{}] connected, now active", id);
                    self.active = Some(id);
                }
            }
            EventType::Disconnected => {
                if self.active == Some(id) {
                    // State is retained: last-known values keep flowing.
                    warn!("Active gamepad [{}] disconnected", id);
                    self.active = None;
                }
            }
            _ => {
                if self.active.is_none() {
                    info!("Adopting gamepad [{}] as active", id);
                    self.active = Some(id);
                }
                if self.active == Some(id) {
                    apply_event(&mut self.state, event);
                }
            }
        }
    }
}

impl InputSource for GamepadSource {
    fn poll(&mut self) -> ControllerState {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            debug!("gilrs event from [{}]: {:?}", id, event);
            self.handle_event(id, &event);
        }
        self.state
    }
}

/// Folds one gilrs event into the cached state.
fn apply_event(state: &mut ControllerState, event: &EventType) {
    match event {
        EventType::AxisChanged(axis, value, _) => apply_axis(state, *axis, *value),
        EventType::ButtonChanged(button, value, _) => apply_trigger(state, *button, *value),
        EventType::ButtonPressed(button, _) => apply_button(state, *button, true),
        EventType::ButtonReleased(button, _) => apply_button(state, *button, false),
        _ => {}
    }
}

fn apply_axis(state: &mut ControllerState, axis: Axis, value: f32) {
    match axis {
        Axis::LeftStickX => state.left_stick_x = value,
        Axis::LeftStickY => state.left_stick_y = value,
        Axis::RightStickX => state.right_stick_x = value,
        Axis::RightStickY => state.right_stick_y = value,
        Axis::LeftZ => state.trigger_l2 = trigger_from_axis(value),
        Axis::RightZ => state.trigger_r2 = trigger_from_axis(value),
        // Unmapped axes keep whatever the state already holds.
        _ => {}
    }
}

fn apply_trigger(state: &mut ControllerState, button: Button, value: f32) {
    match button {
        Button::LeftTrigger2 => state.trigger_l2 = value.clamp(0.0, 1.0),
        Button::RightTrigger2 => state.trigger_r2 = value.clamp(0.0, 1.0),
        // Non-trigger analog button values carry no extra information over
        // the pressed/released events.
        _ => {}
    }
}

fn apply_button(state: &mut ControllerState, button: Button, pressed: bool) {
    if let Some(slot) = button_slot(button) {
        state.buttons[slot] = pressed;
    }
}

/// Positional slot of a gilrs button within [`ControllerState::buttons`].
///
/// The order mirrors the PS-style pad layout: face buttons first, then
/// system buttons, stick clicks, shoulder buttons, and the d-pad.
pub fn button_slot(button: Button) -> Option<usize> {
    match button {
        Button::South => Some(0),
        Button::East => Some(1),
        Button::West => Some(2),
        Button::North => Some(3),
        Button::Select => Some(4),
        Button::Mode => Some(5),
        Button::Start => Some(6),
        Button::LeftThumb => Some(7),
        Button::RightThumb => Some(8),
        Button::LeftTrigger => Some(9),
        Button::LeftTrigger2 => Some(10),
        Button::DPadUp => Some(11),
        Button::DPadDown => Some(12),
        Button::DPadLeft => Some(13),
        Button::DPadRight => Some(14),
        Button::RightTrigger => Some(15),
        _ => None,
    }
}

/// Axis-reported triggers arrive in [-1, 1]; the state carries [0, 1].
fn trigger_from_axis(value: f32) -> f32 {
    ((value + 1.0) * 0.5).clamp(0.0, 1.0)
}
