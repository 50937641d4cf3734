//! # Thruster Mapping Module
//!
//! Maps gamepad state to per-thruster integer power commands.
//!
//! ## Thruster Assignments
//!
//! | Channel | Input | Function |
//! |---------|-------|----------|
//! | left_thrust_power | R2 trigger + Left Stick X | Port horizontal thruster |
//! | right_thrust_power | R2 trigger + Left Stick X | Starboard horizontal thruster |
//! | z_thrust_power | Right Stick Y | Vertical thruster |
//!
//! ## Steering Model
//!
//! The R2 trigger commands total horizontal power; left stick X splits it
//! between the two sides:
//!
//! ```text
//! left  = trunc(r2 * scaling * min(1, 1 - x) + zero_shift)
//! right = trunc(r2 * scaling * min(1, 1 + x) + zero_shift)
//! z     = trunc(y * z_scaling + z_zero_shift)
//! ```
//!
//! The `min(1, ...)` upper clamp caps differential steering so neither side
//! ever exceeds the trigger-commanded maximum. There is deliberately no
//! lower clamp: the trigger range [0, 1] already bounds the low side.
//! Truncation (toward zero) is applied to the whole expression, after the
//! zero-shift is added.

use serde::{Deserialize, Serialize};

use crate::controller::ControllerState;

/// Power command for the three thrusters.
///
/// Field names are the wire keys: the struct serializes directly to the
/// device's JSON frame, in declaration order. A transient message with no
/// identity of its own.
///
/// # Examples
///
/// ```
/// use rov_bridge::thruster::ThrustCommand;
///
/// let command = ThrustCommand { left_thrust_power: 3300, right_thrust_power: 3300, z_thrust_power: 5200 };
/// let json = serde_json::to_string(&command).unwrap();
/// assert!(json.starts_with("{\"left_thrust_power\":3300"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThrustCommand {
    pub left_thrust_power: i32,
    pub right_thrust_power: i32,
    pub z_thrust_power: i32,
}

/// Scale and zero-shift configuration for the thruster channels.
///
/// `zero_shift` is the command value for a neutral actuator; `scaling`
/// converts normalized axis deflection into command units. The horizontal
/// pair shares one (scaling, zero_shift), the vertical thruster has its
/// own. When both `power_min` and `power_max` are set, every channel is
/// clamped into that range after truncation.
///
/// Mutated only by explicit operator action through the host's watch
/// channel, never by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ThrustProfile {
    #[serde(default = "default_scaling")]
    pub scaling: f32,

    #[serde(default = "default_zero_shift")]
    pub zero_shift: i32,

    #[serde(default = "default_z_scaling")]
    pub z_scaling: f32,

    #[serde(default = "default_z_zero_shift")]
    pub z_zero_shift: i32,

    #[serde(default)]
    pub power_min: Option<i32>,

    #[serde(default)]
    pub power_max: Option<i32>,
}

// Default value functions (the device's factory calibration)
fn default_scaling() -> f32 { 1000.0 }
fn default_zero_shift() -> i32 { 3300 }
fn default_z_scaling() -> f32 { 1000.0 }
fn default_z_zero_shift() -> i32 { 5200 }

impl Default for ThrustProfile {
    fn default() -> Self {
        Self {
            scaling: default_scaling(),
            zero_shift: default_zero_shift(),
            z_scaling: default_z_scaling(),
            z_zero_shift: default_z_zero_shift(),
            power_min: None,
            power_max: None,
        }
    }
}

impl ThrustProfile {
    fn clamp_power(&self, value: i32) -> i32 {
        let value = match self.power_min {
            Some(min) => value.max(min),
            None => value,
        };
        match self.power_max {
            Some(max) => value.min(max),
            None => value,
        }
    }
}

/// Maps a controller snapshot to a thruster command.
///
/// Pure and deterministic: no I/O, no internal state, identical inputs
/// always yield identical outputs.
///
/// # Examples
///
/// ```
/// use rov_bridge::controller::ControllerState;
/// use rov_bridge::thruster::{map_thrust, ThrustProfile};
///
/// let mut state = ControllerState::default();
/// state.trigger_r2 = 1.0;
///
/// let command = map_thrust(&state, &ThrustProfile::default());
/// assert_eq!(command.left_thrust_power, 4300);
/// assert_eq!(command.right_thrust_power, 4300);
/// ```
#[must_use]
pub fn map_thrust(state: &ControllerState, profile: &ThrustProfile) -> ThrustCommand {
    let throttle = state.trigger_r2;

    let left = throttle * profile.scaling * (1.0 - state.left_stick_x).min(1.0)
        + profile.zero_shift as f32;
    let right = throttle * profile.scaling * (1.0 + state.left_stick_x).min(1.0)
        + profile.zero_shift as f32;
    let z = state.right_stick_y * profile.z_scaling + profile.z_zero_shift as f32;

    ThrustCommand {
        left_thrust_power: profile.clamp_power(left as i32),
        right_thrust_power: profile.clamp_power(right as i32),
        z_thrust_power: profile.clamp_power(z as i32),
    }
}
