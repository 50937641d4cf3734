//! # Controller Module
//!
//! Gamepad input handling.
//!
//! This module handles:
//! - Gamepad detection and hotplug via gilrs
//! - Pumping the platform input-event backlog
//! - Folding events into a cached [`ControllerState`]
//! - The [`InputSource`] seam the control loop polls each tick

pub mod gamepad;
pub mod state;

pub use gamepad::GamepadSource;
pub use state::{ControllerState, InputSource, NUM_AXES, NUM_BUTTONS};
