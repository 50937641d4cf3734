//! # ROV Bridge Library
//!
//! Drive a multi-thruster ROV with a gamepad over a serial link.
//!
//! This library provides the core functionality for reading gamepad state,
//! mapping it to per-thruster power commands, and exchanging those commands
//! with the device as newline-delimited JSON frames, while publishing live
//! state to an external observer through an ordered channel.

pub mod bridge;
pub mod config;
pub mod controller;
pub mod error;
pub mod link;
pub mod thruster;
