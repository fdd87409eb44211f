//! # Communications interface crate.
//!
//! Provides the data exchanged between the control core and the collaborators around it: the
//! telecommands which arrive from the transport, the equipment data flowing to and from the
//! hardware drivers and SLAM engine, and the telemetry published back out.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod tc;

/// Data definitions for equipment (drive motors, gimbal, IMU, SLAM)
pub mod eqpt;

pub mod tm;
