//! # Rover library.
//!
//! The real-time control core of the rover. Joystick commands are mapped to
//! wheel and gimbal demands, IMU samples are calibrated and filtered, poses
//! from SLAM are stored, and all of it is published as telemetry, with a
//! watchdog stopping the rover if the operator goes quiet.
//!
//! All state lives in a [`data_store::DataStore`] reached only through the
//! [`rov_ctrl::RovCtrl`] handle.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data store - all mutable state of the control core
pub mod data_store;

/// Equipment interfaces - traits implemented by the drivers and other collaborators
pub mod eqpt;

/// Gimbal control module - converts joystick deflections into gimbal angles
pub mod gimbal_ctrl;

/// IMU calibration module - finds and removes the IMU biases
pub mod imu_cal;

/// Locomotion control module - converts joystick deflections into wheel speeds
pub mod loco_ctrl;

/// Executable parameters
pub mod params;

/// Rover control - the handle through which all state is accessed
pub mod rov_ctrl;

/// Simulation client - simulated equipment for running without hardware
pub mod sim_client;

/// Periodic tasks - runs each cadence of the control core on its own thread
pub mod tasks;

/// Telecommand processor - dispatches TCs to the control operations
pub mod tc_processor;

/// Telemetry aggregator - builds the snapshots published to the operator
pub mod tm_aggregator;

/// Safety watchdog - stops the rover when commands stop arriving
pub mod watchdog;
