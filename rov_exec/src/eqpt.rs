//! # Equipment interfaces
//!
//! Traits for the collaborators which sit around the control core. The hardware drivers, SLAM
//! engine and telemetry transport implement these, the periodic tasks call them.
//!
//! All calls are treated as best effort. A failing call is logged and the task carries on with
//! its next tick.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use thiserror::Error;

use comms_if::{
    eqpt::{imu::RawImuSample, mech::MotionCommand, slam::PoseEstimate},
    tm::{HostMetrics, TelemetrySnapshot}
};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum EqptError {
    #[error("The equipment is not available: {0}")]
    NotAvailable(String),

    #[error("No new data from the equipment")]
    NoData,

    #[error("Equipment IO error: {0}")]
    IoError(std::io::Error),

    #[error("Could not serialize the data: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Source of raw six axis IMU samples.
pub trait ImuDriver: Send {
    fn read(&mut self) -> Result<RawImuSample, EqptError>;
}

/// Drive motors and gimbal servos.
pub trait ActuatorDriver: Send {
    /// Set the left and right wheel speeds in percent, `[-100, 100]`.
    fn set_wheel_speeds(&mut self, left: f64, right: f64) -> Result<(), EqptError>;

    /// Set the gimbal servo angles in degrees.
    fn set_servo_angles(&mut self, pan: f64, tilt: f64) -> Result<(), EqptError>;
}

/// Pose estimates from the SLAM engine.
pub trait SlamSource: Send {
    /// Get a new pose if one is available.
    ///
    /// The motion currently being applied is provided for sources which need
    /// it, such as odometry.
    fn poll(&mut self, motion: &MotionCommand) -> Result<Option<PoseEstimate>, EqptError>;

    /// Called when SLAM is switched on or off.
    fn set_active(&mut self, _active: bool) {}
}

/// Outbound telemetry transport.
pub trait TmSink: Send {
    fn publish(&mut self, tm: &TelemetrySnapshot) -> Result<(), EqptError>;
}

/// Status of the video pipeline.
pub trait CameraMonitor: Send {
    fn is_active(&mut self) -> bool;
}

/// Resource usage of the host.
pub trait HostMonitor: Send {
    fn sample(&mut self) -> HostMetrics;
}
