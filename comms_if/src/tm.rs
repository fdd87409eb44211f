//! # Telemetry module
//!
//! Defines the snapshot of the rover's state which is published to the operator.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::eqpt::{
    imu::ImuReading,
    mech::{GimbalState, MotionCommand},
    slam::EulerAngles
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A self-consistent copy of the rover's state taken at one point in time.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TelemetrySnapshot {
    /// Sequence number, incremented on every publication
    pub seq: u64,

    pub timestamp: DateTime<Utc>,

    pub imu: ImuTm,

    pub pose: PoseTm,

    /// Motion command currently being applied to the wheels
    pub motion: MotionCommand,

    pub gimbal: GimbalState,

    pub status: StatusTm
}

/// IMU section of the telemetry.
///
/// Until the first calibration completes no reading exists, in which case all values are zero and
/// `valid` is false.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImuTm {
    pub valid: bool,
    pub accel_g: Vector3<f64>,
    pub gyro_degs: Vector3<f64>,
    pub temp_c: Option<f64>,
    pub roll_deg: f64,
    pub pitch_deg: f64,

    /// Time since the reading was produced
    pub age_s: Option<f64>
}

/// Pose section of the telemetry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PoseTm {
    pub position_m: Vector3<f64>,
    pub orientation: EulerAngles,

    /// Time since the pose was received, `None` if no pose has ever been received
    pub age_s: Option<f64>,

    /// Number of poses received so far
    pub update_seq: u64,

    /// True if a new pose has arrived since the previous publication
    pub fresh: bool,

    /// True if SLAM is active but no pose has arrived within the staleness threshold
    pub stale: bool
}

/// Status section of the telemetry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatusTm {
    pub connected: bool,
    pub camera_active: bool,
    pub imu_calibrated: bool,

    /// Calibration completed on timeout with fewer samples than required
    pub imu_degraded: bool,

    pub slam_active: bool,
    pub watchdog_tripped: bool,

    /// The most recent motion command was rejected
    pub motion_rejected: bool,

    pub cpu_usage_pct: Option<f64>,
    pub mem_usage_pct: Option<f64>,
    pub battery_pct: Option<f64>,

    /// All currently active faults
    pub faults: Vec<Fault>
}

/// Resource usage of the host, as reported by the host monitor.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct HostMetrics {
    pub cpu_usage_pct: Option<f64>,
    pub mem_usage_pct: Option<f64>,
    pub battery_pct: Option<f64>
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Non-fatal faults which are reported through telemetry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// A command was out of range or malformed
    InvalidInput,

    /// Motion was requested before IMU calibration completed
    NotCalibrated,

    /// IMU calibration completed with fewer samples than required
    CalibrationDegraded,

    /// No pose update within the expected window
    StaleUpstream,

    /// The watchdog has stopped the rover
    ConnectionLost
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ImuTm {
    /// Build the IMU telemetry from the latest reading, if any.
    pub fn from_reading(reading: Option<&ImuReading>, age_s: Option<f64>) -> Self {
        match reading {
            Some(r) => Self {
                valid: true,
                accel_g: r.accel_g,
                gyro_degs: r.gyro_degs,
                temp_c: r.temp_c,
                roll_deg: r.roll_deg,
                pitch_deg: r.pitch_deg,
                age_s
            },
            None => Self {
                valid: false,
                accel_g: Vector3::zeros(),
                gyro_degs: Vector3::zeros(),
                temp_c: None,
                roll_deg: 0.0,
                pitch_deg: 0.0,
                age_s: None
            }
        }
    }
}

impl TelemetrySnapshot {
    /// Serialise the snapshot to JSON for publication.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
