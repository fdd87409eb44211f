//! # SLAM equipment data
//!
//! Estimates produced by the external SLAM engine. The control core only stores and republishes
//! these, it places no constraints on them beyond the latest estimate replacing the previous one.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Orientation as roll, pitch and yaw in degrees.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub roll_deg: f64,
    pub pitch_deg: f64,
    pub yaw_deg: f64
}

/// Pose of the rover as estimated by SLAM.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PoseEstimate {
    pub timestamp: DateTime<Utc>,

    /// Position in the map frame
    pub position_m: Vector3<f64>,

    pub orientation: EulerAngles,

    /// The map built alongside the pose. Shared rather than copied as the grid can be large, and
    /// never sent out in telemetry.
    #[serde(skip)]
    pub occupancy_grid: Option<Arc<OccupancyGrid>>
}

/// An occupancy grid as produced by the SLAM engine. The contents are not interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    pub width: usize,
    pub height: usize,

    /// Size of one cell
    pub resolution_m: f64,

    /// Row major cells, `-1` for unknown, otherwise occupancy probability in percent
    pub cells: Vec<i8>
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PoseEstimate {
    /// A pose with no map attached.
    pub fn new(timestamp: DateTime<Utc>, position_m: Vector3<f64>, orientation: EulerAngles) -> Self {
        Self {
            timestamp,
            position_m,
            orientation,
            occupancy_grid: None
        }
    }
}

impl OccupancyGrid {
    /// A grid with all cells unknown.
    pub fn unknown(width: usize, height: usize, resolution_m: f64) -> Self {
        Self {
            width,
            height,
            resolution_m,
            cells: vec![-1; width * height]
        }
    }
}
