//! # Mechanisms equipment data
//!
//! Demands which are sent to the drive motor and gimbal servo drivers.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Wheel speed demands for the skid steered drive.
///
/// Speeds are percentages of full duty in `[-100, 100]`, positive is forwards. The left speed
/// drives motors 0 and 2, the right speed motors 1 and 3.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MotionCommand {
    pub left_speed: f64,
    pub right_speed: f64,

    /// Time at which the command was produced
    pub timestamp: DateTime<Utc>
}

/// Position of the camera gimbal in degrees.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GimbalState {
    pub pan_angle: f64,
    pub tilt_angle: f64
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Direction a motor is driven in, as required by H-bridge style motor drivers which take a
/// direction and an unsigned duty cycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Stopped
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotionCommand {
    /// A command with both sides stopped.
    pub fn stop(timestamp: DateTime<Utc>) -> Self {
        Self {
            left_speed: 0.0,
            right_speed: 0.0,
            timestamp
        }
    }

    /// True if neither side is being driven.
    pub fn is_stop(&self) -> bool {
        self.left_speed == 0.0 && self.right_speed == 0.0
    }
}

impl Default for MotionCommand {
    fn default() -> Self {
        Self::stop(Utc::now())
    }
}

impl GimbalState {
    pub fn new(pan_angle: f64, tilt_angle: f64) -> Self {
        Self {
            pan_angle,
            tilt_angle
        }
    }
}

impl Direction {
    pub fn from_speed(speed: f64) -> Self {
        if speed > 0.0 {
            Direction::Forward
        }
        else if speed < 0.0 {
            Direction::Backward
        }
        else {
            Direction::Stopped
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_motion_directions() {
        let cmd = MotionCommand {
            left_speed: -42.0,
            right_speed: 42.0,
            timestamp: Utc::now()
        };

        assert!(!cmd.is_stop());
        assert_eq!(Direction::from_speed(cmd.left_speed), Direction::Backward);
        assert_eq!(Direction::from_speed(cmd.right_speed), Direction::Forward);

        let stop = MotionCommand::stop(cmd.timestamp);
        assert!(stop.is_stop());
        assert_eq!(Direction::from_speed(stop.left_speed), Direction::Stopped);
    }
}
