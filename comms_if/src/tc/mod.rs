//! # Telecommand module
//!
//! This module provides the telecommands which the transport delivers to the control core. A TC
//! is a small JSON object identified by its `"type"` field, for example:
//!
//! ```json
//! {"type": "motion", "x": 0.0, "y": 1.0}
//! {"type": "gimbal", "pan": -0.5, "tilt": 0.2}
//! {"type": "toggle_slam", "active": true}
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Serialize, Deserialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A 2D joystick deflection, nominally in the range `[-1, 1]` on both axes.
///
/// `x` is positive to the right, `y` is positive forwards (or up for the
/// gimbal).
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JoystickVector {
    pub x: f64,
    pub y: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the rover by the operator (or
/// a notification about the link raised by the transport).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tc {
    /// Keep-alive from the operator, refreshes link liveness only
    Heartbeat,

    /// Drive the rover with the given joystick deflection
    Motion(JoystickVector),

    /// Move the gimbal with a joystick deflection, `pan` along x and `tilt`
    /// along y
    Gimbal {
        pan: f64,
        tilt: f64
    },

    /// Return the gimbal to its centre position
    GimbalCenter,

    /// The gimbal joystick has been released
    GimbalRelease,

    /// Start or stop the SLAM engine
    ToggleSlam {
        active: bool
    },

    /// Recalibrate the IMU, the rover must be stationary
    RecalibrateImu,

    /// The transport has established a link to the operator
    Connect,

    /// The transport has lost the link to the operator
    Disconnect
}

/// A command for the gimbal.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GimbalCmd {
    /// Move by a proportional amount
    Move(JoystickVector),

    /// Centre the gimbal
    Center,

    /// Joystick released, which also centres the gimbal
    Release
}

/// The response to the execution of a TC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TcResponse {
    /// The TC was accepted and executed
    Ok,

    /// The TC was valid but could not be executed in the current state
    Rejected(String),

    /// The TC was malformed and has been ignored
    Invalid
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC field {0} is not a finite number")]
    NonFiniteValue(&'static str)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JoystickVector {
    /// The vector with no deflection.
    pub const ZERO: JoystickVector = JoystickVector { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True if both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// True if both components lie within `[-1, 1]`.
    pub fn is_in_range(&self) -> bool {
        self.x.abs() <= 1.0 && self.y.abs() <= 1.0
    }

    /// Return a copy with both components limited to `[-1, 1]`.
    pub fn clamped(&self) -> Self {
        Self {
            x: self.x.max(-1.0).min(1.0),
            y: self.y.max(-1.0).min(1.0)
        }
    }
}

impl Tc {

    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        let tc: Tc = serde_json::from_str(json_str)
            .map_err(TcParseError::InvalidJson)?;

        tc.validate()?;

        Ok(tc)
    }

    /// Serialise the TC into its JSON representation
    pub fn to_json(&self) -> Result<String, TcParseError> {
        serde_json::to_string(self).map_err(TcParseError::InvalidJson)
    }

    /// Check that all numeric fields of the TC are finite.
    pub fn validate(&self) -> Result<(), TcParseError> {
        match self {
            Tc::Motion(v) => {
                if !v.x.is_finite() {
                    return Err(TcParseError::NonFiniteValue("x"))
                }
                if !v.y.is_finite() {
                    return Err(TcParseError::NonFiniteValue("y"))
                }
            },
            Tc::Gimbal { pan, tilt } => {
                if !pan.is_finite() {
                    return Err(TcParseError::NonFiniteValue("pan"))
                }
                if !tilt.is_finite() {
                    return Err(TcParseError::NonFiniteValue("tilt"))
                }
            },
            _ => ()
        }

        Ok(())
    }

    /// Get the gimbal command carried by this TC, if it is a gimbal TC.
    pub fn gimbal_cmd(&self) -> Option<GimbalCmd> {
        match self {
            Tc::Gimbal { pan, tilt } => Some(GimbalCmd::Move(JoystickVector::new(*pan, *tilt))),
            Tc::GimbalCenter => Some(GimbalCmd::Center),
            Tc::GimbalRelease => Some(GimbalCmd::Release),
            _ => None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tc_from_json() {
        assert_eq!(
            Tc::from_json(r#"{"type": "motion", "x": 0.25, "y": -1.0}"#).unwrap(),
            Tc::Motion(JoystickVector::new(0.25, -1.0))
        );
        assert_eq!(
            Tc::from_json(r#"{"type": "gimbal", "pan": 1.0, "tilt": 0.5}"#).unwrap(),
            Tc::Gimbal { pan: 1.0, tilt: 0.5 }
        );
        assert_eq!(
            Tc::from_json(r#"{"type": "toggle_slam", "active": true}"#).unwrap(),
            Tc::ToggleSlam { active: true }
        );
        assert_eq!(
            Tc::from_json(r#"{"type": "gimbal_center"}"#).unwrap(),
            Tc::GimbalCenter
        );
        assert_eq!(
            Tc::from_json(r#"{"type": "recalibrate_imu"}"#).unwrap(),
            Tc::RecalibrateImu
        );

        assert!(Tc::from_json(r#"{"type": "motion", "x": 0.25}"#).is_err());
        assert!(Tc::from_json(r#"{"type": "self_destruct"}"#).is_err());
        assert!(Tc::from_json("not json").is_err());
    }

    #[test]
    fn test_tc_validate() {
        assert!(matches!(
            Tc::Motion(JoystickVector::new(f64::NAN, 0.0)).validate(),
            Err(TcParseError::NonFiniteValue("x"))
        ));
        assert!(matches!(
            Tc::Gimbal { pan: 0.0, tilt: f64::INFINITY }.validate(),
            Err(TcParseError::NonFiniteValue("tilt"))
        ));
        assert!(Tc::Heartbeat.validate().is_ok());
    }

    #[test]
    fn test_gimbal_cmd() {
        assert_eq!(
            Tc::Gimbal { pan: 0.5, tilt: -0.5 }.gimbal_cmd(),
            Some(GimbalCmd::Move(JoystickVector::new(0.5, -0.5)))
        );
        assert_eq!(Tc::GimbalRelease.gimbal_cmd(), Some(GimbalCmd::Release));
        assert_eq!(Tc::Heartbeat.gimbal_cmd(), None);
    }

    #[test]
    fn test_joystick_vector() {
        let v = JoystickVector::new(1.5, -0.5);

        assert!(v.is_finite());
        assert!(!v.is_in_range());
        assert_eq!(v.clamped(), JoystickVector::new(1.0, -0.5));
        assert!(v.clamped().is_in_range());
    }
}
