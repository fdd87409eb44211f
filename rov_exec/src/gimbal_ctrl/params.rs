//! Parameters structure for GimbalCtrl

use serde::Deserialize;

/// Parameters for gimbal control.
///
/// All angles are in degrees.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Change in angle for a full joystick deflection on one command
    pub gain_deg: f64,

    pub pan_min_deg: f64,
    pub pan_max_deg: f64,
    pub pan_center_deg: f64,

    pub tilt_min_deg: f64,
    pub tilt_max_deg: f64,
    pub tilt_center_deg: f64,

    /// Joystick components with a magnitude below this are treated as zero.
    pub deadzone: f64,

    /// Tilt down for a positive joystick y
    pub invert_tilt: bool
}

impl Default for Params {
    fn default() -> Self {
        Self {
            gain_deg: 2.0,
            pan_min_deg: 35.0,
            pan_max_deg: 125.0,
            pan_center_deg: 80.0,
            tilt_min_deg: 0.0,
            tilt_max_deg: 85.0,
            tilt_center_deg: 40.0,
            deadzone: 0.05,
            invert_tilt: false
        }
    }
}

impl Params {
    pub fn check(&self) -> Result<(), String> {
        if !(self.gain_deg > 0.0) {
            return Err(format!("gain_deg must be positive, found {}", self.gain_deg))
        }
        if !(self.pan_min_deg < self.pan_max_deg) {
            return Err("pan_min_deg must be less than pan_max_deg".into())
        }
        if !(self.tilt_min_deg < self.tilt_max_deg) {
            return Err("tilt_min_deg must be less than tilt_max_deg".into())
        }
        if self.pan_center_deg < self.pan_min_deg || self.pan_center_deg > self.pan_max_deg {
            return Err(format!("pan_center_deg {} is outside the pan range", self.pan_center_deg))
        }
        if self.tilt_center_deg < self.tilt_min_deg || self.tilt_center_deg > self.tilt_max_deg {
            return Err(format!(
                "tilt_center_deg {} is outside the tilt range", self.tilt_center_deg
            ))
        }
        if !(self.deadzone >= 0.0 && self.deadzone < 1.0) {
            return Err(format!("deadzone must be in [0, 1), found {}", self.deadzone))
        }

        Ok(())
    }
}
