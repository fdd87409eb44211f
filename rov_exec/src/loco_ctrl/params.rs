//! Parameters structure for LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Locomotion control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    /// Wheel speed demanded for a full forward deflection.
    ///
    /// Units: percent of full duty
    pub max_speed: f64,

    /// Fraction of `max_speed` used for the turning component.
    pub turn_factor: f64,

    /// Joystick components with a magnitude below this are treated as zero.
    pub deadzone: f64,

    /// Wheel speeds are limited to `[-speed_limit, speed_limit]`.
    ///
    /// Units: percent of full duty
    pub speed_limit: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            max_speed: 60.0,
            turn_factor: 0.7,
            deadzone: 0.05,
            speed_limit: 100.0
        }
    }
}

impl Params {
    /// Check the parameters are self-consistent, returning a description of
    /// the first problem found.
    pub fn check(&self) -> Result<(), String> {
        if !(self.max_speed > 0.0) {
            return Err(format!("max_speed must be positive, found {}", self.max_speed))
        }
        if !(self.turn_factor >= 0.0 && self.turn_factor <= 1.0) {
            return Err(format!("turn_factor must be in [0, 1], found {}", self.turn_factor))
        }
        if !(self.deadzone >= 0.0 && self.deadzone < 1.0) {
            return Err(format!("deadzone must be in [0, 1), found {}", self.deadzone))
        }
        if !(self.speed_limit > 0.0 && self.speed_limit <= 100.0) {
            return Err(format!("speed_limit must be in (0, 100], found {}", self.speed_limit))
        }

        Ok(())
    }
}
