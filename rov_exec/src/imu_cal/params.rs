//! Parameters structure for ImuCal

use serde::Deserialize;

/// Longest calibration timeout accepted
///
/// Units: seconds
pub const MAX_TIMEOUT_S: f64 = 3600.0;

/// Parameters for IMU calibration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Number of samples averaged to find the biases
    pub num_samples: usize,

    /// Time allowed for collecting the samples
    ///
    /// Units: seconds
    pub timeout_s: f64,

    /// Acceleration measured by a stationary, level sensor along Z
    ///
    /// Units: g
    pub gravity_g: f64
}

impl Default for Params {
    fn default() -> Self {
        Self {
            num_samples: 50,
            timeout_s: 5.0,
            gravity_g: 1.0
        }
    }
}

impl Params {
    pub fn check(&self) -> Result<(), String> {
        if self.num_samples == 0 {
            return Err("num_samples must be at least 1".into())
        }
        if !(self.timeout_s > 0.0 && self.timeout_s <= MAX_TIMEOUT_S) {
            return Err(format!(
                "timeout_s must be in (0, {}], found {}",
                MAX_TIMEOUT_S,
                self.timeout_s
            ))
        }
        if !self.gravity_g.is_finite() {
            return Err("gravity_g must be finite".into())
        }

        Ok(())
    }
}
