//! # Rover Executable Parameters
//!
//! This module provide parameters for the rover executable, loaded from
//! `rov_exec.toml`. Every group may be left out of the file, in which case
//! the defaults are used.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use thiserror::Error;

use crate::{gimbal_ctrl, imu_cal, loco_ctrl, tm_aggregator, watchdog};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Slowest and fastest task rates accepted
///
/// Units: Hz
pub const MIN_RATE_HZ: f64 = 0.01;
pub const MAX_RATE_HZ: f64 = 1000.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RovExecParams {
    pub loco_ctrl: loco_ctrl::Params,

    pub gimbal_ctrl: gimbal_ctrl::Params,

    pub imu_cal: imu_cal::Params,

    pub watchdog: watchdog::Params,

    pub tm: tm_aggregator::Params,

    pub cycle: CycleParams
}

/// Rates of the periodic tasks.
///
/// Units: Hz
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CycleParams {
    pub imu_rate_hz: f64,
    pub tm_rate_hz: f64,
    pub watchdog_rate_hz: f64,
    pub actuator_rate_hz: f64,

    /// Rate at which the SLAM collaborator is polled for new poses
    pub slam_rate_hz: f64
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Invalid {0} parameters: {1}")]
    Invalid(&'static str, String)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CycleParams {
    fn default() -> Self {
        Self {
            imu_rate_hz: 20.0,
            tm_rate_hz: 5.0,
            watchdog_rate_hz: 4.0,
            actuator_rate_hz: 20.0,
            slam_rate_hz: 5.0
        }
    }
}

impl CycleParams {
    fn check(&self) -> Result<(), String> {
        let rates = [
            ("imu_rate_hz", self.imu_rate_hz),
            ("tm_rate_hz", self.tm_rate_hz),
            ("watchdog_rate_hz", self.watchdog_rate_hz),
            ("actuator_rate_hz", self.actuator_rate_hz),
            ("slam_rate_hz", self.slam_rate_hz),
        ];

        for (name, rate) in rates.iter() {
            if !(*rate >= MIN_RATE_HZ && *rate <= MAX_RATE_HZ) {
                return Err(format!(
                    "{} must be in [{}, {}], found {}",
                    name,
                    MIN_RATE_HZ,
                    MAX_RATE_HZ,
                    rate
                ))
            }
        }

        Ok(())
    }
}

impl RovExecParams {
    /// Check that all parameter groups are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        self.loco_ctrl.check().map_err(|e| ParamsError::Invalid("loco_ctrl", e))?;
        self.gimbal_ctrl.check().map_err(|e| ParamsError::Invalid("gimbal_ctrl", e))?;
        self.imu_cal.check().map_err(|e| ParamsError::Invalid("imu_cal", e))?;
        self.watchdog.check().map_err(|e| ParamsError::Invalid("watchdog", e))?;
        self.tm.check().map_err(|e| ParamsError::Invalid("tm", e))?;
        self.cycle.check().map_err(|e| ParamsError::Invalid("cycle", e))?;

        // The watchdog can't react faster than it is checked
        let wd_period_s = 1.0 / self.cycle.watchdog_rate_hz;
        if wd_period_s > self.watchdog.liveness_threshold_s {
            return Err(ParamsError::Invalid(
                "cycle",
                format!(
                    "watchdog period ({:.3} s) is longer than the liveness threshold ({:.3} s)",
                    wd_period_s,
                    self.watchdog.liveness_threshold_s
                )
            ))
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = RovExecParams::default();
        params.are_valid().unwrap();

        assert_eq!(params.loco_ctrl.max_speed, 60.0);
        assert_eq!(params.gimbal_ctrl.pan_center_deg, 80.0);
        assert_eq!(params.imu_cal.num_samples, 50);
        assert_eq!(params.cycle.tm_rate_hz, 5.0);
    }

    #[test]
    fn test_partial_file() {
        let params: RovExecParams = util::params::from_toml_str(
            r#"
            [loco_ctrl]
            max_speed = 40.0

            [watchdog]
            liveness_threshold_s = 3.0
            "#
        ).unwrap();

        assert_eq!(params.loco_ctrl.max_speed, 40.0);
        assert_eq!(params.loco_ctrl.turn_factor, 0.7);
        assert_eq!(params.watchdog.liveness_threshold_s, 3.0);
        assert_eq!(params.gimbal_ctrl.tilt_max_deg, 85.0);
        params.are_valid().unwrap();
    }

    #[test]
    fn test_invalid() {
        let mut params = RovExecParams::default();
        params.gimbal_ctrl.pan_center_deg = 130.0;
        assert!(matches!(params.are_valid(), Err(ParamsError::Invalid("gimbal_ctrl", _))));

        let mut params = RovExecParams::default();
        params.cycle.watchdog_rate_hz = 0.5;
        assert!(matches!(params.are_valid(), Err(ParamsError::Invalid("cycle", _))));

        let mut params = RovExecParams::default();
        params.imu_cal.num_samples = 0;
        assert!(params.are_valid().is_err());
    }

    #[test]
    fn test_durations_are_bounded() {
        let mut params = RovExecParams::default();
        params.imu_cal.timeout_s = 1e20;
        assert!(matches!(params.are_valid(), Err(ParamsError::Invalid("imu_cal", _))));

        let mut params = RovExecParams::default();
        params.watchdog.liveness_threshold_s = 1e20;
        assert!(matches!(params.are_valid(), Err(ParamsError::Invalid("watchdog", _))));

        let mut params = RovExecParams::default();
        params.cycle.tm_rate_hz = 1e-30;
        assert!(matches!(params.are_valid(), Err(ParamsError::Invalid("cycle", _))));

        let mut params = RovExecParams::default();
        params.cycle.imu_rate_hz = f64::INFINITY;
        assert!(matches!(params.are_valid(), Err(ParamsError::Invalid("cycle", _))));

        // At the limits the core still starts
        let mut params = RovExecParams::default();
        params.imu_cal.timeout_s = crate::imu_cal::MAX_TIMEOUT_S;
        params.watchdog.liveness_threshold_s = crate::watchdog::MAX_LIVENESS_THRESHOLD_S;
        params.are_valid().unwrap();
        assert!(crate::rov_ctrl::RovCtrl::new(&params).is_ok());
    }
}
