//! IMU calibration and filtering module
//!
//! On startup the rover must be stationary while a number of raw samples are
//! averaged to find the sensor biases. Once calibrated every raw sample is
//! corrected by subtracting those biases.
//!
//! The module moves through `Uncalibrated -> Calibrating -> Calibrated`.
//! Calibration completes when enough samples have been collected, or when the
//! calibration timeout elapses, in which case it completes with whatever was
//! collected and is marked as degraded.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod filter;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use filter::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ImuCalError {
    #[error("Calibration is already in progress")]
    AlreadyCalibrating,

    #[error("Recieved a raw IMU sample with non-finite values")]
    NonFiniteSample,

    #[error("Invalid ImuCal parameters: {0}")]
    InvalidParams(String),
}
