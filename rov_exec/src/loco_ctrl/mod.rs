//! Locomotion control module
//!
//! Converts joystick deflections into skid steer wheel speed demands.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;
mod calc_skid_steer;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;
pub use calc_skid_steer::calc_skid_steer;

use comms_if::tc::JoystickVector;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LocoCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LocoCtrlError {
    #[error("Recieved a joystick vector with a non-finite component: {0:?}")]
    NonFiniteInput(JoystickVector),

    #[error("Invalid LocoCtrl parameters: {0}")]
    InvalidParams(String),
}
