//! Gimbal control module
//!
//! Moves the camera gimbal proportionally to the gimbal joystick. The gimbal
//! holds its position between commands, so each command moves it relative to
//! where it currently is.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GimbalCtrlError {
    #[error("Recieved a gimbal demand with a non-finite component: pan {0}, tilt {1}")]
    NonFiniteInput(f64, f64),

    #[error("Invalid GimbalCtrl parameters: {0}")]
    InvalidParams(String),
}
