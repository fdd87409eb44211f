//! Implementations for the GimbalCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace};
use serde::Serialize;

use super::{GimbalCtrlError, Params};
use comms_if::{eqpt::mech::GimbalState, tc::{GimbalCmd, JoystickVector}};
use util::{maths::{apply_deadzone, clamp}, module::State};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gimbal control module state
pub struct GimbalCtrl {
    params: Params,

    /// Current gimbal position
    state: GimbalState
}

#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct StatusReport {
    pub pan_limited: bool,
    pub tilt_limited: bool,

    /// The gimbal was returned to centre
    pub centred: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for GimbalCtrl {
    fn default() -> Self {
        let params = Params::default();
        let state = GimbalState::new(params.pan_center_deg, params.tilt_center_deg);

        Self {
            params,
            state
        }
    }
}

impl State for GimbalCtrl {
    type InitData = Params;
    type InitError = GimbalCtrlError;

    type InputData = GimbalCmd;
    type OutputData = GimbalState;
    type StatusReport = StatusReport;
    type ProcError = GimbalCtrlError;

    /// Initialise with the given parameters, placing the gimbal at centre.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        init_data.check().map_err(GimbalCtrlError::InvalidParams)?;

        self.state = GimbalState::new(init_data.pan_center_deg, init_data.tilt_center_deg);
        self.params = init_data;

        Ok(())
    }

    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let (state, report) = match input_data {
            GimbalCmd::Move(v) => map(&self.params, *v, &self.state)?,
            GimbalCmd::Center | GimbalCmd::Release => {
                debug!("Gimbal centred ({:?})", input_data);
                (
                    GimbalState::new(self.params.pan_center_deg, self.params.tilt_center_deg),
                    StatusReport { centred: true, ..Default::default() }
                )
            }
        };

        trace!("GimbalCtrl output: pan {:.1}, tilt {:.1}", state.pan_angle, state.tilt_angle);

        self.state = state;

        Ok((state, report))
    }
}

impl GimbalCtrl {
    /// The current gimbal position.
    pub fn state(&self) -> GimbalState {
        self.state
    }
}

/// Move the gimbal from `current` by the joystick deflection.
///
/// The result is always inside the configured ranges, demands that would
/// leave them are clamped.
pub fn map(params: &Params, vector: JoystickVector, current: &GimbalState)
    -> Result<(GimbalState, StatusReport), GimbalCtrlError>
{
    if !vector.is_finite() {
        return Err(GimbalCtrlError::NonFiniteInput(vector.x, vector.y))
    }

    let v = vector.clamped();
    let x = apply_deadzone(v.x, params.deadzone);
    let mut y = apply_deadzone(v.y, params.deadzone);
    if params.invert_tilt {
        y = -y;
    }

    let pan = current.pan_angle + x * params.gain_deg;
    let tilt = current.tilt_angle + y * params.gain_deg;

    let pan_lim = clamp(pan, params.pan_min_deg, params.pan_max_deg);
    let tilt_lim = clamp(tilt, params.tilt_min_deg, params.tilt_max_deg);

    Ok((
        GimbalState::new(pan_lim, tilt_lim),
        StatusReport {
            pan_limited: pan_lim != pan,
            tilt_limited: tilt_lim != tilt,
            centred: false
        }
    ))
}
