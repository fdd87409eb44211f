//! Implementations for the LocoCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use chrono::{DateTime, Utc};
use log::{trace, warn};
use serde::Serialize;

// Internal
use super::{calc_skid_steer, LocoCtrlError, Params};
use comms_if::{eqpt::mech::MotionCommand, tc::JoystickVector};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Locomotion control module state
#[derive(Default)]
pub struct LocoCtrl {
    pub(crate) params: Params,
}

/// Input data to Locomotion Control.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// The demanded joystick deflection
    pub vector: JoystickVector,

    /// Time at which the demand was received
    pub timestamp: DateTime<Utc>
}

/// Status report for LocoCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct StatusReport {
    /// The input was outside `[-1, 1]` and has been limited
    pub input_limited: bool,
    pub left_speed_limited: bool,
    pub right_speed_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for LocoCtrl {
    type InitData = Params;
    type InitError = LocoCtrlError;

    type InputData = InputData;
    type OutputData = MotionCommand;
    type StatusReport = StatusReport;
    type ProcError = LocoCtrlError;

    /// Initialise the LocoCtrl module with its parameters.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        init_data.check().map_err(LocoCtrlError::InvalidParams)?;

        self.params = init_data;

        Ok(())
    }

    /// Calculate the motion command for a new joystick demand.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let (output, report) = self.map(input_data.vector, input_data.timestamp)?;

        trace!(
            "LocoCtrl output: left {:.1}, right {:.1}",
            output.left_speed,
            output.right_speed
        );

        if report.left_speed_limited || report.right_speed_limited {
            warn!("LocoCtrl wheel speed limited: {:?}", report);
        }

        Ok((output, report))
    }
}

impl LocoCtrl {
    /// Map a joystick vector to a motion command without changing any state.
    pub fn map(&self, vector: JoystickVector, timestamp: DateTime<Utc>)
        -> Result<(MotionCommand, StatusReport), LocoCtrlError>
    {
        if !vector.is_finite() {
            return Err(LocoCtrlError::NonFiniteInput(vector))
        }

        let (left_speed, right_speed, report) = calc_skid_steer(&self.params, vector);

        Ok((
            MotionCommand {
                left_speed,
                right_speed,
                timestamp
            },
            report
        ))
    }

    /// Stop the rover.
    ///
    /// Runs a zero vector through the normal processing so a forced stop looks
    /// the same as a commanded one.
    pub fn make_safe(&mut self, timestamp: DateTime<Utc>) -> MotionCommand {
        match self.proc(&InputData {
            vector: JoystickVector::ZERO,
            timestamp
        }) {
            Ok((o, _)) => o,
            // The zero vector is always finite, but stop regardless
            Err(_) => MotionCommand::stop(timestamp)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_proc_and_make_safe() {
        let mut lc = LocoCtrl::default();
        lc.init(Params::default()).unwrap();

        let now = Utc::now();

        let (o, r) = lc.proc(&InputData {
            vector: JoystickVector::new(0.0, 1.0),
            timestamp: now
        }).unwrap();

        assert_eq!((o.left_speed, o.right_speed), (60.0, 60.0));
        assert_eq!(o.timestamp, now);
        assert_eq!(r, StatusReport::default());

        let stop = lc.make_safe(now);
        assert!(stop.is_stop());
        assert_eq!(stop.timestamp, now);
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut lc = LocoCtrl::default();
        lc.init(Params::default()).unwrap();

        let res = lc.proc(&InputData {
            vector: JoystickVector::new(f64::NAN, 0.5),
            timestamp: Utc::now()
        });

        assert!(matches!(res, Err(LocoCtrlError::NonFiniteInput(_))));
    }

    #[test]
    fn test_invalid_params() {
        let mut lc = LocoCtrl::default();

        assert!(lc.init(Params { turn_factor: 1.5, ..Default::default() }).is_err());
        assert!(lc.init(Params { max_speed: 0.0, ..Default::default() }).is_err());
    }
}
