//! # Telecommand processor module
//!
//! The telecommand processor handles TCs coming from any source, passing
//! each to the matching control operation.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};

// Internal
use comms_if::tc::{Tc, TcResponse};
use crate::{data_store::CtrlError, rov_ctrl::RovCtrl};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand, returning the response for the operator.
pub fn exec(ctrl: &RovCtrl, tc: &Tc) -> TcResponse {
    debug!("Executing TC: {:?}", tc);

    // TCs built in code rather than parsed may not have been validated
    if let Err(e) = tc.validate() {
        warn!("Invalid TC: {}", e);

        // Still surface the invalid input through the normal command path
        let res = match tc {
            Tc::Motion(v) => ctrl.apply_motion(*v).map(|_| ()),
            _ => tc.gimbal_cmd().map_or(Ok(()), |g| ctrl.apply_gimbal(g).map(|_| ()))
        };
        return to_response(res)
    }

    let res = match tc {
        Tc::Heartbeat => {
            ctrl.heartbeat();
            Ok(())
        },
        Tc::Motion(v) => ctrl.apply_motion(*v).map(|_| ()),
        Tc::Gimbal { .. } | Tc::GimbalCenter | Tc::GimbalRelease => match tc.gimbal_cmd() {
            Some(g) => ctrl.apply_gimbal(g).map(|_| ()),
            None => Ok(())
        },
        Tc::ToggleSlam { active } => {
            ctrl.apply_toggle_slam(*active);
            Ok(())
        },
        Tc::RecalibrateImu => ctrl.recalibrate_imu(),
        Tc::Connect => {
            ctrl.set_link(true);
            Ok(())
        },
        Tc::Disconnect => {
            ctrl.set_link(false);
            Ok(())
        }
    };

    to_response(res)
}

fn to_response(res: Result<(), CtrlError>) -> TcResponse {
    match res {
        Ok(()) => TcResponse::Ok,
        Err(CtrlError::InvalidInput(e)) => {
            warn!("TC rejected as invalid: {}", e);
            TcResponse::Invalid
        },
        Err(e) => {
            debug!("TC rejected: {}", e);
            TcResponse::Rejected(e.to_string())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tc::JoystickVector;
    use crate::params::RovExecParams;

    #[test]
    fn test_exec() {
        let ctrl = RovCtrl::new(&RovExecParams::default()).unwrap();

        assert_eq!(exec(&ctrl, &Tc::Connect), TcResponse::Ok);
        assert_eq!(exec(&ctrl, &Tc::Heartbeat), TcResponse::Ok);
        assert_eq!(exec(&ctrl, &Tc::Gimbal { pan: -1.0, tilt: 1.0 }), TcResponse::Ok);
        assert_eq!(ctrl.current_gimbal().pan_angle, 78.0);
        assert_eq!(exec(&ctrl, &Tc::GimbalRelease), TcResponse::Ok);
        assert_eq!(ctrl.current_gimbal().pan_angle, 80.0);

        assert_eq!(exec(&ctrl, &Tc::ToggleSlam { active: true }), TcResponse::Ok);
        assert!(ctrl.slam_active());

        // Not calibrated yet
        assert!(matches!(
            exec(&ctrl, &Tc::Motion(JoystickVector::new(0.0, 1.0))),
            TcResponse::Rejected(_)
        ));
        assert!(matches!(exec(&ctrl, &Tc::RecalibrateImu), TcResponse::Rejected(_)));

        assert_eq!(
            exec(&ctrl, &Tc::Motion(JoystickVector::new(f64::INFINITY, 1.0))),
            TcResponse::Invalid
        );
        assert_eq!(
            exec(&ctrl, &Tc::Gimbal { pan: f64::NAN, tilt: 0.0 }),
            TcResponse::Invalid
        );

        assert_eq!(exec(&ctrl, &Tc::Disconnect), TcResponse::Ok);
        assert!(!ctrl.snapshot().status.connected);
    }
}
