//! Skid steer calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::tc::JoystickVector;
use util::maths::{apply_deadzone, clamp};

use super::{Params, StatusReport};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculate the left and right wheel speeds for a joystick deflection.
///
/// Each joystick axis inside the deadzone is zeroed, then
///
/// ```text
/// forward = y * max_speed
/// turning = x * max_speed * turn_factor
/// left    = clamp(forward - turning)
/// right   = clamp(forward + turning)
/// ```
///
/// The vector must be finite. Components outside `[-1, 1]` are limited first
/// and flagged in the report.
pub fn calc_skid_steer(params: &Params, vector: JoystickVector) -> (f64, f64, StatusReport) {
    let mut report = StatusReport::default();

    let limited = vector.clamped();
    report.input_limited = limited != vector;

    let x = apply_deadzone(limited.x, params.deadzone);
    let y = apply_deadzone(limited.y, params.deadzone);

    let forward = y * params.max_speed;
    let turning = x * params.max_speed * params.turn_factor;

    let left = forward - turning;
    let right = forward + turning;

    let left_lim = clamp(left, -params.speed_limit, params.speed_limit);
    let right_lim = clamp(right, -params.speed_limit, params.speed_limit);

    report.left_speed_limited = left_lim != left;
    report.right_speed_limited = right_lim != right;

    // Avoid handing out negative zero to the drivers
    (left_lim + 0.0, right_lim + 0.0, report)
}

#[cfg(test)]
mod test {
    use super::*;

    fn speeds(x: f64, y: f64) -> (f64, f64) {
        let (l, r, _) = calc_skid_steer(&Params::default(), JoystickVector::new(x, y));
        (l, r)
    }

    #[test]
    fn test_straight_and_turn() {
        assert_eq!(speeds(0.0, 1.0), (60.0, 60.0));
        assert_eq!(speeds(0.0, -1.0), (-60.0, -60.0));

        let (l, r) = speeds(1.0, 0.0);
        assert!((l + 42.0).abs() < 1e-9);
        assert!((r - 42.0).abs() < 1e-9);

        let (l, r) = speeds(-1.0, 0.0);
        assert!((l - 42.0).abs() < 1e-9);
        assert!((r + 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_deadzone() {
        for &(x, y) in &[(0.0, 0.0), (0.049, -0.049), (-0.04, 0.01), (0.02, 0.0)] {
            assert_eq!(speeds(x, y), (0.0, 0.0), "vector ({}, {})", x, y);
        }

        // Deadzone is per axis, a small x with a large y drives straight
        assert_eq!(speeds(0.03, 0.5), (30.0, 30.0));
    }

    #[test]
    fn test_speeds_within_limits() {
        let params = Params {
            max_speed: 90.0,
            turn_factor: 1.0,
            ..Default::default()
        };

        let steps = 20;
        for i in 0..=steps {
            for j in 0..=steps {
                let x = -1.5 + 3.0 * (i as f64) / (steps as f64);
                let y = -1.5 + 3.0 * (j as f64) / (steps as f64);

                let (l, r, report) = calc_skid_steer(&params, JoystickVector::new(x, y));

                assert!(l >= -100.0 && l <= 100.0);
                assert!(r >= -100.0 && r <= 100.0);
                assert_eq!(report.input_limited, x.abs() > 1.0 || y.abs() > 1.0);
            }
        }

        let (l, r, report) = calc_skid_steer(&params, JoystickVector::new(1.0, 1.0));
        assert_eq!((l, r), (0.0, 100.0));
        assert!(report.right_speed_limited);
        assert!(!report.left_speed_limited);
    }
}
