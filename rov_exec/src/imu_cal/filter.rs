//! Bias estimation and correction

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::Serialize;

use comms_if::eqpt::imu::{ImuReading, RawImuSample};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Sensor biases found by calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImuCalibration {
    /// Accelerometer bias in g, with gravity removed from Z
    pub accel_bias: Vector3<f64>,

    /// Gyroscope bias in degrees/second
    pub gyro_bias: Vector3<f64>,

    pub calibrated: bool,

    /// Completed on timeout with fewer samples than required
    pub degraded: bool,

    /// Number of samples the biases were computed from
    pub num_samples: usize
}

/// Running sums of the samples collected during calibration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Accumulator {
    accel_sum: Vector3<f64>,
    gyro_sum: Vector3<f64>,
    count: usize
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ImuCalibration {
    fn default() -> Self {
        Self {
            accel_bias: Vector3::zeros(),
            gyro_bias: Vector3::zeros(),
            calibrated: false,
            degraded: false,
            num_samples: 0
        }
    }
}

impl ImuCalibration {
    /// Correct a raw sample.
    pub fn correct(&self, raw: &RawImuSample) -> ImuReading {
        ImuReading::new(
            raw.timestamp,
            raw.accel_g - self.accel_bias,
            raw.gyro_degs - self.gyro_bias,
            raw.temp_c
        )
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            accel_sum: Vector3::zeros(),
            gyro_sum: Vector3::zeros(),
            count: 0
        }
    }
}

impl Accumulator {
    pub(crate) fn add(&mut self, raw: &RawImuSample) {
        self.accel_sum += raw.accel_g;
        self.gyro_sum += raw.gyro_degs;
        self.count += 1;
    }

    pub(crate) fn count(&self) -> usize {
        self.count
    }

    /// Compute the calibration from the samples so far.
    ///
    /// The biases are the per axis means, with `gravity_g` taken off the Z
    /// accelerometer mean. With no samples all biases are zero.
    pub(crate) fn finish(&self, gravity_g: f64, degraded: bool) -> ImuCalibration {
        let (accel_bias, gyro_bias) = if self.count == 0 {
            (Vector3::zeros(), Vector3::zeros())
        }
        else {
            let n = self.count as f64;
            let mut accel_bias = self.accel_sum / n;
            accel_bias[2] -= gravity_g;

            (accel_bias, self.gyro_sum / n)
        };

        ImuCalibration {
            accel_bias,
            gyro_bias,
            calibrated: true,
            degraded,
            num_samples: self.count
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;

    fn sample(accel: [f64; 3], gyro: [f64; 3]) -> RawImuSample {
        RawImuSample {
            timestamp: Utc::now(),
            accel_g: Vector3::from(accel),
            gyro_degs: Vector3::from(gyro),
            temp_c: None
        }
    }

    #[test]
    fn test_bias_is_mean_with_gravity_removed() {
        let mut acc = Accumulator::default();

        acc.add(&sample([0.01, -0.02, 1.04], [0.5, -1.0, 0.25]));
        acc.add(&sample([0.03, -0.04, 1.02], [1.5, -3.0, 0.75]));

        let cal = acc.finish(1.0, false);

        assert!((cal.accel_bias - Vector3::new(0.02, -0.03, 0.03)).norm() < 1e-12);
        assert!((cal.gyro_bias - Vector3::new(1.0, -2.0, 0.5)).norm() < 1e-12);
        assert_eq!(cal.num_samples, 2);
        assert!(cal.calibrated);
        assert!(!cal.degraded);
    }

    #[test]
    fn test_correct() {
        let cal = ImuCalibration {
            accel_bias: Vector3::new(0.1, 0.0, 0.05),
            gyro_bias: Vector3::new(1.0, 1.0, 1.0),
            calibrated: true,
            degraded: false,
            num_samples: 50
        };

        let reading = cal.correct(&sample([0.1, 0.0, 1.05], [1.0, 3.0, 0.0]));

        assert!((reading.accel_g - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
        assert!((reading.gyro_degs - Vector3::new(0.0, 2.0, -1.0)).norm() < 1e-12);
        assert!(reading.roll_deg.abs() < 1e-9);
        assert!(reading.pitch_deg.abs() < 1e-9);
    }

    #[test]
    fn test_no_samples_gives_zero_bias() {
        let cal = Accumulator::default().finish(1.0, true);

        assert_eq!(cal.accel_bias, Vector3::zeros());
        assert_eq!(cal.gyro_bias, Vector3::zeros());
        assert!(cal.calibrated);
        assert!(cal.degraded);
    }
}
