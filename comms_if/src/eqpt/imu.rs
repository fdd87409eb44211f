//! # IMU equipment data
//!
//! Raw six axis samples delivered by the IMU driver and the bias corrected readings produced from
//! them.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Accelerometer scale factor for the +/-2 g range
pub const ACCEL_LSB_PER_G: f64 = 16384.0;

/// Gyroscope scale factor for the +/-250 deg/s range
pub const GYRO_LSB_PER_DEGS: f64 = 131.0;

/// Temperature sensor scale factor
pub const TEMP_LSB_PER_DEGC: f64 = 340.0;

/// Temperature sensor offset
pub const TEMP_OFFSET_DEGC: f64 = 36.53;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single uncorrected sample from the IMU.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RawImuSample {
    pub timestamp: DateTime<Utc>,

    /// Acceleration in g
    pub accel_g: Vector3<f64>,

    /// Angular rate in degrees/second
    pub gyro_degs: Vector3<f64>,

    /// Die temperature, if the driver provides it
    pub temp_c: Option<f64>
}

/// A bias corrected IMU reading.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ImuReading {
    /// Timestamp of the raw sample this reading was produced from
    pub timestamp: DateTime<Utc>,

    pub accel_g: Vector3<f64>,

    pub gyro_degs: Vector3<f64>,

    pub temp_c: Option<f64>,

    /// Roll about X estimated from the gravity vector
    pub roll_deg: f64,

    /// Pitch about Y estimated from the gravity vector
    pub pitch_deg: f64
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RawImuSample {
    /// Build a sample from raw register counts.
    pub fn from_counts(
        timestamp: DateTime<Utc>,
        accel: [i16; 3],
        gyro: [i16; 3],
        temp: Option<i16>
    ) -> Self {
        let accel_g = Vector3::new(
            accel[0] as f64, accel[1] as f64, accel[2] as f64
        ) / ACCEL_LSB_PER_G;

        let gyro_degs = Vector3::new(
            gyro[0] as f64, gyro[1] as f64, gyro[2] as f64
        ) / GYRO_LSB_PER_DEGS;

        Self {
            timestamp,
            accel_g,
            gyro_degs,
            temp_c: temp.map(|c| c as f64 / TEMP_LSB_PER_DEGC + TEMP_OFFSET_DEGC)
        }
    }
}

impl ImuReading {
    /// Build a reading from corrected values, estimating roll and pitch from the acceleration.
    pub fn new(
        timestamp: DateTime<Utc>,
        accel_g: Vector3<f64>,
        gyro_degs: Vector3<f64>,
        temp_c: Option<f64>
    ) -> Self {
        let (roll_deg, pitch_deg) = roll_pitch_deg(&accel_g);

        Self {
            timestamp,
            accel_g,
            gyro_degs,
            temp_c,
            roll_deg,
            pitch_deg
        }
    }
}

/// Estimate roll and pitch in degrees from an acceleration vector, assuming the only
/// acceleration acting is gravity.
pub fn roll_pitch_deg(accel_g: &Vector3<f64>) -> (f64, f64) {
    let (x, y, z) = (accel_g[0], accel_g[1], accel_g[2]);

    let roll = y.atan2((x * x + z * z).sqrt());
    let pitch = (-x).atan2((y * y + z * z).sqrt());

    (roll.to_degrees(), pitch.to_degrees())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_counts() {
        let sample = RawImuSample::from_counts(
            Utc::now(),
            [0, 8192, 16384],
            [131, -262, 0],
            Some(-340)
        );

        assert_eq!(sample.accel_g, Vector3::new(0.0, 0.5, 1.0));
        assert_eq!(sample.gyro_degs, Vector3::new(1.0, -2.0, 0.0));
        assert!((sample.temp_c.unwrap() - 35.53).abs() < 1e-9);
    }

    #[test]
    fn test_roll_pitch() {
        let (roll, pitch) = roll_pitch_deg(&Vector3::new(0.0, 0.0, 1.0));
        assert!(roll.abs() < 1e-9);
        assert!(pitch.abs() < 1e-9);

        // Rolled 45 degrees
        let (roll, pitch) = roll_pitch_deg(&Vector3::new(0.0, 1.0, 1.0));
        assert!((roll - 45.0).abs() < 1e-9);
        assert!(pitch.abs() < 1e-9);

        // Nose down 90 degrees
        let (_, pitch) = roll_pitch_deg(&Vector3::new(-1.0, 0.0, 0.0));
        assert!((pitch - 90.0).abs() < 1e-9);
    }
}
