//! Implementations for the ImuCal state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Serialize;

use super::{Accumulator, ImuCalError, ImuCalibration, Params};
use comms_if::eqpt::imu::{ImuReading, RawImuSample};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// IMU calibration and filter state
pub struct ImuCal {
    params: Params,

    phase: Phase,

    /// Calibration currently applied to samples. During a recalibration this
    /// is the previous calibration until the new one completes.
    calibration: ImuCalibration,

    /// Latest corrected reading and the time it was produced
    latest: Option<(ImuReading, Instant)>
}

pub struct InputData {
    /// New raw sample, or `None` if the driver had nothing this tick
    pub sample: Option<RawImuSample>,

    pub now: Instant
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusReport {
    pub phase: CalPhase,

    /// Set on the tick where a calibration completes
    pub completed: Option<ImuCalibration>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Externally visible calibration phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CalPhase {
    Uncalibrated,
    Calibrating,
    Calibrated
}

enum Phase {
    Uncalibrated,
    Calibrating {
        deadline: Instant,
        acc: Accumulator
    },
    Calibrated
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ImuCal {
    fn default() -> Self {
        Self {
            params: Params::default(),
            phase: Phase::Uncalibrated,
            calibration: ImuCalibration::default(),
            latest: None
        }
    }
}

impl State for ImuCal {
    type InitData = Params;
    type InitError = ImuCalError;

    type InputData = InputData;
    type OutputData = Option<ImuReading>;
    type StatusReport = StatusReport;
    type ProcError = ImuCalError;

    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        init_data.check().map_err(ImuCalError::InvalidParams)?;

        *self = Self {
            params: init_data,
            ..Default::default()
        };

        Ok(())
    }

    /// Process one IMU tick.
    ///
    /// While calibrating the sample is accumulated and the deadline checked.
    /// If a calibration is in effect the sample is then corrected and becomes
    /// the latest reading.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let sample = match input_data.sample {
            Some(ref s) if !is_finite(s) => {
                // Still honour the deadline so a failing sensor can't stall
                // calibration
                self.step_calibration(None, input_data.now);
                return Err(ImuCalError::NonFiniteSample)
            },
            ref s => s.as_ref()
        };

        let completed = self.step_calibration(sample, input_data.now);

        let mut output = None;
        if let Some(s) = sample {
            if self.calibration.calibrated {
                let reading = self.calibration.correct(s);
                self.latest = Some((reading, input_data.now));
                output = Some(reading);
            }
        }

        Ok((output, StatusReport {
            phase: self.phase(),
            completed
        }))
    }
}

impl ImuCal {
    /// Enter the calibrating phase. The rover must be stationary until
    /// calibration completes.
    pub fn begin(&mut self, now: Instant) -> Result<(), ImuCalError> {
        if let Phase::Calibrating { .. } = self.phase {
            return Err(ImuCalError::AlreadyCalibrating)
        }

        let timeout = Duration::from_secs_f64(self.params.timeout_s);

        info!(
            "IMU calibration started, collecting {} samples within {:.1} s",
            self.params.num_samples,
            self.params.timeout_s
        );

        self.phase = Phase::Calibrating {
            deadline: now + timeout,
            acc: Accumulator::default()
        };

        Ok(())
    }

    pub fn phase(&self) -> CalPhase {
        match self.phase {
            Phase::Uncalibrated => CalPhase::Uncalibrated,
            Phase::Calibrating { .. } => CalPhase::Calibrating,
            Phase::Calibrated => CalPhase::Calibrated
        }
    }

    /// The calibration in effect.
    pub fn calibration(&self) -> ImuCalibration {
        self.calibration
    }

    /// True while the robot must be held stationary.
    pub fn is_calibrating(&self) -> bool {
        self.phase() == CalPhase::Calibrating
    }

    /// Latest corrected reading and the instant it was produced, if any.
    pub fn latest(&self) -> Option<(ImuReading, Instant)> {
        self.latest
    }

    /// Advance the calibration with an optional sample, returning the new
    /// calibration if it completed.
    ///
    /// A sample arriving at or before the deadline is counted. Once the
    /// deadline has passed calibration completes with what has been
    /// collected.
    fn step_calibration(&mut self, sample: Option<&RawImuSample>, now: Instant)
        -> Option<ImuCalibration>
    {
        let num_samples = self.params.num_samples;
        let gravity_g = self.params.gravity_g;

        let finished = match self.phase {
            Phase::Calibrating { deadline, ref mut acc } => {
                if now > deadline {
                    Some(acc.finish(gravity_g, true))
                }
                else {
                    if let Some(s) = sample {
                        acc.add(s);
                        debug!("IMU calibration sample {}/{}", acc.count(), num_samples);
                    }

                    if acc.count() >= num_samples {
                        Some(acc.finish(gravity_g, false))
                    }
                    else {
                        None
                    }
                }
            },
            _ => None
        };

        if let Some(cal) = finished {
            if cal.degraded {
                warn!(
                    "IMU calibration timed out with {}/{} samples, accuracy is reduced",
                    cal.num_samples,
                    num_samples
                );
            }
            else {
                info!("IMU calibration complete");
            }
            debug!("IMU biases: accel {:?}, gyro {:?}", cal.accel_bias, cal.gyro_bias);

            self.calibration = cal;
            self.phase = Phase::Calibrated;
        }

        finished
    }
}

fn is_finite(raw: &RawImuSample) -> bool {
    raw.accel_g.iter().chain(raw.gyro_degs.iter()).all(|v| v.is_finite())
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;
    use nalgebra::Vector3;

    fn sample(accel: [f64; 3], gyro: [f64; 3]) -> RawImuSample {
        RawImuSample {
            timestamp: Utc::now(),
            accel_g: Vector3::from(accel),
            gyro_degs: Vector3::from(gyro),
            temp_c: Some(25.0)
        }
    }

    fn tick(cal: &mut ImuCal, s: Option<RawImuSample>, now: Instant)
        -> (Option<ImuReading>, StatusReport)
    {
        cal.proc(&InputData { sample: s, now }).unwrap()
    }

    #[test]
    fn test_calibrates_after_n_samples() {
        let mut cal = ImuCal::default();
        cal.init(Params::default()).unwrap();
        assert_eq!(cal.phase(), CalPhase::Uncalibrated);

        let t0 = Instant::now();
        cal.begin(t0).unwrap();

        // Alternate between two samples so the mean is known
        for i in 0..49 {
            let s = if i % 2 == 0 {
                sample([0.02, -0.04, 1.10], [1.0, 2.0, -4.0])
            } else {
                sample([0.04, -0.02, 1.00], [3.0, 0.0, -2.0])
            };
            let (out, rpt) = tick(&mut cal, Some(s), t0 + Duration::from_millis(50 * i));

            assert!(out.is_none());
            assert_eq!(rpt.phase, CalPhase::Calibrating);
            assert!(rpt.completed.is_none());
        }

        // 50th sample, 25 of each
        let (out, rpt) = tick(
            &mut cal,
            Some(sample([0.04, -0.02, 1.00], [3.0, 0.0, -2.0])),
            t0 + Duration::from_millis(2450)
        );

        let done = rpt.completed.unwrap();
        assert_eq!(rpt.phase, CalPhase::Calibrated);
        assert_eq!(done.num_samples, 50);
        assert!(!done.degraded);
        assert!((done.accel_bias - Vector3::new(0.03, -0.03, 0.05)).norm() < 1e-9);
        assert!((done.gyro_bias - Vector3::new(2.0, 1.0, -3.0)).norm() < 1e-9);

        // The completing sample is corrected with the new biases
        let reading = out.unwrap();
        assert!((reading.accel_g - Vector3::new(0.01, 0.01, 0.95)).norm() < 1e-9);
        assert!(cal.latest().is_some());
    }

    #[test]
    fn test_timeout_completes_degraded() {
        let mut cal = ImuCal::default();
        cal.init(Params::default()).unwrap();

        let t0 = Instant::now();
        cal.begin(t0).unwrap();

        for i in 0..10 {
            tick(&mut cal, Some(sample([0.0, 0.0, 1.0], [0.5, 0.5, 0.5])), t0 + Duration::from_millis(100 * i));
        }

        // Exactly at the deadline the sample still counts
        let (_, rpt) = tick(&mut cal, Some(sample([0.0, 0.0, 1.0], [0.5, 0.5, 0.5])), t0 + Duration::from_secs(5));
        assert!(rpt.completed.is_none());

        // Nothing more arrives, the next tick after the deadline completes
        let (out, rpt) = tick(&mut cal, None, t0 + Duration::from_millis(5050));
        let done = rpt.completed.unwrap();

        assert!(out.is_none());
        assert!(done.degraded);
        assert!(done.calibrated);
        assert_eq!(done.num_samples, 11);
        assert!((done.gyro_bias - Vector3::new(0.5, 0.5, 0.5)).norm() < 1e-9);
        assert_eq!(cal.phase(), CalPhase::Calibrated);
    }

    #[test]
    fn test_timeout_with_no_samples() {
        let mut cal = ImuCal::default();
        cal.init(Params::default()).unwrap();

        let t0 = Instant::now();
        cal.begin(t0).unwrap();

        let (_, rpt) = tick(&mut cal, None, t0 + Duration::from_secs(6));
        let done = rpt.completed.unwrap();

        assert_eq!(done.num_samples, 0);
        assert!(done.degraded);
        assert_eq!(done.accel_bias, Vector3::zeros());
    }

    #[test]
    fn test_recalibration_keeps_old_bias() {
        let params = Params { num_samples: 2, ..Default::default() };
        let mut cal = ImuCal::default();
        cal.init(params).unwrap();

        let t0 = Instant::now();
        cal.begin(t0).unwrap();
        tick(&mut cal, Some(sample([0.1, 0.0, 1.0], [0.0; 3])), t0);
        tick(&mut cal, Some(sample([0.1, 0.0, 1.0], [0.0; 3])), t0);
        let old = cal.calibration();
        assert!((old.accel_bias[0] - 0.1).abs() < 1e-12);

        cal.begin(t0 + Duration::from_secs(10)).unwrap();
        assert!(cal.is_calibrating());
        assert!(matches!(cal.begin(t0), Err(ImuCalError::AlreadyCalibrating)));

        // During recalibration readings are still produced with the old bias
        let (out, rpt) = tick(
            &mut cal,
            Some(sample([0.3, 0.0, 1.0], [0.0; 3])),
            t0 + Duration::from_secs(10)
        );
        assert!(rpt.completed.is_none());
        assert_eq!(cal.calibration(), old);
        assert!((out.unwrap().accel_g[0] - 0.2).abs() < 1e-12);

        let (_, rpt) = tick(
            &mut cal,
            Some(sample([0.3, 0.0, 1.0], [0.0; 3])),
            t0 + Duration::from_secs(10)
        );
        assert!(rpt.completed.is_some());
        assert!((cal.calibration().accel_bias[0] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_sample() {
        let mut cal = ImuCal::default();
        cal.init(Params::default()).unwrap();

        let t0 = Instant::now();
        cal.begin(t0).unwrap();

        let res = cal.proc(&InputData {
            sample: Some(sample([f64::NAN, 0.0, 1.0], [0.0; 3])),
            now: t0 + Duration::from_secs(6)
        });

        assert!(matches!(res, Err(ImuCalError::NonFiniteSample)));

        // The deadline was still honoured
        assert_eq!(cal.phase(), CalPhase::Calibrated);
        assert_eq!(cal.calibration().num_samples, 0);
    }
}
