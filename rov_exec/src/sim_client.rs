//! # Simulation Client
//!
//! Simulated equipment so the rover software can be run and tested without
//! any hardware attached. The client provides:
//!
//! - A stationary IMU with a fixed bias - [`SimImu`].
//! - Actuators which log the demands they are given - [`LogActuators`].
//! - A dead-reckoning pose source standing in for SLAM - [`SimSlam`].
//! - A telemetry sink which logs the snapshots - [`LogTmSink`].
//! - A camera which is always streaming - [`SimCamera`].
//! - A host monitor sampling the machine it runs on - [`SysHostMonitor`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{sync::Arc, time::Instant};

use chrono::Utc;
use log::{debug, info, trace, warn};
use nalgebra::Vector3;

use comms_if::{
    eqpt::{
        imu::{ACCEL_LSB_PER_G, GYRO_LSB_PER_DEGS, RawImuSample},
        mech::{Direction, MotionCommand},
        slam::{EulerAngles, OccupancyGrid, PoseEstimate}
    },
    tm::{HostMetrics, TelemetrySnapshot}
};
use sysinfo::System;

use crate::eqpt::{
    ActuatorDriver, CameraMonitor, EqptError, HostMonitor, ImuDriver, SlamSource, TmSink
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Ground speed for each percent of wheel duty
const SIM_SPEED_MS_PER_PCT: f64 = 0.005;

/// Distance between the left and right wheels
const SIM_TRACK_WIDTH_M: f64 = 0.25;

/// Telemetry is summarised at info level once every this many publications
const TM_SUMMARY_INTERVAL: u64 = 25;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A stationary, level IMU with a constant bias and a small deterministic
/// wobble.
pub struct SimImu {
    accel_bias_g: Vector3<f64>,
    gyro_bias_degs: Vector3<f64>,
    num_samples: u64
}

/// Actuators which only log what they are asked to do.
#[derive(Default)]
pub struct LogActuators {
    wheels: Option<(f64, f64)>,
    servos: Option<(f64, f64)>
}

/// Integrates the wheel speeds into a pose.
pub struct SimSlam {
    position_m: Vector3<f64>,
    yaw_rad: f64,
    last_poll: Option<Instant>,
    grid: Arc<OccupancyGrid>
}

/// Logs telemetry rather than sending it anywhere.
#[derive(Default)]
pub struct LogTmSink {
    num_published: u64
}

/// A camera with a fixed streaming state.
pub struct SimCamera {
    active: bool
}

/// Samples CPU and memory usage of the host.
pub struct SysHostMonitor {
    sys: System,
    num_samples: u64
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimImu {
    pub fn new(accel_bias_g: Vector3<f64>, gyro_bias_degs: Vector3<f64>) -> Self {
        Self {
            accel_bias_g,
            gyro_bias_degs,
            num_samples: 0
        }
    }
}

impl Default for SimImu {
    fn default() -> Self {
        Self::new(Vector3::new(0.02, -0.01, 0.03), Vector3::new(0.5, -0.3, 0.1))
    }
}

impl ImuDriver for SimImu {
    fn read(&mut self) -> Result<RawImuSample, EqptError> {
        self.num_samples += 1;
        let wobble = 0.002 * (self.num_samples as f64 * 0.7).sin();

        let accel = self.accel_bias_g + Vector3::new(wobble, -wobble, 1.0);
        let gyro = self.gyro_bias_degs + Vector3::new(wobble, wobble, -wobble) * 10.0;

        // Go through register counts the same way a real driver would
        Ok(RawImuSample::from_counts(
            Utc::now(),
            to_counts(&accel, ACCEL_LSB_PER_G),
            to_counts(&gyro, GYRO_LSB_PER_DEGS),
            Some(-3000)
        ))
    }
}

fn to_counts(v: &Vector3<f64>, lsb_per_unit: f64) -> [i16; 3] {
    let c = |x: f64| (x * lsb_per_unit).round().max(i16::MIN as f64).min(i16::MAX as f64) as i16;
    [c(v[0]), c(v[1]), c(v[2])]
}

impl ActuatorDriver for LogActuators {
    fn set_wheel_speeds(&mut self, left: f64, right: f64) -> Result<(), EqptError> {
        if self.wheels != Some((left, right)) {
            let (ld, rd) = (Direction::from_speed(left), Direction::from_speed(right));
            debug!(
                "Motors 0, 2: {:?} {:.1} %, motors 1, 3: {:?} {:.1} %",
                ld, left.abs(), rd, right.abs()
            );
            self.wheels = Some((left, right));
        }

        Ok(())
    }

    fn set_servo_angles(&mut self, pan: f64, tilt: f64) -> Result<(), EqptError> {
        if self.servos != Some((pan, tilt)) {
            debug!("Gimbal servos: pan {:.1} deg, tilt {:.1} deg", pan, tilt);
            self.servos = Some((pan, tilt));
        }

        Ok(())
    }
}

impl SimSlam {
    pub fn new() -> Self {
        Self {
            position_m: Vector3::zeros(),
            yaw_rad: 0.0,
            last_poll: None,
            grid: Arc::new(OccupancyGrid::unknown(40, 40, 0.05))
        }
    }

    /// Advance the dead-reckoned pose by `dt_s` under the given motion.
    fn integrate(&mut self, motion: &MotionCommand, dt_s: f64) {
        let left_ms = motion.left_speed * SIM_SPEED_MS_PER_PCT;
        let right_ms = motion.right_speed * SIM_SPEED_MS_PER_PCT;

        let speed_ms = 0.5 * (left_ms + right_ms);
        let rate_rads = (right_ms - left_ms) / SIM_TRACK_WIDTH_M;

        self.yaw_rad += rate_rads * dt_s;
        self.position_m += Vector3::new(self.yaw_rad.cos(), self.yaw_rad.sin(), 0.0)
            * speed_ms * dt_s;
    }
}

impl Default for SimSlam {
    fn default() -> Self {
        Self::new()
    }
}

impl SlamSource for SimSlam {
    fn poll(&mut self, motion: &MotionCommand) -> Result<Option<PoseEstimate>, EqptError> {
        let now = Instant::now();

        if let Some(last) = self.last_poll {
            self.integrate(motion, util::time::seconds_since(last, now));
        }
        self.last_poll = Some(now);

        let mut pose = PoseEstimate::new(
            Utc::now(),
            self.position_m,
            EulerAngles {
                roll_deg: 0.0,
                pitch_deg: 0.0,
                yaw_deg: self.yaw_rad.to_degrees()
            }
        );
        pose.occupancy_grid = Some(self.grid.clone());

        Ok(Some(pose))
    }

    fn set_active(&mut self, active: bool) {
        info!("SimSlam {}", if active { "started" } else { "stopped" });

        // Don't integrate over the time spent inactive
        self.last_poll = None;
    }
}

impl TmSink for LogTmSink {
    fn publish(&mut self, tm: &TelemetrySnapshot) -> Result<(), EqptError> {
        let json = tm.to_json().map_err(EqptError::SerializationError)?;
        trace!("TM: {}", json);

        if self.num_published % TM_SUMMARY_INTERVAL == 0 {
            info!(
                "TM {}: connected {}, imu calibrated {}, slam {}, motion ({:.1}, {:.1}), \
                gimbal ({:.1}, {:.1}), faults {:?}",
                tm.seq,
                tm.status.connected,
                tm.status.imu_calibrated,
                tm.status.slam_active,
                tm.motion.left_speed,
                tm.motion.right_speed,
                tm.gimbal.pan_angle,
                tm.gimbal.tilt_angle,
                tm.status.faults
            );
        }

        self.num_published += 1;

        Ok(())
    }
}

impl SimCamera {
    pub fn new(active: bool) -> Self {
        Self { active }
    }
}

impl CameraMonitor for SimCamera {
    fn is_active(&mut self) -> bool {
        self.active
    }
}

impl SysHostMonitor {
    pub fn new() -> Self {
        Self {
            sys: System::new(),
            num_samples: 0
        }
    }
}

impl Default for SysHostMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl HostMonitor for SysHostMonitor {
    fn sample(&mut self) -> HostMetrics {
        self.sys.refresh_cpu();
        self.sys.refresh_memory();

        // CPU usage is measured between two refreshes
        let cpu_usage_pct = match self.num_samples {
            0 => None,
            _ => Some(self.sys.global_cpu_info().cpu_usage() as f64)
        };
        self.num_samples += 1;

        let mem = mem_usage_pct(self.sys.used_memory(), self.sys.total_memory());
        if mem.is_none() && self.num_samples == 1 {
            warn!("Host memory usage unavailable");
        }

        HostMetrics {
            cpu_usage_pct,
            mem_usage_pct: mem,
            battery_pct: None
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn mem_usage_pct(used: u64, total: u64) -> Option<f64> {
    match total {
        0 => None,
        t => Some(100.0 * used as f64 / t as f64)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sim_imu_reads_bias() {
        let mut imu = SimImu::default();
        let s = imu.read().unwrap();

        assert!((s.accel_g - Vector3::new(0.02, -0.01, 1.03)).norm() < 0.01);
        assert!((s.gyro_degs - Vector3::new(0.5, -0.3, 0.1)).norm() < 0.1);
        assert!(s.temp_c.is_some());
    }

    #[test]
    fn test_sim_slam_integrates() {
        let mut slam = SimSlam::new();
        let t = Utc::now();

        // Straight ahead at 60 % for one second
        slam.integrate(&MotionCommand { left_speed: 60.0, right_speed: 60.0, timestamp: t }, 1.0);
        assert!((slam.position_m - Vector3::new(0.3, 0.0, 0.0)).norm() < 1e-9);

        // Turning on the spot doesn't move the rover
        slam.integrate(&MotionCommand { left_speed: -42.0, right_speed: 42.0, timestamp: t }, 0.5);
        assert!((slam.position_m - Vector3::new(0.3, 0.0, 0.0)).norm() < 1e-9);
        assert!(slam.yaw_rad > 0.0);

        let pose = slam.poll(&MotionCommand::stop(t)).unwrap().unwrap();
        assert!(pose.occupancy_grid.is_some());
        assert!((pose.orientation.yaw_deg - slam.yaw_rad.to_degrees()).abs() < 1e-9);
    }

    #[test]
    fn test_log_actuators() {
        let mut act = LogActuators::default();

        act.set_wheel_speeds(10.0, -10.0).unwrap();
        act.set_servo_angles(80.0, 40.0).unwrap();

        assert_eq!(act.wheels, Some((10.0, -10.0)));
        assert_eq!(act.servos, Some((80.0, 40.0)));
    }

    #[test]
    fn test_mem_usage_pct() {
        assert_eq!(mem_usage_pct(250, 1000), Some(25.0));
        assert_eq!(mem_usage_pct(0, 0), None);
    }

    #[test]
    fn test_host_monitor_samples() {
        let mut host = SysHostMonitor::new();

        let first = host.sample();
        assert_eq!(first.cpu_usage_pct, None);
        assert_eq!(first.battery_pct, None);

        let second = host.sample();
        assert!(second.cpu_usage_pct.is_some());

        if let Some(mem) = second.mem_usage_pct {
            assert!(mem > 0.0 && mem <= 100.0);
        }
    }
}
