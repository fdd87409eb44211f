//! # Periodic tasks
//!
//! Runs each cadence of the control core on its own named thread:
//!
//! - `imu` reads the IMU driver and feeds the calibrator/filter
//! - `tm` samples host metrics and camera status, then publishes telemetry
//! - `watchdog` checks command liveness
//! - `actuator` writes the current motion and gimbal demands to the drivers
//! - `slam` polls the SLAM source for new poses, if one is fitted
//!
//! Tasks only communicate through the [`RovCtrl`] handle, so a slow task can
//! never hold up another.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{Arc, atomic::{AtomicBool, Ordering}},
    thread::{self, JoinHandle},
    time::{Duration, Instant}
};

use log::{debug, info, trace, warn};
use thiserror::Error;

use crate::{
    eqpt::{ActuatorDriver, CameraMonitor, EqptError, HostMonitor, ImuDriver, SlamSource, TmSink},
    params::CycleParams,
    rov_ctrl::RovCtrl,
    tm_aggregator::TmAggregator
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of consecutive overruns after which every further overrun is
/// reported at warn level instead of debug.
const OVERRUN_WARN_LIMIT: u64 = 5;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The collaborators driven by the task set.
pub struct Equipment {
    pub imu: Box<dyn ImuDriver>,
    pub actuators: Box<dyn ActuatorDriver>,
    pub tm_sink: Box<dyn TmSink>,
    pub host: Box<dyn HostMonitor>,
    pub camera: Option<Box<dyn CameraMonitor>>,
    pub slam: Option<Box<dyn SlamSource>>
}

/// A set of running periodic tasks.
pub struct TaskSet {
    running: Arc<AtomicBool>,
    tasks: Vec<(&'static str, JoinHandle<()>)>
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Could not spawn the {0} task: {1}")]
    SpawnError(&'static str, std::io::Error),

    #[error("The {0} task panicked")]
    TaskPanicked(&'static str),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TaskSet {
    /// Start all tasks.
    pub fn spawn(ctrl: &RovCtrl, eqpt: Equipment, cycle: &CycleParams)
        -> Result<Self, TaskError>
    {
        let mut set = Self {
            running: Arc::new(AtomicBool::new(true)),
            tasks: Vec::new()
        };

        let Equipment { mut imu, mut actuators, mut tm_sink, mut host, mut camera, slam } = eqpt;

        // ---- IMU ----
        {
            let c = ctrl.clone();
            set.start("imu", cycle.imu_rate_hz, move || {
                let sample = match imu.read() {
                    Ok(s) => Some(s),
                    Err(EqptError::NoData) => None,
                    Err(e) => {
                        warn!("Could not read the IMU: {}", e);
                        None
                    }
                };

                c.tick_imu(sample);
            })?;
        }

        // ---- TELEMETRY ----
        {
            let c = ctrl.clone();
            let mut aggregator = TmAggregator::new();
            set.start("tm", cycle.tm_rate_hz, move || {
                c.set_host_metrics(host.sample());
                if let Some(ref mut cam) = camera {
                    c.set_camera_active(cam.is_active());
                }

                let tm = aggregator.aggregate(&c);

                if let Err(e) = tm_sink.publish(&tm) {
                    warn!("Could not publish telemetry: {}", e);
                }
            })?;
        }

        // ---- WATCHDOG ----
        {
            let c = ctrl.clone();
            set.start("watchdog", cycle.watchdog_rate_hz, move || {
                if let Some(stop) = c.tick_watchdog() {
                    debug!("Watchdog stop issued at {}", stop.timestamp);
                }
            })?;
        }

        // ---- ACTUATORS ----
        {
            let c = ctrl.clone();
            let running = set.running.clone();
            let period = period_of(cycle.actuator_rate_hz);

            set.spawn_thread("actuator", move || {
                run_periodic("actuator", period, &running, || {
                    let motion = c.current_motion();
                    let gimbal = c.current_gimbal();

                    if let Err(e) = actuators.set_wheel_speeds(motion.left_speed, motion.right_speed) {
                        warn!("Could not set wheel speeds: {}", e);
                    }
                    if let Err(e) = actuators.set_servo_angles(gimbal.pan_angle, gimbal.tilt_angle) {
                        warn!("Could not set servo angles: {}", e);
                    }
                });

                // Leave the motors stopped
                if let Err(e) = actuators.set_wheel_speeds(0.0, 0.0) {
                    warn!("Could not stop the wheels on shutdown: {}", e);
                }
            })?;
        }

        // ---- SLAM ----
        if let Some(mut slam) = slam {
            let c = ctrl.clone();
            let mut was_active = false;

            set.start("slam", cycle.slam_rate_hz, move || {
                let active = c.slam_active();

                if active != was_active {
                    slam.set_active(active);
                    was_active = active;
                }

                if !active {
                    return
                }

                match slam.poll(&c.current_motion()) {
                    Ok(Some(pose)) => c.tick_pose(pose),
                    Ok(None) | Err(EqptError::NoData) => (),
                    Err(e) => warn!("Could not poll SLAM: {}", e)
                }
            })?;
        }

        info!("Started {} tasks", set.tasks.len());

        Ok(set)
    }

    /// True until `stop` is called.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Signal all tasks to stop and wait for them to finish.
    pub fn stop(mut self) -> Result<(), TaskError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), TaskError> {
        self.running.store(false, Ordering::Relaxed);

        let mut result = Ok(());

        for (name, handle) in self.tasks.drain(..) {
            match handle.join() {
                Ok(()) => debug!("{} task stopped", name),
                Err(_) => {
                    warn!("{} task panicked", name);
                    if result.is_ok() {
                        result = Err(TaskError::TaskPanicked(name));
                    }
                }
            }
        }

        result
    }

    /// Start a task which calls `f` at `rate_hz`.
    fn start<F>(&mut self, name: &'static str, rate_hz: f64, mut f: F) -> Result<(), TaskError>
    where
        F: FnMut() + Send + 'static
    {
        let running = self.running.clone();
        let period = period_of(rate_hz);

        self.spawn_thread(name, move || run_periodic(name, period, &running, &mut f))
    }

    fn spawn_thread<F>(&mut self, name: &'static str, f: F) -> Result<(), TaskError>
    where
        F: FnOnce() + Send + 'static
    {
        match thread::Builder::new().name(name.to_string()).spawn(f) {
            Ok(h) => {
                self.tasks.push((name, h));
                Ok(())
            },
            Err(e) => {
                // Don't leave half a task set running
                self.shutdown().ok();
                Err(TaskError::SpawnError(name, e))
            }
        }
    }
}

impl Drop for TaskSet {
    fn drop(&mut self) {
        if !self.tasks.is_empty() {
            self.shutdown().ok();
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn period_of(rate_hz: f64) -> Duration {
    Duration::from_secs_f64(1.0 / rate_hz)
}

/// Call `f` once per `period` until `running` is cleared.
fn run_periodic<F: FnMut()>(name: &str, period: Duration, running: &AtomicBool, mut f: F) {
    let mut num_consec_overruns = 0u64;

    trace!("{} task running with period {:.3} s", name, period.as_secs_f64());

    while running.load(Ordering::Relaxed) {
        let cycle_start_instant = Instant::now();

        f();

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match period.checked_sub(cycle_dur) {
            Some(d) => {
                num_consec_overruns = 0;
                thread::sleep(d);
            },
            None => {
                num_consec_overruns += 1;

                let overrun_s = cycle_dur.as_secs_f64() - period.as_secs_f64();
                if num_consec_overruns > OVERRUN_WARN_LIMIT {
                    warn!(
                        "{} cycle overran by {:.06} s ({} consecutive)",
                        name,
                        overrun_s,
                        num_consec_overruns
                    );
                }
                else {
                    debug!("{} cycle overran by {:.06} s", name, overrun_s);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Mutex;

    use chrono::Utc;
    use nalgebra::Vector3;

    use comms_if::{
        eqpt::{imu::RawImuSample, mech::MotionCommand, slam::{EulerAngles, PoseEstimate}},
        tc::JoystickVector,
        tm::{HostMetrics, TelemetrySnapshot}
    };
    use crate::params::RovExecParams;

    struct StillImu;

    impl ImuDriver for StillImu {
        fn read(&mut self) -> Result<RawImuSample, EqptError> {
            Ok(RawImuSample {
                timestamp: Utc::now(),
                accel_g: Vector3::new(0.01, 0.0, 1.01),
                gyro_degs: Vector3::new(0.2, -0.1, 0.0),
                temp_c: None
            })
        }
    }

    #[derive(Clone, Default)]
    struct Recorder {
        wheels: Arc<Mutex<Vec<(f64, f64)>>>,
        tm: Arc<Mutex<Vec<TelemetrySnapshot>>>
    }

    impl ActuatorDriver for Recorder {
        fn set_wheel_speeds(&mut self, left: f64, right: f64) -> Result<(), EqptError> {
            self.wheels.lock().unwrap().push((left, right));
            Ok(())
        }

        fn set_servo_angles(&mut self, _pan: f64, _tilt: f64) -> Result<(), EqptError> {
            Ok(())
        }
    }

    impl TmSink for Recorder {
        fn publish(&mut self, tm: &TelemetrySnapshot) -> Result<(), EqptError> {
            self.tm.lock().unwrap().push(tm.clone());
            Ok(())
        }
    }

    struct FixedHost;

    impl HostMonitor for FixedHost {
        fn sample(&mut self) -> HostMetrics {
            HostMetrics {
                cpu_usage_pct: Some(12.5),
                mem_usage_pct: Some(40.0),
                battery_pct: None
            }
        }
    }

    struct StreamingCamera;

    impl CameraMonitor for StreamingCamera {
        fn is_active(&mut self) -> bool {
            true
        }
    }

    struct FixedSlam;

    impl SlamSource for FixedSlam {
        fn poll(&mut self, _motion: &MotionCommand) -> Result<Option<PoseEstimate>, EqptError> {
            Ok(Some(PoseEstimate::new(
                Utc::now(),
                Vector3::new(1.0, 0.0, 0.0),
                EulerAngles::default()
            )))
        }
    }

    fn wait_for<F: Fn() -> bool>(f: F) -> bool {
        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(5) {
            if f() {
                return true
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_task_set_end_to_end() {
        let mut params = RovExecParams::default();
        params.imu_cal.num_samples = 5;
        params.watchdog.liveness_threshold_s = 0.2;
        params.cycle.imu_rate_hz = 200.0;
        params.cycle.tm_rate_hz = 50.0;
        params.cycle.watchdog_rate_hz = 50.0;
        params.cycle.actuator_rate_hz = 100.0;
        params.cycle.slam_rate_hz = 50.0;
        params.are_valid().unwrap();

        let ctrl = RovCtrl::new(&params).unwrap();
        let rec = Recorder::default();

        let tasks = TaskSet::spawn(
            &ctrl,
            Equipment {
                imu: Box::new(StillImu),
                actuators: Box::new(rec.clone()),
                tm_sink: Box::new(rec.clone()),
                host: Box::new(FixedHost),
                camera: Some(Box::new(StreamingCamera)),
                slam: Some(Box::new(FixedSlam))
            },
            &params.cycle
        ).unwrap();
        assert!(tasks.is_running());

        assert!(wait_for(|| ctrl.snapshot().status.imu_calibrated));

        // Drive forwards, the actuators should see it
        ctrl.apply_motion(JoystickVector::new(0.0, 1.0)).unwrap();
        ctrl.apply_toggle_slam(true);
        assert!(wait_for(|| rec.wheels.lock().unwrap().last() == Some(&(60.0, 60.0))));

        // Then go quiet, the watchdog must stop the rover
        assert!(wait_for(|| ctrl.current_motion().is_stop()));
        assert!(wait_for(|| rec.wheels.lock().unwrap().last() == Some(&(0.0, 0.0))));
        assert!(ctrl.snapshot().status.watchdog_tripped);

        tasks.stop().unwrap();

        // Telemetry was published in order with host metrics and poses
        let tm = rec.tm.lock().unwrap();
        assert!(tm.len() > 2);
        assert!(tm.windows(2).all(|w| w[1].seq == w[0].seq + 1));

        let last = tm.last().unwrap();
        assert_eq!(last.status.cpu_usage_pct, Some(12.5));
        assert!(last.status.camera_active);
        assert!(last.pose.update_seq > 0);

        // Motors left stopped on shutdown
        assert_eq!(rec.wheels.lock().unwrap().last(), Some(&(0.0, 0.0)));
    }
}
