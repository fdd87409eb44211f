//! # Rover control orchestrator
//!
//! [`RovCtrl`] is a cheaply clonable handle to the control core's state. It
//! is the only way collaborators (the transport, drivers, SLAM engine and the
//! periodic tasks) can read or change that state, and each of its
//! operations runs under a single lock.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant
};

use nalgebra::Vector3;

use comms_if::{
    eqpt::{
        imu::RawImuSample,
        mech::{GimbalState, MotionCommand},
        slam::PoseEstimate
    },
    tc::{GimbalCmd, JoystickVector},
    tm::{HostMetrics, TelemetrySnapshot}
};
use util::raise_error;

use crate::{
    data_store::{CtrlError, DataStore},
    params::RovExecParams,
    tm_aggregator
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Clone)]
pub struct RovCtrl {
    ds: Arc<Mutex<DataStore>>
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RovCtrl {
    /// Create the control core, starting the initial IMU calibration.
    ///
    /// The parameters should have been checked with
    /// [`RovExecParams::are_valid`] beforehand.
    pub fn new(params: &RovExecParams) -> Result<Self, CtrlError> {
        let ds = DataStore::new(params, Instant::now())?;

        Ok(Self {
            ds: Arc::new(Mutex::new(ds))
        })
    }

    /// Lock the store.
    ///
    /// A poisoned lock means a thread panicked part way through changing the
    /// state, so the state can no longer be trusted and the control loop is
    /// aborted.
    fn lock(&self) -> MutexGuard<'_, DataStore> {
        match self.ds.lock() {
            Ok(g) => g,
            Err(_) => raise_error!("The rover control state lock is poisoned")
        }
    }

    // ---- COMMANDS ----

    pub fn apply_motion(&self, vector: JoystickVector) -> Result<MotionCommand, CtrlError> {
        self.lock().apply_motion(vector, Instant::now())
    }

    pub fn apply_gimbal(&self, cmd: GimbalCmd) -> Result<GimbalState, CtrlError> {
        self.lock().apply_gimbal(cmd, Instant::now())
    }

    pub fn apply_toggle_slam(&self, active: bool) {
        self.lock().apply_toggle_slam(active, Instant::now())
    }

    pub fn recalibrate_imu(&self) -> Result<(), CtrlError> {
        self.lock().recalibrate_imu(Instant::now())
    }

    pub fn heartbeat(&self) {
        self.lock().heartbeat(Instant::now())
    }

    pub fn set_link(&self, up: bool) -> Option<MotionCommand> {
        self.lock().set_link(up, Instant::now())
    }

    // ---- COLLABORATOR INPUTS ----

    /// Called by the IMU task each tick, with `None` if no sample was read.
    pub fn tick_imu(&self, sample: Option<RawImuSample>) {
        self.lock().tick_imu(sample, Instant::now())
    }

    /// Called whenever SLAM produces a new pose.
    pub fn tick_pose(&self, pose: PoseEstimate) {
        self.lock().tick_pose(pose, Instant::now())
    }

    pub fn tick_watchdog(&self) -> Option<MotionCommand> {
        self.lock().tick_watchdog(Instant::now())
    }

    pub fn set_host_metrics(&self, metrics: HostMetrics) {
        self.lock().set_host_metrics(metrics)
    }

    pub fn set_camera_active(&self, active: bool) {
        self.lock().set_camera_active(active)
    }

    // ---- OUTPUTS ----

    /// Snapshot of the current state, taken under the lock so it is always
    /// self-consistent.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        tm_aggregator::build_snapshot(&self.lock(), Instant::now())
    }

    pub fn current_motion(&self) -> MotionCommand {
        self.lock().current_motion()
    }

    pub fn current_gimbal(&self) -> GimbalState {
        self.lock().current_gimbal()
    }

    pub fn slam_active(&self) -> bool {
        self.lock().slam_active
    }

    pub fn trajectory(&self) -> Vec<Vector3<f64>> {
        self.lock().trajectory()
    }
}
