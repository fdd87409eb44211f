//! # Data Store
//!
//! All mutable state of the control core. The store is only ever accessed
//! through the [`RovCtrl`](crate::rov_ctrl::RovCtrl) handle, which holds it
//! behind a single lock, so every operation here is atomic with respect to
//! the others.
//!
//! Operations take the current time as an argument rather than reading the
//! clock themselves.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{collections::VecDeque, time::Instant};

use chrono::Utc;
use log::{debug, info, warn};
use nalgebra::Vector3;

use comms_if::{
    eqpt::{
        imu::RawImuSample,
        mech::{GimbalState, MotionCommand},
        slam::PoseEstimate
    },
    tc::{GimbalCmd, JoystickVector},
    tm::{Fault, HostMetrics}
};
use util::module::State;

use crate::{
    gimbal_ctrl::{GimbalCtrl, GimbalCtrlError},
    imu_cal::{self, ImuCal, ImuCalError},
    loco_ctrl::{self, LocoCtrl, LocoCtrlError},
    params::RovExecParams,
    tm_aggregator,
    watchdog::{TripCause, Watchdog, WatchdogState}
};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Errors returned by control operations. None of these are fatal, they are
/// reported back to the operator and surfaced in telemetry.
#[derive(Debug, thiserror::Error)]
pub enum CtrlError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Motion rejected, the IMU is not calibrated")]
    NotCalibrated,

    #[error("LocoCtrl error: {0}")]
    LocoCtrl(LocoCtrlError),

    #[error("GimbalCtrl error: {0}")]
    GimbalCtrl(GimbalCtrlError),

    #[error("ImuCal error: {0}")]
    ImuCal(ImuCalError),
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the control core.
pub struct DataStore {
    // Modules
    pub(crate) loco_ctrl: LocoCtrl,
    pub(crate) gimbal_ctrl: GimbalCtrl,
    pub(crate) imu_cal: ImuCal,
    pub(crate) watchdog: Watchdog,

    pub(crate) tm_params: tm_aggregator::Params,

    // Motion
    /// Command currently applied to the wheels
    pub(crate) motion: MotionCommand,

    /// The last motion command was rejected
    pub(crate) motion_rejected: bool,

    /// The last command was malformed or out of range
    pub(crate) invalid_input: bool,

    /// Number of stops forced by the watchdog
    pub(crate) num_stop_pulses: u64,

    // Connection
    pub(crate) connected: bool,

    // Pose
    pub(crate) slam_active: bool,
    pub(crate) slam_activated_at: Option<Instant>,
    pub(crate) pose: Option<PoseEstimate>,
    pub(crate) pose_received_at: Option<Instant>,

    /// Number of poses received
    pub(crate) pose_update_seq: u64,

    /// Most recent positions, oldest first
    pub(crate) trajectory: VecDeque<Vector3<f64>>,

    // Status
    pub(crate) camera_active: bool,
    pub(crate) host_metrics: HostMetrics,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Create the store, initialising all modules and starting the initial
    /// IMU calibration.
    pub fn new(params: &RovExecParams, now: Instant) -> Result<Self, CtrlError> {
        let mut loco_ctrl = LocoCtrl::default();
        loco_ctrl.init(params.loco_ctrl.clone())
            .map_err(CtrlError::LocoCtrl)?;

        let mut gimbal_ctrl = GimbalCtrl::default();
        gimbal_ctrl.init(params.gimbal_ctrl.clone())
            .map_err(CtrlError::GimbalCtrl)?;

        let mut imu_cal = ImuCal::default();
        imu_cal.init(params.imu_cal.clone())
            .map_err(CtrlError::ImuCal)?;
        imu_cal.begin(now)
            .map_err(CtrlError::ImuCal)?;

        Ok(Self {
            loco_ctrl,
            gimbal_ctrl,
            imu_cal,
            watchdog: Watchdog::new(&params.watchdog),
            tm_params: params.tm.clone(),
            motion: MotionCommand::stop(Utc::now()),
            motion_rejected: false,
            invalid_input: false,
            num_stop_pulses: 0,
            connected: false,
            slam_active: false,
            slam_activated_at: None,
            pose: None,
            pose_received_at: None,
            pose_update_seq: 0,
            trajectory: VecDeque::with_capacity(params.tm.trajectory_len),
            camera_active: false,
            host_metrics: HostMetrics::default(),
        })
    }

    // ---- COMMANDS ----

    /// Apply a motion demand.
    ///
    /// Out of range components are limited and flagged. While the IMU is not
    /// calibrated the demand counts towards liveness but the rover is held
    /// stopped.
    pub fn apply_motion(&mut self, vector: JoystickVector, now: Instant)
        -> Result<MotionCommand, CtrlError>
    {
        if !vector.is_finite() {
            self.invalid_input = true;
            return Err(CtrlError::InvalidInput(format!("non-finite motion {:?}", vector)))
        }

        self.command_received(now);
        self.invalid_input = !vector.is_in_range();

        if !self.imu_cal.calibration().calibrated || self.imu_cal.is_calibrating() {
            if !self.motion_rejected {
                warn!("Motion rejected until IMU calibration completes");
            }
            self.motion_rejected = true;
            return Err(CtrlError::NotCalibrated)
        }

        let (output, _) = self.loco_ctrl
            .proc(&loco_ctrl::InputData {
                vector,
                timestamp: Utc::now()
            })
            .map_err(CtrlError::LocoCtrl)?;

        self.motion = output;
        self.motion_rejected = false;

        Ok(output)
    }

    /// Apply a gimbal demand.
    pub fn apply_gimbal(&mut self, cmd: GimbalCmd, now: Instant)
        -> Result<GimbalState, CtrlError>
    {
        if let GimbalCmd::Move(v) = cmd {
            if !v.is_finite() {
                self.invalid_input = true;
                return Err(CtrlError::InvalidInput(format!("non-finite gimbal {:?}", v)))
            }
            self.invalid_input = !v.is_in_range();
        }
        else {
            self.invalid_input = false;
        }

        self.command_received(now);

        let (state, _) = self.gimbal_ctrl
            .proc(&cmd)
            .map_err(CtrlError::GimbalCtrl)?;

        Ok(state)
    }

    /// Start or stop SLAM.
    pub fn apply_toggle_slam(&mut self, active: bool, now: Instant) {
        self.command_received(now);
        self.invalid_input = false;

        if active != self.slam_active {
            info!("SLAM {}", if active { "activated" } else { "deactivated" });
        }

        if active && !self.slam_active {
            self.slam_activated_at = Some(now);
        }
        self.slam_active = active;
    }

    /// Start a new IMU calibration, stopping the rover while it runs.
    pub fn recalibrate_imu(&mut self, now: Instant) -> Result<(), CtrlError> {
        self.imu_cal.begin(now).map_err(CtrlError::ImuCal)?;

        self.motion = self.loco_ctrl.make_safe(Utc::now());

        Ok(())
    }

    /// Record a heartbeat from the operator.
    ///
    /// The rover only reports itself connected while the watchdog is armed,
    /// so a heartbeat after a trip leaves it disconnected until the next
    /// command.
    pub fn heartbeat(&mut self, now: Instant) {
        self.watchdog.heartbeat(now);
        self.connected = !self.watchdog.is_tripped();
    }

    /// Record a link state change reported by the transport. Losing the link
    /// trips the watchdog straight away.
    pub fn set_link(&mut self, up: bool, now: Instant) -> Option<MotionCommand> {
        info!("Link to operator {}", if up { "established" } else { "lost" });

        self.watchdog.set_link(up, now);

        if up {
            self.connected = !self.watchdog.is_tripped();
            None
        }
        else {
            self.connected = false;
            self.tick_watchdog(now)
        }
    }

    fn command_received(&mut self, now: Instant) {
        self.watchdog.feed(now);
        self.connected = true;
    }

    // ---- PERIODIC ----

    /// Process a new raw IMU sample, or check the calibration deadline if
    /// there isn't one.
    pub fn tick_imu(&mut self, sample: Option<RawImuSample>, now: Instant) {
        match self.imu_cal.proc(&imu_cal::InputData { sample, now }) {
            Ok((_, rpt)) => {
                if rpt.completed.is_some() && self.motion_rejected {
                    debug!("IMU calibrated, motion commands will now be accepted");
                }
            },
            Err(e) => warn!("Error during ImuCal processing: {}", e)
        }
    }

    /// Store a new pose estimate from SLAM. The latest pose always wins.
    pub fn tick_pose(&mut self, pose: PoseEstimate, now: Instant) {
        if self.trajectory.len() >= self.tm_params.trajectory_len {
            self.trajectory.pop_front();
        }
        self.trajectory.push_back(pose.position_m);

        self.pose = Some(pose);
        self.pose_received_at = Some(now);
        self.pose_update_seq += 1;
    }

    /// Run the watchdog check, forcing a stop if it tripped.
    ///
    /// Returns the stop command on the check where the watchdog trips, and
    /// `None` otherwise.
    pub fn tick_watchdog(&mut self, now: Instant) -> Option<MotionCommand> {
        let cause = self.watchdog.check(now)?;

        self.motion = self.loco_ctrl.make_safe(Utc::now());
        self.connected = false;
        self.num_stop_pulses += 1;

        warn!("Rover stopped by watchdog ({:?})", cause);

        Some(self.motion)
    }

    // ---- STATUS ----

    pub fn set_host_metrics(&mut self, metrics: HostMetrics) {
        self.host_metrics = metrics;
    }

    pub fn set_camera_active(&mut self, active: bool) {
        self.camera_active = active;
    }

    pub fn current_motion(&self) -> MotionCommand {
        self.motion
    }

    pub fn current_gimbal(&self) -> GimbalState {
        self.gimbal_ctrl.state()
    }

    pub fn trajectory(&self) -> Vec<Vector3<f64>> {
        self.trajectory.iter().copied().collect()
    }

    /// Age of the pose, or of the SLAM activation if no pose has arrived
    /// since, is beyond the staleness threshold.
    pub fn pose_is_stale(&self, now: Instant) -> bool {
        if !self.slam_active {
            return false
        }

        let last = match (self.pose_received_at, self.slam_activated_at) {
            (Some(p), Some(a)) => p.max(a),
            (Some(p), None) => p,
            (None, Some(a)) => a,
            (None, None) => return false
        };

        util::time::seconds_since(last, now) > self.tm_params.pose_stale_s
    }

    /// All currently active faults.
    pub fn faults(&self, now: Instant) -> Vec<Fault> {
        let mut faults = Vec::new();
        let cal = self.imu_cal.calibration();

        if self.invalid_input {
            faults.push(Fault::InvalidInput);
        }
        if !cal.calibrated || self.imu_cal.is_calibrating() {
            faults.push(Fault::NotCalibrated);
        }
        if cal.degraded {
            faults.push(Fault::CalibrationDegraded);
        }
        if self.pose_is_stale(now) {
            faults.push(Fault::StaleUpstream);
        }
        match self.watchdog.state() {
            WatchdogState::Tripped(TripCause::CommandTimeout)
            | WatchdogState::Tripped(TripCause::LinkLost) => faults.push(Fault::ConnectionLost),
            _ => ()
        }

        faults
    }
}
