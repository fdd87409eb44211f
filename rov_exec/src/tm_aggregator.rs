//! # Telemetry aggregator
//!
//! Builds telemetry snapshots from the data store. Snapshots are built on
//! the aggregator's own cadence and never wait for new data: if no pose has
//! arrived since the last snapshot the previous one is republished with its
//! age increased.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Instant;

use chrono::Utc;
use log::trace;
use nalgebra::Vector3;
use serde::Deserialize;

use comms_if::{
    eqpt::slam::EulerAngles,
    tm::{ImuTm, PoseTm, StatusTm, TelemetrySnapshot}
};
use util::time::seconds_since;

use crate::{data_store::DataStore, rov_ctrl::RovCtrl};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Time without a pose, while SLAM is active, after which the pose is
    /// reported as stale
    ///
    /// Units: seconds
    pub pose_stale_s: f64,

    /// Number of past positions kept in the trajectory
    pub trajectory_len: usize
}

/// Numbers the snapshots and tracks which pose was last published.
#[derive(Debug, Default)]
pub struct TmAggregator {
    seq: u64,
    last_pose_seq: u64
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            pose_stale_s: 1.0,
            trajectory_len: 100
        }
    }
}

impl Params {
    pub fn check(&self) -> Result<(), String> {
        if !(self.pose_stale_s > 0.0 && self.pose_stale_s.is_finite()) {
            return Err(format!("pose_stale_s must be positive, found {}", self.pose_stale_s))
        }
        if self.trajectory_len == 0 {
            return Err("trajectory_len must be at least 1".into())
        }

        Ok(())
    }
}

impl TmAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a snapshot and number it for publication.
    pub fn aggregate(&mut self, ctrl: &RovCtrl) -> TelemetrySnapshot {
        self.stamp(ctrl.snapshot())
    }

    /// Number a snapshot and mark whether its pose is new since the last one.
    pub fn stamp(&mut self, mut snapshot: TelemetrySnapshot) -> TelemetrySnapshot {
        self.seq += 1;
        snapshot.seq = self.seq;

        snapshot.pose.fresh = snapshot.pose.update_seq != self.last_pose_seq;
        self.last_pose_seq = snapshot.pose.update_seq;

        trace!(
            "TM {}: pose update {} (fresh: {}), age {:?}",
            snapshot.seq,
            snapshot.pose.update_seq,
            snapshot.pose.fresh,
            snapshot.pose.age_s
        );

        snapshot
    }
}

/// Build a snapshot of the store.
///
/// The sequence number is left at zero and the pose is not marked fresh, the
/// [`TmAggregator`] fills these in on publication.
pub fn build_snapshot(ds: &DataStore, now: Instant) -> TelemetrySnapshot {
    let imu = match ds.imu_cal.latest() {
        Some((reading, at)) => ImuTm::from_reading(Some(&reading), Some(seconds_since(at, now))),
        None => ImuTm::from_reading(None, None)
    };

    let pose = match ds.pose {
        Some(ref p) => PoseTm {
            position_m: p.position_m,
            orientation: p.orientation,
            age_s: ds.pose_received_at.map(|t| seconds_since(t, now)),
            update_seq: ds.pose_update_seq,
            fresh: false,
            stale: ds.pose_is_stale(now)
        },
        None => PoseTm {
            position_m: Vector3::zeros(),
            orientation: EulerAngles::default(),
            age_s: None,
            update_seq: 0,
            fresh: false,
            stale: ds.pose_is_stale(now)
        }
    };

    let cal = ds.imu_cal.calibration();

    let status = StatusTm {
        connected: ds.connected,
        camera_active: ds.camera_active,
        imu_calibrated: cal.calibrated,
        imu_degraded: cal.degraded,
        slam_active: ds.slam_active,
        watchdog_tripped: ds.watchdog.is_tripped(),
        motion_rejected: ds.motion_rejected,
        cpu_usage_pct: ds.host_metrics.cpu_usage_pct,
        mem_usage_pct: ds.host_metrics.mem_usage_pct,
        battery_pct: ds.host_metrics.battery_pct,
        faults: ds.faults(now)
    };

    TelemetrySnapshot {
        seq: 0,
        timestamp: Utc::now(),
        imu,
        pose,
        motion: ds.current_motion(),
        gimbal: ds.current_gimbal(),
        status
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    use comms_if::{eqpt::{imu::RawImuSample, slam::PoseEstimate}, tm::Fault};
    use crate::params::RovExecParams;

    #[test]
    fn test_snapshot_before_any_data() {
        let t0 = Instant::now();
        let ds = DataStore::new(&RovExecParams::default(), t0).unwrap();

        let snap = build_snapshot(&ds, t0);

        assert!(!snap.imu.valid);
        assert_eq!(snap.imu.accel_g, Vector3::zeros());
        assert_eq!(snap.pose.age_s, None);
        assert!(!snap.status.imu_calibrated);
        assert!(!snap.status.connected);
        assert!(snap.status.watchdog_tripped);
        assert!(snap.status.faults.contains(&Fault::NotCalibrated));
        assert!(snap.motion.is_stop());
        assert_eq!(snap.gimbal.pan_angle, 80.0);

        // Must serialise for the transport
        assert!(snap.to_json().is_ok());
    }

    #[test]
    fn test_republishes_pose_with_increasing_age() {
        let t0 = Instant::now();
        let mut ds = DataStore::new(&RovExecParams::default(), t0).unwrap();
        let mut agg = TmAggregator::new();

        ds.apply_toggle_slam(true, t0);
        ds.tick_pose(
            PoseEstimate::new(
                Utc::now(),
                Vector3::new(1.0, 2.0, 0.0),
                EulerAngles { roll_deg: 0.0, pitch_deg: 0.0, yaw_deg: 90.0 }
            ),
            t0
        );

        let first = agg.stamp(build_snapshot(&ds, t0 + Duration::from_millis(200)));
        let second = agg.stamp(build_snapshot(&ds, t0 + Duration::from_millis(400)));
        let third = agg.stamp(build_snapshot(&ds, t0 + Duration::from_millis(1400)));

        assert_eq!((first.seq, second.seq, third.seq), (1, 2, 3));

        assert!(first.pose.fresh);
        assert!(!second.pose.fresh);
        assert_eq!(first.pose.position_m, second.pose.position_m);
        assert_eq!(first.pose.orientation, second.pose.orientation);
        assert!(second.pose.age_s.unwrap() > first.pose.age_s.unwrap());

        assert!(!second.pose.stale);
        assert!(third.pose.stale);
        assert!(third.status.faults.contains(&Fault::StaleUpstream));
    }

    #[test]
    fn test_imu_reading_in_snapshot() {
        let t0 = Instant::now();
        let mut ds = DataStore::new(&RovExecParams::default(), t0).unwrap();

        for _ in 0..51 {
            ds.tick_imu(
                Some(RawImuSample {
                    timestamp: Utc::now(),
                    accel_g: Vector3::new(0.0, 0.0, 1.0),
                    gyro_degs: Vector3::new(1.0, 1.0, 1.0),
                    temp_c: Some(30.0)
                }),
                t0
            );
        }

        let snap = build_snapshot(&ds, t0 + Duration::from_millis(100));

        assert!(snap.imu.valid);
        assert!(snap.status.imu_calibrated);
        assert!(!snap.status.imu_degraded);
        assert!((snap.imu.accel_g - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-9);
        assert!(snap.imu.gyro_degs.norm() < 1e-9);
        assert_eq!(snap.imu.temp_c, Some(30.0));
        assert!((snap.imu.age_s.unwrap() - 0.1).abs() < 1e-9);
    }
}
