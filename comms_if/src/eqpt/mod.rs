//! # Equipment data definitions

pub mod imu;
pub mod mech;
pub mod slam;
