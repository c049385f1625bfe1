//! IMU drivers

pub mod icm45686;
