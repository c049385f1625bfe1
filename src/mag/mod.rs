//! Magnetometer drivers

pub mod lis2mdl;
