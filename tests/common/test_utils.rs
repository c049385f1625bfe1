//! Test utilities and helper functions

use crate::common::mock_bus::MockBus;
use tracker_sensors::imu::icm45686::fifo::{HEADER_HIRES, PACKET_SIZE};
use tracker_sensors::{Icm45686Driver, Lis2mdlDriver};

/// Bus address of the simulated ICM-45686
pub const IMU_ADDRESS: u8 = 0x68;
/// Bus address of the simulated LIS2MDL
pub const MAG_ADDRESS: u8 = 0x1E;

/// Create an ICM-45686 driver on a mock bus
/// Returns (driver, bus) where bus is a clone that shares state with the driver
pub fn create_mock_imu() -> (Icm45686Driver<MockBus>, MockBus) {
    let bus = MockBus::new();
    bus.add_device(IMU_ADDRESS);
    bus.set_register(IMU_ADDRESS, 0x72, 0xE9);
    bus.enable_fifo(IMU_ADDRESS);
    let driver = Icm45686Driver::new(bus.clone(), IMU_ADDRESS);
    (driver, bus)
}

/// Create a LIS2MDL driver on a mock bus
/// Returns (driver, bus) where bus is a clone that shares state with the driver
pub fn create_mock_mag() -> (Lis2mdlDriver<MockBus>, MockBus) {
    let bus = MockBus::new();
    bus.add_device(MAG_ADDRESS);
    bus.set_register(MAG_ADDRESS, 0x4F, 0x40);
    let driver = Lis2mdlDriver::new(bus.clone(), MAG_ADDRESS);
    (driver, bus)
}

/// Encode a hi-res FIFO packet from raw 20-bit samples
///
/// `None` fills the channel with the "no data" sentinel.
pub fn fifo_packet(accel: Option<[i32; 3]>, gyro: Option<[i32; 3]>) -> [u8; PACKET_SIZE] {
    let mut packet = [0u8; PACKET_SIZE];
    packet[0] = HEADER_HIRES;
    for axis in 0..3 {
        match accel {
            Some(raw) => {
                let bits = (raw[axis] as u32) & 0xF_FFFF;
                packet[1 + axis * 2] = (bits >> 12) as u8;
                packet[2 + axis * 2] = (bits >> 4) as u8;
                packet[17 + axis] |= ((bits & 0xF) as u8) << 4;
            }
            None => packet[1 + axis * 2] = 0x80,
        }
        match gyro {
            Some(raw) => {
                let bits = (raw[axis] as u32) & 0xF_FFFF;
                packet[7 + axis * 2] = (bits >> 12) as u8;
                packet[8 + axis * 2] = (bits >> 4) as u8;
                packet[17 + axis] |= (bits & 0xF) as u8;
            }
            None => packet[7 + axis * 2] = 0x80,
        }
    }
    packet
}

/// Assert that two floating point values are approximately equal
pub fn assert_float_eq(a: f32, b: f32, epsilon: f32) {
    let diff = (a - b).abs();
    assert!(
        diff < epsilon,
        "Values not equal within epsilon: {} vs {} (diff: {}, epsilon: {})",
        a,
        b,
        diff,
        epsilon
    );
}
