//! Unit tests for the LIS2MDL magnetometer driver

use crate::common::test_utils::MAG_ADDRESS;
use crate::common::{MockError, assert_float_eq, create_mock_mag};
use tracker_sensors::{Error, Magnetometer, RateChange};

const CFG_REG_A: u8 = 0x60;

/// Simulate the chip finishing a single measurement
fn complete_oneshot(bus: &crate::common::MockBus) {
    let value = bus.get_register(MAG_ADDRESS, CFG_REG_A);
    bus.set_register(MAG_ADDRESS, CFG_REG_A, value | 0b11);
}

#[test]
fn test_verify_identity() {
    let (mut driver, bus) = create_mock_mag();
    assert!(driver.verify_identity().is_ok());

    bus.set_register(MAG_ADDRESS, 0x4F, 0x41);
    assert!(matches!(driver.verify_identity(), Err(Error::InvalidDevice(0x41))));
}

#[test]
fn test_init_selects_continuous_mode() {
    let (mut driver, bus) = create_mock_mag();

    let achieved = driver.init(0.01).unwrap();
    assert_float_eq(achieved, 0.01, 1e-9);
    // Continuous, 100 Hz
    assert_eq!(bus.writes_to(MAG_ADDRESS, CFG_REG_A), vec![vec![0x0C]]);
}

#[test]
fn test_rate_rounds_down() {
    let (mut driver, bus) = create_mock_mag();

    let update = driver.set_rate(1.0 / 30.0).unwrap();
    assert_float_eq(update.achieved, 1.0 / 20.0, 1e-9);
    assert_eq!(bus.writes_to(MAG_ADDRESS, CFG_REG_A), vec![vec![0x04]]);

    // Slower than the slowest rung clamps to 10 Hz
    let update = driver.set_rate(5.0).unwrap();
    assert_float_eq(update.achieved, 0.1, 1e-9);
}

#[test]
fn test_repeated_request_writes_nothing() {
    let (mut driver, bus) = create_mock_mag();
    driver.init(0.02).unwrap();
    bus.clear_operations();

    let update = driver.set_rate(0.02).unwrap();
    assert_eq!(update.change, RateChange::Unchanged);
    assert_eq!(bus.write_count(), 0);
}

#[test]
fn test_idle_is_distinct_from_10hz() {
    let (mut driver, bus) = create_mock_mag();

    // Idle keeps the last rate code (10 Hz is code 0)
    driver.set_rate(0.1).unwrap();
    let update = driver.set_rate(0.0).unwrap();
    assert_eq!(update.achieved, 0.0);
    assert_eq!(update.change, RateChange::Applied);

    let update = driver.set_rate(0.1).unwrap();
    assert_eq!(update.change, RateChange::Applied);
    assert_eq!(
        bus.writes_to(MAG_ADDRESS, CFG_REG_A),
        vec![vec![0x00], vec![0x03], vec![0x00]]
    );

    // Standby idles the chip as well
    let update = driver.set_rate(f32::INFINITY).unwrap();
    assert_eq!(update.achieved, 0.0);
    assert_eq!(bus.get_register(MAG_ADDRESS, CFG_REG_A), 0x03);
}

#[test]
fn test_oneshot_measurement() {
    let (mut driver, bus) = create_mock_mag();
    driver.init(0.0).unwrap();

    // X = 1000, Y = -1000, Z = 0 (little endian)
    for (offset, byte) in [0xE8, 0x03, 0x18, 0xFC, 0x00, 0x00].into_iter().enumerate() {
        bus.set_register(MAG_ADDRESS, 0x68 + offset as u8, byte);
    }

    driver.trigger_oneshot().unwrap();
    assert_eq!(bus.get_register(MAG_ADDRESS, CFG_REG_A) & 0b11, 0b01);
    complete_oneshot(&bus);

    let field = driver.read_mag().unwrap();
    assert_float_eq(field[0], 1.5, 1e-6);
    assert_float_eq(field[1], -1.5, 1e-6);
    assert_float_eq(field[2], 0.0, 1e-6);

    // The chip went back to idle on its own; asking for idle again is free
    bus.clear_operations();
    let update = driver.set_rate(0.0).unwrap();
    assert_eq!(update.change, RateChange::Unchanged);
    assert_eq!(bus.write_count(), 0);
}

#[test]
fn test_oneshot_timeout() {
    let (mut driver, bus) = create_mock_mag();
    driver.init(0.0).unwrap();

    driver.trigger_oneshot().unwrap();
    assert!(matches!(driver.read_mag(), Err(Error::Timeout)));
    assert_eq!(bus.delays_ms().len(), 50);

    // A late completion is still picked up
    complete_oneshot(&bus);
    assert!(driver.read_mag().is_ok());
}

#[test]
fn test_continuous_read_does_not_poll() {
    let (mut driver, bus) = create_mock_mag();
    driver.init(0.01).unwrap();
    bus.clear_operations();

    driver.read_mag().unwrap();
    assert_eq!(bus.registers_read(MAG_ADDRESS), vec![0x68]);
}

#[test]
fn test_temperature() {
    let (mut driver, bus) = create_mock_mag();
    // 200 LSB at 8 LSB/°C
    bus.set_register(MAG_ADDRESS, 0x6E, 0xC8);
    bus.set_register(MAG_ADDRESS, 0x6F, 0x00);
    assert_float_eq(driver.read_temperature().unwrap(), 25.0, 1e-6);
}

#[test]
fn test_shutdown_soft_resets() {
    let (mut driver, bus) = create_mock_mag();
    driver.init(0.01).unwrap();
    driver.shutdown().unwrap();
    assert_eq!(bus.get_register(MAG_ADDRESS, CFG_REG_A), 0x20);

    // Configuration is rewritten after a reset
    bus.clear_operations();
    driver.set_rate(0.01).unwrap();
    assert_eq!(bus.write_count(), 1);
}

#[test]
fn test_write_failure_forces_rewrite() {
    let (mut driver, bus) = create_mock_mag();
    bus.fail_next_write();
    assert!(matches!(driver.init(0.01), Err(Error::Bus(MockError::Communication))));

    bus.clear_operations();
    let update = driver.set_rate(0.01).unwrap();
    assert_eq!(update.change, RateChange::Applied);
    assert_eq!(bus.write_count(), 1);
}

#[test]
fn test_decode_sample() {
    let (driver, _bus) = create_mock_mag();
    assert_eq!(driver.sample_len(), 6);

    let field = driver.decode_sample(&[0x00, 0x00, 0xE8, 0x03, 0x00, 0x00, 0xFF]).unwrap();
    assert_float_eq(field[1], 1.5, 1e-6);
    assert!(driver.decode_sample(&[0x00; 5]).is_none());
}
