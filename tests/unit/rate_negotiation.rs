//! Unit tests for ICM-45686 rate negotiation

use crate::common::test_utils::IMU_ADDRESS;
use crate::common::{MockBus, MockError, assert_float_eq, create_mock_imu};
use tracker_sensors::imu::icm45686::ODR_LADDER;
use tracker_sensors::{Error, Icm45686Driver, Imu, Periods, RateChange};

const PWR_MGMT0: u8 = 0x10;
const ACCEL_CONFIG0: u8 = 0x1B;
const GYRO_CONFIG0: u8 = 0x1C;

#[test]
fn test_init_write_sequence() {
    let (mut driver, bus) = create_mock_imu();

    let achieved = driver.init(0.0, Periods::new(0.0025, 0.0025)).unwrap();
    assert_eq!(achieved, Periods::new(1.0 / 400.0, 1.0 / 400.0));

    // Big endian switch, power, both configs, FIFO_CONFIG0, FIFO_CONFIG3
    assert_eq!(bus.write_count(), 6);
    assert_eq!(bus.writes_to(IMU_ADDRESS, 0x7C), vec![vec![0xA2, 0x67, 0x02]]);
    assert_eq!(bus.writes_to(IMU_ADDRESS, PWR_MGMT0), vec![vec![0x0F]]);
    assert_eq!(bus.writes_to(IMU_ADDRESS, ACCEL_CONFIG0), vec![vec![0x17]]);
    assert_eq!(bus.writes_to(IMU_ADDRESS, GYRO_CONFIG0), vec![vec![0x17]]);
    assert_eq!(bus.writes_to(IMU_ADDRESS, 0x1D), vec![vec![0x87]]);
    assert_eq!(bus.writes_to(IMU_ADDRESS, 0x21), vec![vec![0x0F]]);

    assert_eq!(bus.delays_us(), vec![250]);
    assert_eq!(bus.delays_ms(), vec![1]);
}

#[test]
fn test_non_positive_periods_turn_channels_off() {
    for period in [0.0, -0.0, -1.0, f32::NEG_INFINITY, f32::NAN] {
        let (mut driver, bus) = create_mock_imu();

        let update = driver.set_rate(Periods::new(period, period)).unwrap();
        assert_eq!(update.achieved.accel, 0.0);
        assert_eq!(update.achieved.gyro, 0.0);
        assert_eq!(bus.writes_to(IMU_ADDRESS, PWR_MGMT0), vec![vec![0x00]]);
        // No rate code is written for channels that are off
        assert!(bus.writes_to(IMU_ADDRESS, ACCEL_CONFIG0).is_empty());
        assert!(bus.writes_to(IMU_ADDRESS, GYRO_CONFIG0).is_empty());
    }
}

#[test]
fn test_infinite_gyro_period_is_standby() {
    let (mut driver, bus) = create_mock_imu();

    let update = driver.set_rate(Periods::new(0.0, f32::INFINITY)).unwrap();
    assert_eq!(update.achieved, Periods::OFF);
    // Gyro standby (1 << 2), accel off
    assert_eq!(bus.writes_to(IMU_ADDRESS, PWR_MGMT0), vec![vec![0x04]]);
}

#[test]
fn test_achieved_period_is_a_ladder_value() {
    let fastest = 1.0 / ODR_LADDER.fastest().hz;
    let slowest = 1.0 / ODR_LADDER.slowest().hz;

    for requested in [1e-6, 0.0001, 0.0003, 0.001, 0.0025, 0.004, 0.0123, 0.05, 0.3, 10.0, 1e6] {
        let (mut driver, _bus) = create_mock_imu();
        let update = driver.set_rate(Periods::new(requested, requested)).unwrap();

        for achieved in [update.achieved.accel, update.achieved.gyro] {
            assert!(
                ODR_LADDER.rungs().iter().any(|rung| achieved == 1.0 / rung.hz),
                "{requested} -> {achieved} is not a ladder period"
            );
            assert!(achieved >= fastest && achieved <= slowest);
        }
    }
}

#[test]
fn test_rounds_down_to_supported_rate() {
    let (mut driver, _bus) = create_mock_imu();

    // 300 Hz is not supported, the next slower rate is 200 Hz
    let update = driver.set_rate(Periods::new(1.0 / 300.0, 1.0 / 300.0)).unwrap();
    assert_float_eq(update.achieved.accel, 1.0 / 200.0, 1e-9);
    assert_float_eq(update.achieved.gyro, 1.0 / 200.0, 1e-9);
}

#[test]
fn test_repeated_request_writes_nothing() {
    let (mut driver, bus) = create_mock_imu();
    let achieved = driver.init(0.0, Periods::new(0.0025, 0.001)).unwrap();
    bus.clear_operations();

    let update = driver.set_rate(Periods::new(0.0025, 0.001)).unwrap();
    assert_eq!(update.change, RateChange::Unchanged);
    assert_eq!(update.achieved, achieved);
    assert_eq!(bus.write_count(), 0);

    // Feeding the achieved periods back maps to the same codes
    let update = driver.set_rate(achieved).unwrap();
    assert_eq!(update.change, RateChange::Unchanged);
    assert_eq!(bus.write_count(), 0);
}

#[test]
fn test_rate_change_writes_only_that_channel() {
    let (mut driver, bus) = create_mock_imu();
    driver.init(0.0, Periods::new(0.0025, 0.0025)).unwrap();
    bus.clear_operations();

    let update = driver.set_rate(Periods::new(0.005, 0.0025)).unwrap();
    assert_eq!(update.change, RateChange::Applied);
    assert_eq!(bus.write_count(), 1);
    assert_eq!(bus.writes_to(IMU_ADDRESS, ACCEL_CONFIG0), vec![vec![0x18]]);
}

#[test]
fn test_mode_change_writes_power_register() {
    let (mut driver, bus) = create_mock_imu();
    driver.init(0.0, Periods::new(0.0025, 0.0025)).unwrap();
    bus.clear_operations();

    let update = driver.set_rate(Periods::new(0.0025, 0.0)).unwrap();
    assert_eq!(update.change, RateChange::Applied);
    assert_eq!(update.achieved.gyro, 0.0);
    assert_eq!(bus.write_count(), 1);
    assert_eq!(bus.writes_to(IMU_ADDRESS, PWR_MGMT0), vec![vec![0x03]]);

    // Turning the gyro back on at its previous rate only needs the power write
    bus.clear_operations();
    driver.set_rate(Periods::new(0.0025, 0.0025)).unwrap();
    assert_eq!(bus.write_count(), 1);
    assert_eq!(bus.writes_to(IMU_ADDRESS, PWR_MGMT0), vec![vec![0x0F]]);
}

#[test]
fn test_failed_write_is_retried_next_time() {
    let (mut driver, bus) = create_mock_imu();
    driver.init(0.0, Periods::new(0.0025, 0.0025)).unwrap();
    bus.clear_operations();

    // Accel config is the first write of this negotiation
    bus.fail_next_write();
    let result = driver.set_rate(Periods::new(0.005, 0.005));
    assert!(matches!(result, Err(Error::Bus(MockError::Communication))));
    // The gyro write was still attempted
    assert_eq!(bus.write_count(), 2);

    bus.clear_operations();
    let update = driver.set_rate(Periods::new(0.005, 0.005)).unwrap();
    assert_eq!(update.change, RateChange::Applied);
    assert_eq!(bus.write_count(), 1);
    assert_eq!(bus.writes_to(IMU_ADDRESS, ACCEL_CONFIG0), vec![vec![0x18]]);
}

#[test]
fn test_external_clock_scales_rates() {
    let (mut driver, bus) = create_mock_imu();

    let achieved = driver.init(32_768.0, Periods::new(0.0025, 0.0)).unwrap();
    assert_float_eq(driver.clock_scale(), 1.024, 1e-6);

    // 400 Hz would run at 409.6 Hz, faster than requested
    assert_float_eq(achieved.accel, 1.0 / 200.0 / 1.024, 1e-9);
    assert_eq!(bus.writes_to(IMU_ADDRESS, 0x31), vec![vec![0x06]]);
    assert_eq!(bus.writes_to(IMU_ADDRESS, 0x26), vec![vec![0x20]]);
}

#[test]
fn test_fifo_multiplier_uses_slower_channel() {
    let (mut driver, _bus) = create_mock_imu();

    driver.set_rate(Periods::new(0.01, 0.0)).unwrap();
    assert_float_eq(driver.fifo_multiplier(), 0.000_75 / 0.01, 1e-6);

    driver.set_rate(Periods::new(0.01, 0.0025)).unwrap();
    assert_float_eq(driver.fifo_multiplier(), 0.000_75 / 0.01, 1e-6);

    driver.set_rate(Periods::new(0.0025, 0.0025)).unwrap();
    assert_eq!(driver.fifo_multiplier(), 0.0);

    driver.set_rate(Periods::OFF).unwrap();
    assert_eq!(driver.fifo_multiplier(), 0.0);
}

#[test]
fn test_fifo_factor_follows_bus_kind() {
    let bus = MockBus::spi();
    bus.add_device(IMU_ADDRESS);
    let mut driver = Icm45686Driver::new(bus, IMU_ADDRESS);

    driver.set_rate(Periods::new(0.01, 0.0)).unwrap();
    assert_float_eq(driver.fifo_multiplier(), 0.000_1 / 0.01, 1e-6);
}

#[test]
fn test_full_scale_is_fixed() {
    let (mut driver, bus) = create_mock_imu();
    let scale = driver.set_full_scale(tracker_sensors::FullScale {
        accel_g: 2.0,
        gyro_dps: 250.0,
    });
    assert_eq!(scale.accel_g, 32.0);
    assert_eq!(scale.gyro_dps, 4000.0);
    assert_eq!(bus.write_count(), 0);
}
