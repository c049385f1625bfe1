//! Integration tests for the boot-to-streaming workflow

use crate::common::{MockBus, assert_float_eq, fifo_packet};
use tracker_sensors::imu::icm45686::fifo::PACKET_SIZE;
use tracker_sensors::interface::Transport;
use tracker_sensors::registry::{IMU_PROBE_TABLE, MAG_PROBE_TABLE};
use tracker_sensors::retained::RETAINED_SIZE;
use tracker_sensors::{
    BuildIdentity, BusDescriptor, FifoBatch, Imu, ImuDriver, ImuType, Magnetometer, MagDriver,
    MagType, Periods, Pull, RateChange, RetainedState, Sense, identify,
};

const IMU_ADDRESS: u8 = 0x69;
const MAG_ADDRESS: u8 = 0x1E;
const BUILD: BuildIdentity = BuildIdentity::from_parts(2025, 1, 20, 8, 0, 0);

/// A tracker board with an ICM-45686 and a LIS2MDL on one bus
fn tracker_board() -> MockBus {
    let bus = MockBus::new();
    bus.add_device(IMU_ADDRESS);
    bus.set_register(IMU_ADDRESS, 0x72, 0xE9);
    bus.enable_fifo(IMU_ADDRESS);
    bus.add_device(MAG_ADDRESS);
    bus.set_register(MAG_ADDRESS, 0x4F, 0x40);
    bus
}

#[test]
fn test_complete_boot_workflow() {
    let mut bus = tracker_board();
    let clock = bus.clone();
    let mut memory = [0u8; RETAINED_SIZE];

    bus.set_ticks(10);
    let mut retained = RetainedState::new(&mut memory, || clock.monotonic_ticks(), BUILD);
    assert!(!retained.validate());

    // Identify both roles on the shared bus
    let mut imu_role = BusDescriptor::new();
    let mut mag_role = BusDescriptor::new();
    let imu_kind = identify(&mut bus, &mut imu_role, &IMU_PROBE_TABLE).unwrap();
    let mag_kind = identify(&mut bus, &mut mag_role, &MAG_PROBE_TABLE).unwrap();
    assert_eq!(imu_kind, ImuType::Icm45686);
    assert_eq!(mag_kind, MagType::Lis2mdl);
    assert_eq!((imu_role.address, imu_role.register), (IMU_ADDRESS, 0x72));
    assert_eq!((mag_role.address, mag_role.register), (MAG_ADDRESS, 0x4F));

    // Bring up the drivers
    let mut imu = ImuDriver::new(imu_kind, bus.clone(), imu_role.address);
    if let ImuDriver::Icm45686(driver) = &mut imu {
        driver.verify_identity().unwrap();
    }
    let achieved = imu.init(0.0, Periods::new(0.0025, 0.0025)).unwrap();
    assert_eq!(achieved, Periods::new(1.0 / 400.0, 1.0 / 400.0));

    let mut mag = MagDriver::new(mag_kind, bus.clone(), mag_role.address);
    assert_float_eq(mag.init(0.01).unwrap(), 0.01, 1e-9);

    // Stream FIFO data and apply the retained calibration
    for i in 1..=4 {
        bus.push_fifo_packet(fifo_packet(Some([0, 0, 16_384]), Some([131_072 * i / 4, 0, 0])));
    }
    let mut buffer = [0u8; PACKET_SIZE * 16];
    let packets = imu.read_fifo(&mut buffer).unwrap();
    let batch: FifoBatch<16> = imu.decode_fifo(&buffer, packets);
    assert_eq!(batch.samples.len(), 4);

    let scale = retained.gyro_sens_scale();
    let last = batch.samples[3];
    assert_float_eq(last.accel[2], 1.0, 1e-6);
    assert_float_eq(last.gyro[0] * scale[0], 1000.0, 1e-3);

    // Persist uptime
    bus.set_ticks(1_010);
    retained.update();
    assert_eq!(retained.uptime_sum(), 1_000);
}

#[test]
fn test_second_boot_uses_stored_descriptors() {
    let mut bus = tracker_board();

    let mut imu_role = BusDescriptor::new();
    identify(&mut bus, &mut imu_role, &IMU_PROBE_TABLE).unwrap();

    // The resolved address and register are saved and used on the next boot
    bus.clear_operations();
    let mut imu_role = BusDescriptor::with_preference(imu_role.address, imu_role.register);
    assert_eq!(
        identify(&mut bus, &mut imu_role, &IMU_PROBE_TABLE),
        Some(ImuType::Icm45686)
    );
    assert_eq!(bus.read_addresses(), vec![IMU_ADDRESS]);
    assert_eq!(bus.registers_read(IMU_ADDRESS), vec![0x00, 0x72]);
}

#[test]
fn test_retained_state_survives_warm_reset() {
    let bus = tracker_board();
    let clock = bus.clone();
    let mut memory = [0u8; RETAINED_SIZE];

    {
        let mut retained = RetainedState::new(&mut memory, || clock.monotonic_ticks(), BUILD);
        retained.validate();
        retained.set_gyro_sens_scale([1.01, 1.0, 0.99]);
        bus.set_ticks(5_000);
        retained.update();
    }

    // Warm reset: ticks restart
    bus.set_ticks(3);
    let mut retained = RetainedState::new(&mut memory, || clock.monotonic_ticks(), BUILD);
    assert!(retained.validate());
    assert_eq!(retained.gyro_sens_scale(), [1.01, 1.0, 0.99]);
    assert_eq!(retained.uptime_sum(), 5_000);

    bus.set_ticks(1_003);
    retained.update();
    assert_eq!(retained.uptime_sum(), 6_000);

    // A firmware update discards the block
    let other = BuildIdentity::from_parts(2025, 2, 1, 8, 0, 0);
    let mut retained = RetainedState::new(&mut memory, || clock.monotonic_ticks(), other);
    assert!(!retained.validate());
    assert_eq!(retained.uptime_sum(), 0);
}

#[test]
fn test_single_shot_reads() {
    let bus = tracker_board();
    // Accel Z = 2048 (1 g at ±16 g), gyro X = 16384 (1000 °/s at ±2000 °/s)
    bus.set_register(IMU_ADDRESS, 0x04, 0x08);
    bus.set_register(IMU_ADDRESS, 0x05, 0x00);
    bus.set_register(IMU_ADDRESS, 0x06, 0x40);
    bus.set_register(IMU_ADDRESS, 0x07, 0x00);
    // Temperature 3200 LSB = 50 °C
    bus.set_register(IMU_ADDRESS, 0x0C, 0x0C);
    bus.set_register(IMU_ADDRESS, 0x0D, 0x80);

    let mut imu = ImuDriver::new(ImuType::Icm45686, bus.clone(), IMU_ADDRESS);
    let accel = imu.read_accel().unwrap();
    assert_float_eq(accel[2], 1.0, 1e-6);
    let gyro = imu.read_gyro().unwrap();
    assert_float_eq(gyro[0], 1000.0, 1e-3);
    assert_float_eq(imu.read_temperature().unwrap(), 50.0, 1e-6);
}

#[test]
fn test_wake_on_motion_before_sleep() {
    let bus = tracker_board();
    let mut imu = ImuDriver::new(ImuType::Icm45686, bus.clone(), IMU_ADDRESS);
    imu.init(0.0, Periods::new(0.0025, 0.0025)).unwrap();
    bus.clear_operations();

    let pin = imu.configure_wake_on_motion().unwrap();
    assert_eq!(pin.pull, Pull::Up);
    assert_eq!(pin.sense, Sense::Low);

    // Accel 200 Hz ±8 g, low power with the gyro off
    assert_eq!(bus.writes_to(IMU_ADDRESS, 0x1B), vec![vec![0x28]]);
    assert_eq!(bus.writes_to(IMU_ADDRESS, 0x10), vec![vec![0x02]]);
    // Thresholds through the indirect window
    assert!(
        bus.writes_to(IMU_ADDRESS, 0x7C)
            .contains(&vec![0xA2, 0x54, 0x08, 0x08, 0x08])
    );
    assert_eq!(bus.writes_to(IMU_ADDRESS, 0x23), vec![vec![0x14]]);
    assert_eq!(bus.writes_to(IMU_ADDRESS, 0x17), vec![vec![0x0E]]);

    // Streaming configuration is rewritten in full afterwards
    bus.clear_operations();
    let update = imu.set_rate(Periods::new(0.0025, 0.0025)).unwrap();
    assert_eq!(update.change, RateChange::Applied);
    assert_eq!(bus.write_count(), 3);
}

#[test]
fn test_passthrough_and_shutdown() {
    let bus = tracker_board();
    let mut imu = ImuDriver::new(ImuType::Icm45686, bus.clone(), IMU_ADDRESS);

    imu.configure_passthrough(true).unwrap();
    assert_eq!(bus.get_register(IMU_ADDRESS, 0x30), 0x18);
    imu.configure_passthrough(false).unwrap();
    assert_eq!(bus.get_register(IMU_ADDRESS, 0x30), 0x00);

    imu.shutdown().unwrap();
    assert_eq!(bus.writes_to(IMU_ADDRESS, 0x7F), vec![vec![0x02]]);

    let mut mag = MagDriver::new(MagType::Lis2mdl, bus.clone(), MAG_ADDRESS);
    mag.shutdown().unwrap();
    assert_eq!(bus.get_register(MAG_ADDRESS, 0x60), 0x20);
}

#[test]
fn test_bus_failure_during_init_is_reported() {
    let bus = tracker_board();
    let mut imu = ImuDriver::new(ImuType::Icm45686, bus.clone(), IMU_ADDRESS);

    bus.fail_next_write();
    assert!(imu.init(0.0, Periods::new(0.0025, 0.0025)).is_err());
    // Every step was still attempted
    assert_eq!(bus.write_count(), 6);

    // A retry rewrites the full configuration
    bus.clear_operations();
    imu.init(0.0, Periods::new(0.0025, 0.0025)).unwrap();
    assert_eq!(bus.write_count(), 6);
}
