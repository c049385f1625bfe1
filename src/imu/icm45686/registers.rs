//! Register definitions for the ICM-45686
//!
//! Only the user-bank registers this driver touches are described. Registers in
//! the internal IPREG banks are reached through the indirect access window at
//! `IREG_ADDR` and are listed as plain constants below.

device_driver::create_device!(
    device_name: Icm45686,
    dsl: {
        config {
            type RegisterAddressType = u8;
            type DefaultByteOrder = BE;
        }

        /// PWR_MGMT0 - Power Management 0 (0x10)
        register PwrMgmt0 {
            const ADDRESS = 0x10;
            const SIZE_BITS = 8;

            /// Accelerometer mode (0 = off, 2 = low power, 3 = low noise)
            accel_mode: uint = 0..2,
            /// Gyroscope mode (0 = off, 1 = standby, 3 = low noise)
            gyro_mode: uint = 2..4,
            reserved_7_4: uint = 4..8,
        },

        /// INT1_CONFIG0 - INT1 source enables (0x16)
        register Int1Config0 {
            const ADDRESS = 0x16;
            const SIZE_BITS = 8;

            /// Interrupt enable mask (reset done, AUX1 agc, FIFO and data ready sources)
            enables: uint = 0..8,
        },

        /// INT1_CONFIG1 - INT1 source enables, continued (0x17)
        register Int1Config1 {
            const ADDRESS = 0x17;
            const SIZE_BITS = 8;

            reserved_0: uint = 0..1,
            /// Route wake-on-motion X to INT1
            wom_x_en: bool = 1,
            /// Route wake-on-motion Y to INT1
            wom_y_en: bool = 2,
            /// Route wake-on-motion Z to INT1
            wom_z_en: bool = 3,
            reserved_7_4: uint = 4..8,
        },

        /// INT1_STATUS0 - INT1 status, cleared on read (0x19)
        register Int1Status0 {
            const ADDRESS = 0x19;
            const SIZE_BITS = 8;

            status: uint = 0..8,
        },

        /// ACCEL_CONFIG0 - Accelerometer ODR and full scale (0x1B)
        register AccelConfig0 {
            const ADDRESS = 0x1B;
            const SIZE_BITS = 8;

            /// Output data rate code
            accel_odr: uint = 0..4,
            /// Full-scale select (1 = ±16 g, 2 = ±8 g)
            accel_ui_fs_sel: uint = 4..7,
            reserved_7: uint = 7..8,
        },

        /// GYRO_CONFIG0 - Gyroscope ODR and full scale (0x1C)
        register GyroConfig0 {
            const ADDRESS = 0x1C;
            const SIZE_BITS = 8;

            /// Output data rate code
            gyro_odr: uint = 0..4,
            /// Full-scale select (1 = ±2000 dps)
            gyro_ui_fs_sel: uint = 4..8,
        },

        /// FIFO_CONFIG0 - FIFO mode and depth (0x1D)
        register FifoConfig0 {
            const ADDRESS = 0x1D;
            const SIZE_BITS = 8;

            /// FIFO depth (0b000111 = 2 KiB)
            fifo_depth: uint = 0..6,
            /// FIFO mode (0 = bypass, 1 = stream, 2 = stop on full)
            fifo_mode: uint = 6..8,
        },

        /// FIFO_CONFIG3 - FIFO content selection (0x21)
        register FifoConfig3 {
            const ADDRESS = 0x21;
            const SIZE_BITS = 8;

            /// Enable the FIFO interface
            fifo_if_en: bool = 0,
            /// Accelerometer data in FIFO packets
            fifo_accel_en: bool = 1,
            /// Gyroscope data in FIFO packets
            fifo_gyro_en: bool = 2,
            /// 20-bit high-resolution packets
            fifo_hires_en: bool = 3,
            reserved_7_4: uint = 4..8,
        },

        /// TMST_WOM_CONFIG - Timestamp and wake-on-motion configuration (0x23)
        register TmstWomConfig {
            const ADDRESS = 0x23;
            const SIZE_BITS = 8;

            reserved_1_0: uint = 0..2,
            /// Interrupt when all axes exceed the threshold (AND) instead of any (OR)
            wom_int_mode: bool = 2,
            reserved_3: uint = 3..4,
            /// Enable wake-on-motion
            wom_en: bool = 4,
            reserved_7_5: uint = 5..8,
        },

        /// RTC_CONFIG - Real-time clock input (0x26)
        register RtcConfig {
            const ADDRESS = 0x26;
            const SIZE_BITS = 8;

            reserved_4_0: uint = 0..5,
            /// Use the external CLKIN as the RTC
            rtc_mode: bool = 5,
            reserved_7_6: uint = 6..8,
        },

        /// IOC_PAD_SCENARIO_AUX_OVRD - AUX1 pad overrides (0x30)
        register IocPadScenarioAuxOvrd {
            const ADDRESS = 0x30;
            const SIZE_BITS = 8;

            reserved_2_0: uint = 0..3,
            /// AUX1 enable override value
            aux_enable: bool = 3,
            /// AUX1 mode override (I2C master bypass)
            aux_bypass: bool = 4,
            reserved_7_5: uint = 5..8,
        },

        /// IOC_PAD_SCENARIO_OVRD - Pad function overrides (0x31)
        register IocPadScenarioOvrd {
            const ADDRESS = 0x31;
            const SIZE_BITS = 8;

            reserved_0: uint = 0..1,
            /// Pad 9 override value: CLKIN
            pad_nine_clkin: bool = 1,
            /// Apply the pad 9 override
            pad_nine_ovrd: bool = 2,
            reserved_7_3: uint = 3..8,
        },

        /// WHO_AM_I - Device ID Register (0x72)
        /// Expected value: 0xE9
        register WhoAmI {
            const ADDRESS = 0x72;
            const SIZE_BITS = 8;

            /// Device ID (should read 0xE9)
            who_am_i: uint = 0..8,
        },

        /// REG_MISC2 - Soft reset (0x7F)
        register RegMisc2 {
            const ADDRESS = 0x7F;
            const SIZE_BITS = 8;

            reserved_0: uint = 0..1,
            /// Trigger a soft reset
            soft_rst: bool = 1,
            reserved_7_2: uint = 2..8,
        },
    }
);

/// First accelerometer data byte (X high), 6 bytes
pub const ACCEL_DATA: u8 = 0x00;
/// First gyroscope data byte (X high), 6 bytes
pub const GYRO_DATA: u8 = 0x06;
/// Temperature data, 2 bytes
pub const TEMP_DATA: u8 = 0x0C;
/// FIFO packet count, 2 bytes
pub const FIFO_COUNT: u8 = 0x12;
/// FIFO data port (does not auto-increment)
pub const FIFO_DATA: u8 = 0x14;
/// Indirect register access window: address high, address low, data...
pub const IREG_ADDR: u8 = 0x7C;

/// Expected WHO_AM_I value
pub const WHO_AM_I_VALUE: u8 = 0xE9;

/// Indirect bank IPREG_TOP1 (address high byte)
pub const IPREG_TOP1: u8 = 0xA2;
/// IPREG_TOP1: serial interface control (data endianness)
pub const SREG_CTRL: u8 = 0x67;
/// IPREG_TOP1: wake-on-motion X threshold, followed by Y and Z
pub const ACCEL_WOM_X_THR: u8 = 0x54;
/// Indirect bank IPREG_SYS2 (address high byte)
pub const IPREG_SYS2: u8 = 0xA5;
/// IPREG_SYS2: accelerometer low-power averaging
pub const IPREG_SYS2_REG_129: u8 = 0x81;

/// SREG_CTRL value selecting big-endian sensor data
pub const SREG_DATA_BIG_ENDIAN: u8 = 0x02;

/// Accelerometer power mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelMode {
    /// Powered down
    Off = 0,
    /// Duty-cycled low power
    LowPower = 2,
    /// Low noise, continuous
    LowNoise = 3,
}

/// Gyroscope power mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GyroMode {
    /// Powered down
    Off = 0,
    /// Drive running, not sampling
    Standby = 1,
    /// Low noise, continuous
    LowNoise = 3,
}

/// Accelerometer full-scale select codes
pub mod accel_fs {
    /// ±16 g
    pub const G16: u8 = 1;
    /// ±8 g
    pub const G8: u8 = 2;
}

/// Gyroscope full-scale select codes
pub mod gyro_fs {
    /// ±2000 dps
    pub const DPS2000: u8 = 1;
}

/// Output data rate codes, shared by both channels
pub mod odr {
    /// 6.4 kHz
    pub const HZ_6400: u8 = 3;
    /// 3.2 kHz
    pub const HZ_3200: u8 = 4;
    /// 1.6 kHz
    pub const HZ_1600: u8 = 5;
    /// 800 Hz
    pub const HZ_800: u8 = 6;
    /// 400 Hz
    pub const HZ_400: u8 = 7;
    /// 200 Hz
    pub const HZ_200: u8 = 8;
    /// 100 Hz
    pub const HZ_100: u8 = 9;
    /// 50 Hz
    pub const HZ_50: u8 = 10;
    /// 25 Hz
    pub const HZ_25: u8 = 11;
    /// 12.5 Hz
    pub const HZ_12_5: u8 = 12;
}
