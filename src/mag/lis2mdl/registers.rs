//! Register definitions for the LIS2MDL

device_driver::create_device!(
    device_name: Lis2mdl,
    dsl: {
        config {
            type RegisterAddressType = u8;
            type DefaultByteOrder = LE;
        }

        /// WHO_AM_I - Device ID Register (0x4F)
        /// Expected value: 0x40
        register WhoAmI {
            const ADDRESS = 0x4F;
            const SIZE_BITS = 8;

            /// Device ID (should read 0x40)
            who_am_i: uint = 0..8,
        },

        /// CFG_REG_A - Mode, rate and reset (0x60)
        register CfgRegA {
            const ADDRESS = 0x60;
            const SIZE_BITS = 8;

            /// Operating mode (0 = continuous, 1 = single, 3 = idle)
            md: uint = 0..2,
            /// Output data rate (0 = 10 Hz, 1 = 20 Hz, 2 = 50 Hz, 3 = 100 Hz)
            odr: uint = 2..4,
            /// Low-power mode
            lp: bool = 4,
            /// Soft reset of configuration and user registers
            soft_rst: bool = 5,
            /// Reboot memory content
            reboot: bool = 6,
            /// Temperature compensation
            comp_temp_en: bool = 7,
        },
    }
);

/// Magnetic field output, X low byte first, 6 bytes
pub const OUTX_L: u8 = 0x68;
/// Temperature output, low byte first, 2 bytes
pub const TEMP_OUT_L: u8 = 0x6E;

/// Expected WHO_AM_I value
pub const WHO_AM_I_VALUE: u8 = 0x40;

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Continuous conversion
    Continuous = 0,
    /// Single conversion, returns to idle when done
    Single = 1,
    /// Idle
    Idle = 3,
}

impl Mode {
    /// Decode the `md` field
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Continuous,
            1 => Self::Single,
            _ => Self::Idle,
        }
    }
}

/// Output data rate codes
pub mod odr {
    /// 10 Hz
    pub const HZ_10: u8 = 0;
    /// 20 Hz
    pub const HZ_20: u8 = 1;
    /// 50 Hz
    pub const HZ_50: u8 = 2;
    /// 100 Hz
    pub const HZ_100: u8 = 3;
}
