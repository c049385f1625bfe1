//! Device-type registry
//!
//! Maps every part the identification tables know about to a human-readable
//! name and to the driver that handles it. Parts without a driver in this crate
//! resolve to the no-op drivers of [`crate::sensors::none`].

use crate::imu::icm45686::Icm45686Driver;
use crate::interface::Transport;
use crate::interrupt::InterruptPinConfig;
use crate::mag::lis2mdl::Lis2mdlDriver;
use crate::scan::{PreRead, ProbeTable};
use crate::sensors::none::{NoImu, NoMag};
use crate::sensors::{
    FullScale, Imu, ImuSample, Magnetometer, PacketError, Periods, RateUpdate,
};
use crate::Error;

/// Supported IMU parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ImuType {
    /// Bosch BMI160
    Bmi160 = 0,
    /// Bosch BMI270
    Bmi270,
    /// Bosch BMI323
    Bmi323,
    /// InvenSense MPU-6000 / MPU-6050
    Mpu6050,
    /// InvenSense MPU-6500
    Mpu6500,
    /// InvenSense MPU-9250
    Mpu9250,
    /// TDK ICM-20948
    Icm20948,
    /// TDK ICM-42688-P / ICM-42688-V
    Icm42688,
    /// TDK ICM-45686
    Icm45686,
    /// ST LSM6DSO16IS / ISM330IS
    Ism330is,
    /// ST LSM6DS3
    Lsm6ds3,
    /// ST LSM6DS3TR-C / LSM6DSL / LSM6DSM / ISM330DLC
    Lsm6dsm,
    /// ST LSM6DSR / ISM330DHCX
    Lsm6dsr,
    /// ST LSM6DSO
    Lsm6dso,
    /// ST LSM6DST
    Lsm6dst,
    /// ST LSM6DSV
    Lsm6dsv,
    /// ST LSM6DSV16B / ISM330BX
    Ism330bx,
}

impl ImuType {
    /// All parts, in code order
    pub const ALL: [Self; 17] = [
        Self::Bmi160,
        Self::Bmi270,
        Self::Bmi323,
        Self::Mpu6050,
        Self::Mpu6500,
        Self::Mpu9250,
        Self::Icm20948,
        Self::Icm42688,
        Self::Icm45686,
        Self::Ism330is,
        Self::Lsm6ds3,
        Self::Lsm6dsm,
        Self::Lsm6dsr,
        Self::Lsm6dso,
        Self::Lsm6dst,
        Self::Lsm6dsv,
        Self::Ism330bx,
    ];

    /// Human-readable part name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bmi160 => "BMI160",
            Self::Bmi270 => "BMI270",
            Self::Bmi323 => "BMI323",
            Self::Mpu6050 => "MPU-6000/MPU-6050",
            Self::Mpu6500 => "MPU-6500",
            Self::Mpu9250 => "MPU-9250",
            Self::Icm20948 => "ICM-20948",
            Self::Icm42688 => "ICM-42688-P/ICM-42688-V",
            Self::Icm45686 => "ICM-45686",
            Self::Ism330is => "LSM6DSO16IS/ISM330IS",
            Self::Lsm6ds3 => "LSM6DS3",
            Self::Lsm6dsm => "LSM6DS3TR-C/LSM6DSL/LSM6DSM/ISM330DLC",
            Self::Lsm6dsr => "LSM6DSR/ISM330DHCX",
            Self::Lsm6dso => "LSM6DSO",
            Self::Lsm6dst => "LSM6DST",
            Self::Lsm6dsv => "LSM6DSV",
            Self::Ism330bx => "LSM6DSV16B/ISM330BX",
        }
    }

    /// Numeric device-type code
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Device type for a numeric code
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// True if this crate has a driver for the part
    pub const fn is_supported(self) -> bool {
        matches!(self, Self::Icm45686)
    }
}

/// Supported magnetometer parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MagType {
    /// Honeywell HMC5883L
    Hmc5883l = 0,
    /// QST QMC5883L
    Qmc5883l,
    /// QST QMC6309
    Qmc6309,
    /// QST QMC6310
    Qmc6310,
    /// AKM AK8963
    Ak8963,
    /// AKM AK09916
    Ak09916,
    /// AKM AK09940
    Ak09940,
    /// Bosch BMM150
    Bmm150,
    /// Bosch BMM350
    Bmm350,
    /// iSentek IST8306
    Ist8306,
    /// iSentek IST8308
    Ist8308,
    /// iSentek IST8320
    Ist8320,
    /// iSentek IST8321
    Ist8321,
    /// ST IIS2MDC / LIS2MDL
    Lis2mdl,
    /// ST LIS3MDL
    Lis3mdl,
    /// MEMSIC MMC34160PJ
    Mmc34160pj,
    /// MEMSIC MMC3630KJ
    Mmc3630kj,
    /// MEMSIC MMC5603NJ / MMC5633NJL
    Mmc5633njl,
    /// MEMSIC MMC5616WA
    Mmc5616wa,
    /// MEMSIC MMC5983MA
    Mmc5983ma,
}

impl MagType {
    /// All parts, in code order
    pub const ALL: [Self; 20] = [
        Self::Hmc5883l,
        Self::Qmc5883l,
        Self::Qmc6309,
        Self::Qmc6310,
        Self::Ak8963,
        Self::Ak09916,
        Self::Ak09940,
        Self::Bmm150,
        Self::Bmm350,
        Self::Ist8306,
        Self::Ist8308,
        Self::Ist8320,
        Self::Ist8321,
        Self::Lis2mdl,
        Self::Lis3mdl,
        Self::Mmc34160pj,
        Self::Mmc3630kj,
        Self::Mmc5633njl,
        Self::Mmc5616wa,
        Self::Mmc5983ma,
    ];

    /// Human-readable part name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hmc5883l => "HMC5883L",
            Self::Qmc5883l => "QMC5883L",
            Self::Qmc6309 => "QMC6309",
            Self::Qmc6310 => "QMC6310",
            Self::Ak8963 => "AK8963",
            Self::Ak09916 => "AK09916",
            Self::Ak09940 => "AK09940",
            Self::Bmm150 => "BMM150",
            Self::Bmm350 => "BMM350",
            Self::Ist8306 => "IST8306",
            Self::Ist8308 => "IST8308",
            Self::Ist8320 => "IST8320",
            Self::Ist8321 => "IST8321",
            Self::Lis2mdl => "IIS2MDC/LIS2MDL",
            Self::Lis3mdl => "LIS3MDL",
            Self::Mmc34160pj => "MMC34160PJ",
            Self::Mmc3630kj => "MMC3630KJ",
            Self::Mmc5633njl => "MMC5603NJ/MMC5633NJL",
            Self::Mmc5616wa => "MMC5616WA",
            Self::Mmc5983ma => "MMC5983MA",
        }
    }

    /// Numeric device-type code
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Device type for a numeric code
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// True if this crate has a driver for the part
    pub const fn is_supported(self) -> bool {
        matches!(self, Self::Lis2mdl)
    }
}

/// IMU identification table
///
/// Two address groups (0x68/0x69 and 0x6A/0x6B). The first probes the
/// InvenSense/Bosch id registers 0x00, 0x72 and 0x75, the second the ST
/// `WHO_AM_I` at 0x0F.
pub static IMU_PROBE_TABLE: ProbeTable<ImuType> = ProbeTable::new(
    &[
        2, 0x68, 0x69, //
        2, 0x6A, 0x6B,
    ],
    &[
        3, 0x00, 0x72, 0x75, //
        1, 0x0F,
    ],
    &[
        4, 0xEA, 0xD1, 0x24, 0x43, // reg 0x00
        1, 0xE9, // reg 0x72
        5, 0x68, 0x70, 0x71, 0x47, 0xDB, // reg 0x75
        8, 0x22, 0x69, 0x6A, 0x6B, 0x6C, 0x6D, 0x70, 0x71, // reg 0x0F
    ],
    &[
        ImuType::Icm20948,
        ImuType::Bmi160,
        ImuType::Bmi270,
        ImuType::Bmi323,
        ImuType::Icm45686,
        ImuType::Mpu6050,
        ImuType::Mpu6500,
        ImuType::Mpu9250,
        ImuType::Icm42688, // ICM-42688-P
        ImuType::Icm42688, // ICM-42688-V
        ImuType::Ism330is,
        ImuType::Lsm6ds3,
        ImuType::Lsm6dsm,
        ImuType::Lsm6dsr,
        ImuType::Lsm6dso,
        ImuType::Lsm6dst,
        ImuType::Lsm6dsv,
        ImuType::Ism330bx,
    ],
    &[],
);

/// The BMM150 chip id only reads back once the power control bit is set
const BMM150_POWER_UP: PreRead = PreRead {
    register: 0x40,
    address_min: 0x10,
    address_max: 0x13,
    write_register: 0x4B,
    value: 0x01,
    settle_ms: 2,
};

/// Magnetometer identification table
pub static MAG_PROBE_TABLE: ProbeTable<MagType> = ProbeTable::new(
    &[
        1, 0x0C, //
        1, 0x0D, //
        2, 0x0E, 0x0F, //
        4, 0x10, 0x11, 0x12, 0x13, //
        4, 0x14, 0x15, 0x16, 0x17, //
        1, 0x19, //
        1, 0x1C, //
        1, 0x1E, //
        1, 0x30, //
        1, 0x3C, //
        1, 0x7C,
    ],
    &[
        2, 0x01, 0x00, // AK09916/AK09940 first
        3, 0x01, 0x00, 0x0D, // AK09940 first
        2, 0x01, 0x00, // AK09940 first
        1, 0x40, //
        1, 0x00, //
        1, 0x00, //
        2, 0x00, 0x0F, //
        3, 0x0A, 0x0F, 0x4F, //
        3, 0x20, 0x2F, 0x39, //
        1, 0x00, //
        1, 0x00,
    ],
    &[
        2, 0x09, 0xA3, // 0x0C reg 0x01
        2, 0x08, 0x48, // 0x0C reg 0x00
        1, 0xA3, // 0x0D reg 0x01
        2, 0x08, 0x48, // 0x0D reg 0x00
        1, 0xFF, // 0x0D reg 0x0D
        1, 0xA3, // 0x0E reg 0x01
        2, 0x08, 0x48, // 0x0E reg 0x00
        1, 0x32, // 0x10 reg 0x40
        1, 0x33, // 0x14 reg 0x00
        3, 0x06, 0x20, 0x21, // 0x19 reg 0x00
        1, 0x80, // 0x1C reg 0x00
        1, 0x3D, // 0x1C reg 0x0F
        1, 0x48, // 0x1E reg 0x0A
        1, 0x3D, // 0x1E reg 0x0F
        1, 0x40, // 0x1E reg 0x4F
        1, 0x06, // 0x30 reg 0x20
        2, 0x0A, 0x30, // 0x30 reg 0x2F
        2, 0x10, 0x11, // 0x30 reg 0x39
        1, 0x80, // 0x3C reg 0x00
        1, 0x90, // 0x7C reg 0x00
    ],
    &[
        MagType::Ak09916,
        MagType::Ak09940,
        MagType::Ist8308,
        MagType::Ak8963,
        MagType::Ak09940,
        MagType::Ist8308,
        MagType::Ak8963,
        MagType::Qmc5883l,
        MagType::Ak09940,
        MagType::Ist8308,
        MagType::Ak8963,
        MagType::Bmm150,
        MagType::Bmm350,
        MagType::Ist8306,
        MagType::Ist8320,
        MagType::Ist8321,
        MagType::Qmc6310,
        MagType::Lis3mdl,
        MagType::Hmc5883l,
        MagType::Lis3mdl,
        MagType::Lis2mdl,
        MagType::Mmc34160pj,
        MagType::Mmc3630kj,
        MagType::Mmc5983ma,
        MagType::Mmc5633njl,
        MagType::Mmc5616wa,
        MagType::Qmc6310,
        MagType::Qmc6309,
    ],
    &[BMM150_POWER_UP],
);

macro_rules! dispatch {
    ($value:expr, $driver:ident => $call:expr, $($variant:path),+ $(,)?) => {
        match $value {
            $($variant($driver) => $call,)+
        }
    };
}

/// IMU driver selected by device type
pub enum ImuDriver<T> {
    /// ICM-45686
    Icm45686(Icm45686Driver<T>),
    /// Any part without a driver
    Unsupported(NoImu<T>),
}

impl<T: Transport> ImuDriver<T> {
    /// Create the driver for `kind` at bus `address`
    pub fn new(kind: ImuType, transport: T, address: u8) -> Self {
        #[cfg(feature = "defmt")]
        defmt::info!("IMU: {} at 0x{:02X}", kind.name(), address);

        match kind {
            ImuType::Icm45686 => Self::Icm45686(Icm45686Driver::new(transport, address)),
            _ => Self::Unsupported(NoImu::new(transport)),
        }
    }

    /// Consume the driver and return the transport
    pub fn release(self) -> T {
        dispatch!(self, imu => imu.release(), Self::Icm45686, Self::Unsupported)
    }
}

impl<T: Transport> Imu for ImuDriver<T> {
    type BusError = T::Error;

    fn init(
        &mut self,
        external_clock_hz: f32,
        requested: Periods,
    ) -> Result<Periods, Error<T::Error>> {
        dispatch!(
            self,
            imu => imu.init(external_clock_hz, requested),
            Self::Icm45686,
            Self::Unsupported,
        )
    }

    fn shutdown(&mut self) -> Result<(), Error<T::Error>> {
        dispatch!(self, imu => imu.shutdown(), Self::Icm45686, Self::Unsupported)
    }

    fn set_full_scale(&mut self, requested: FullScale) -> FullScale {
        dispatch!(self, imu => imu.set_full_scale(requested), Self::Icm45686, Self::Unsupported)
    }

    fn set_rate(
        &mut self,
        requested: Periods,
    ) -> Result<RateUpdate<Periods>, Error<T::Error>> {
        dispatch!(self, imu => imu.set_rate(requested), Self::Icm45686, Self::Unsupported)
    }

    fn packet_size(&self) -> usize {
        dispatch!(self, imu => imu.packet_size(), Self::Icm45686, Self::Unsupported)
    }

    fn read_fifo(&mut self, buffer: &mut [u8]) -> Result<usize, Error<T::Error>> {
        dispatch!(self, imu => imu.read_fifo(buffer), Self::Icm45686, Self::Unsupported)
    }

    fn decode_packet(&self, buffer: &[u8], index: usize) -> Result<ImuSample, PacketError> {
        dispatch!(
            self,
            imu => imu.decode_packet(buffer, index),
            Self::Icm45686,
            Self::Unsupported,
        )
    }

    fn read_accel(&mut self) -> Result<[f32; 3], Error<T::Error>> {
        dispatch!(self, imu => imu.read_accel(), Self::Icm45686, Self::Unsupported)
    }

    fn read_gyro(&mut self) -> Result<[f32; 3], Error<T::Error>> {
        dispatch!(self, imu => imu.read_gyro(), Self::Icm45686, Self::Unsupported)
    }

    fn read_temperature(&mut self) -> Result<f32, Error<T::Error>> {
        dispatch!(self, imu => imu.read_temperature(), Self::Icm45686, Self::Unsupported)
    }

    fn configure_wake_on_motion(&mut self) -> Result<InterruptPinConfig, Error<T::Error>> {
        dispatch!(
            self,
            imu => imu.configure_wake_on_motion(),
            Self::Icm45686,
            Self::Unsupported,
        )
    }

    fn configure_passthrough(&mut self, enable: bool) -> Result<(), Error<T::Error>> {
        dispatch!(
            self,
            imu => imu.configure_passthrough(enable),
            Self::Icm45686,
            Self::Unsupported,
        )
    }
}

/// Magnetometer driver selected by device type
pub enum MagDriver<T> {
    /// IIS2MDC / LIS2MDL
    Lis2mdl(Lis2mdlDriver<T>),
    /// Any part without a driver
    Unsupported(NoMag<T>),
}

impl<T: Transport> MagDriver<T> {
    /// Create the driver for `kind` at bus `address`
    pub fn new(kind: MagType, transport: T, address: u8) -> Self {
        #[cfg(feature = "defmt")]
        defmt::info!("Magnetometer: {} at 0x{:02X}", kind.name(), address);

        match kind {
            MagType::Lis2mdl => Self::Lis2mdl(Lis2mdlDriver::new(transport, address)),
            _ => Self::Unsupported(NoMag::new(transport)),
        }
    }

    /// Consume the driver and return the transport
    pub fn release(self) -> T {
        dispatch!(self, mag => mag.release(), Self::Lis2mdl, Self::Unsupported)
    }
}

impl<T: Transport> Magnetometer for MagDriver<T> {
    type BusError = T::Error;

    fn init(&mut self, requested: f32) -> Result<f32, Error<T::Error>> {
        dispatch!(self, mag => mag.init(requested), Self::Lis2mdl, Self::Unsupported)
    }

    fn shutdown(&mut self) -> Result<(), Error<T::Error>> {
        dispatch!(self, mag => mag.shutdown(), Self::Lis2mdl, Self::Unsupported)
    }

    fn set_rate(&mut self, requested: f32) -> Result<RateUpdate<f32>, Error<T::Error>> {
        dispatch!(self, mag => mag.set_rate(requested), Self::Lis2mdl, Self::Unsupported)
    }

    fn trigger_oneshot(&mut self) -> Result<(), Error<T::Error>> {
        dispatch!(self, mag => mag.trigger_oneshot(), Self::Lis2mdl, Self::Unsupported)
    }

    fn read_mag(&mut self) -> Result<[f32; 3], Error<T::Error>> {
        dispatch!(self, mag => mag.read_mag(), Self::Lis2mdl, Self::Unsupported)
    }

    fn read_temperature(&mut self) -> Result<f32, Error<T::Error>> {
        dispatch!(self, mag => mag.read_temperature(), Self::Lis2mdl, Self::Unsupported)
    }

    fn sample_len(&self) -> usize {
        dispatch!(self, mag => mag.sample_len(), Self::Lis2mdl, Self::Unsupported)
    }

    fn decode_sample(&self, raw: &[u8]) -> Option<[f32; 3]> {
        dispatch!(self, mag => mag.decode_sample(raw), Self::Lis2mdl, Self::Unsupported)
    }
}
