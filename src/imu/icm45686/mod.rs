//! ICM-45686 driver
//!
//! The reference IMU driver: 20-bit high-resolution FIFO streaming with rate
//! negotiation that touches the bus only when something actually changes.
//!
//! # Rate negotiation
//!
//! Each channel's requested period is mapped onto [`ODR_LADDER`] (rounding
//! down to the nearest supported rate), scaled by the external clock ratio
//! when one is fed to CLKIN. The power register is written only when a
//! channel's mode changes, each channel's config register only when its rate
//! code changes, and a request for the active configuration reports
//! [`RateChange::Unchanged`] without any bus traffic.

pub mod fifo;
pub mod registers;

use registers::Icm45686 as RegisterDevice;
use registers::{AccelMode, GyroMode, accel_fs, gyro_fs, odr};

use crate::interface::{BusKind, DeviceInterface, Transport};
use crate::interrupt::InterruptPinConfig;
use crate::power::ChannelMode;
use crate::sensors::odr::{RateLadder, Rung};
use crate::sensors::{FullScale, Imu, ImuSample, PacketError, Periods, RateChange, RateUpdate};
use crate::{BusStatus, Error};

/// Supported output data rates (both channels), fastest first
pub const ODR_LADDER: RateLadder<u8> = RateLadder::new(&[
    Rung { hz: 6400.0, code: odr::HZ_6400 },
    Rung { hz: 3200.0, code: odr::HZ_3200 },
    Rung { hz: 1600.0, code: odr::HZ_1600 },
    Rung { hz: 800.0, code: odr::HZ_800 },
    Rung { hz: 400.0, code: odr::HZ_400 },
    Rung { hz: 200.0, code: odr::HZ_200 },
    Rung { hz: 100.0, code: odr::HZ_100 },
    Rung { hz: 50.0, code: odr::HZ_50 },
    Rung { hz: 25.0, code: odr::HZ_25 },
    Rung { hz: 12.5, code: odr::HZ_12_5 },
]);

/// Nominal internal reference clock; an external CLKIN scales every ODR by
/// `external / CLOCK_REFERENCE_HZ`
pub const CLOCK_REFERENCE_HZ: f32 = 32_000.0;

/// Seconds of bus time per FIFO packet over I2C fast mode
const FIFO_FACTOR_I2C: f32 = 0.000_75;
/// Seconds of bus time per FIFO packet over SPI at ~24 MHz
const FIFO_FACTOR_SPI: f32 = 0.000_1;

/// Minimum wait after a power mode change (datasheet: >200 µs)
const POWER_SETTLE_US: u32 = 250;
/// Startup wait before the FIFO is enabled
const STARTUP_DELAY_MS: u32 = 1;

/// Single-shot data is always ±16 g
const ACCEL_SENSITIVITY: f32 = 16.0 / 32768.0;
/// Single-shot data is always ±2000 dps
const GYRO_SENSITIVITY: f32 = 2000.0 / 32768.0;
/// LSB per °C of the temperature sensor
const TEMP_SENSITIVITY: f32 = 128.0;
/// Temperature at raw value 0
const TEMP_OFFSET: f32 = 25.0;

/// Data bytes the indirect register window accepts after bank and address
const IREG_MAX_DATA: usize = 3;

/// Wake-on-motion threshold per axis: 8 × 3.9 mg ≈ 31 mg
const WOM_THRESHOLD: u8 = 0x08;

/// FIFO_CONFIG0 mode: stop on full
const FIFO_MODE_STOP_ON_FULL: u8 = 0b10;
/// FIFO_CONFIG0 depth: 2 KiB
const FIFO_DEPTH_2K: u8 = 0b00_0111;

/// Last configuration written to the device
///
/// `None` means unknown (after reset, shutdown or a failed write), which forces
/// the next negotiation to rewrite that register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RateState {
    accel_mode: Option<AccelMode>,
    gyro_mode: Option<GyroMode>,
    accel_odr: Option<u8>,
    gyro_odr: Option<u8>,
}

impl RateState {
    const UNKNOWN: Self = Self {
        accel_mode: None,
        gyro_mode: None,
        accel_odr: None,
        gyro_odr: None,
    };
}

/// Outcome of mapping a requested period onto the hardware
#[derive(Debug, Clone, Copy)]
struct ChannelTarget<M> {
    mode: M,
    /// Rate code, `None` when the channel does not sample
    code: Option<u8>,
    /// Achieved period in seconds, 0 when the channel does not sample
    period: f32,
}

/// ICM-45686 driver
pub struct Icm45686Driver<T> {
    device: RegisterDevice<DeviceInterface<T>>,
    state: RateState,
    clock_scale: f32,
    fifo_factor: f32,
    fifo_multiplier: f32,
}

impl<T: Transport> Icm45686Driver<T> {
    /// Create a driver for the device at `address`
    ///
    /// No bus traffic happens until [`Imu::init`]. The FIFO over-read factor is
    /// chosen from the transport's bus kind.
    pub fn new(transport: T, address: u8) -> Self {
        let fifo_factor = match transport.kind() {
            BusKind::I2c => FIFO_FACTOR_I2C,
            BusKind::Spi => FIFO_FACTOR_SPI,
        };
        Self {
            device: RegisterDevice::new(DeviceInterface::new(transport, address)),
            state: RateState::UNKNOWN,
            clock_scale: 1.0,
            fifo_factor,
            fifo_multiplier: 0.0,
        }
    }

    /// Consume the driver and return the transport
    pub fn release(self) -> T {
        self.device.interface.release()
    }

    /// Check the `WHO_AM_I` register
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDevice` with the value read if it is not 0xE9, or
    /// a bus error if communication fails.
    pub fn verify_identity(&mut self) -> Result<(), Error<T::Error>> {
        let who_am_i = self.device.who_am_i().read()?.who_am_i();
        if who_am_i != registers::WHO_AM_I_VALUE {
            #[cfg(feature = "defmt")]
            defmt::warn!("ICM-45686: unexpected WHO_AM_I 0x{:02X}", who_am_i);
            return Err(Error::InvalidDevice(who_am_i));
        }
        Ok(())
    }

    /// External clock ratio applied to every ODR
    pub const fn clock_scale(&self) -> f32 {
        self.clock_scale
    }

    /// Extra packets read per pending FIFO packet
    pub const fn fifo_multiplier(&self) -> f32 {
        self.fifo_multiplier
    }

    /// Write to an internal IPREG register through the indirect access window
    ///
    /// The window takes at most [`IREG_MAX_DATA`] data bytes per transfer.
    fn write_indirect<const N: usize>(
        &mut self,
        bank: u8,
        register: u8,
        data: [u8; N],
    ) -> Result<(), T::Error> {
        const { assert!(N <= IREG_MAX_DATA, "indirect write payload too long") };

        let mut buffer = [0u8; 2 + IREG_MAX_DATA];
        buffer[0] = bank;
        buffer[1] = register;
        buffer[2..2 + N].copy_from_slice(&data);
        self.device
            .interface
            .write(registers::IREG_ADDR, &buffer[..2 + N])
    }

    fn rung_period(&self, rung: Rung<u8>) -> f32 {
        1.0 / rung.hz / self.clock_scale
    }

    fn accel_target(&self, period: f32) -> ChannelTarget<AccelMode> {
        // Accelerometer standby is not distinguished from off
        if ChannelMode::from_period(period).is_sampling() {
            let rung = ODR_LADDER.select(1.0 / period / self.clock_scale);
            ChannelTarget {
                mode: AccelMode::LowNoise,
                code: Some(rung.code),
                period: self.rung_period(rung),
            }
        } else {
            ChannelTarget {
                mode: AccelMode::Off,
                code: None,
                period: 0.0,
            }
        }
    }

    fn gyro_target(&self, period: f32) -> ChannelTarget<GyroMode> {
        let mode = match ChannelMode::from_period(period) {
            ChannelMode::Off => GyroMode::Off,
            ChannelMode::Standby => GyroMode::Standby,
            ChannelMode::Sampling => {
                let rung = ODR_LADDER.select(1.0 / period / self.clock_scale);
                return ChannelTarget {
                    mode: GyroMode::LowNoise,
                    code: Some(rung.code),
                    period: self.rung_period(rung),
                };
            }
        };
        ChannelTarget {
            mode,
            code: None,
            period: 0.0,
        }
    }

    /// Packets expected to arrive per pending packet while a burst is read
    ///
    /// With both channels sampling at different rates the slower channel's
    /// period is used; equal rates interleave into single packets.
    fn compute_fifo_multiplier(&self, achieved: Periods) -> f32 {
        let limiting = match (achieved.accel > 0.0, achieved.gyro > 0.0) {
            (false, false) => return 0.0,
            (true, false) => achieved.accel,
            (false, true) => achieved.gyro,
            (true, true) if (achieved.accel - achieved.gyro).abs() <= f32::EPSILON => return 0.0,
            (true, true) => achieved.accel.max(achieved.gyro),
        };
        self.fifo_factor / limiting
    }

    /// Negotiate rates, recording bus failures in `status`
    fn apply_rates(
        &mut self,
        requested: Periods,
        status: &mut BusStatus<T::Error>,
    ) -> RateUpdate<Periods> {
        let accel = self.accel_target(requested.accel);
        let gyro = self.gyro_target(requested.gyro);
        let achieved = Periods::new(accel.period, gyro.period);

        let modes_unchanged =
            self.state.accel_mode == Some(accel.mode) && self.state.gyro_mode == Some(gyro.mode);
        let accel_pending = accel.code.filter(|&code| self.state.accel_odr != Some(code));
        let gyro_pending = gyro.code.filter(|&code| self.state.gyro_odr != Some(code));

        if modes_unchanged && accel_pending.is_none() && gyro_pending.is_none() {
            return RateUpdate {
                achieved,
                change: RateChange::Unchanged,
            };
        }

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "ICM-45686: accel {} ({}s), gyro {} ({}s)",
            accel.mode,
            achieved.accel,
            gyro.mode,
            achieved.gyro
        );

        if !modes_unchanged {
            let written = status.check(self.device.pwr_mgmt_0().write(|w| {
                w.set_accel_mode(accel.mode as u8);
                w.set_gyro_mode(gyro.mode as u8);
            }));
            // Power mode writes need time to settle before further configuration
            self.device.interface.transport().delay_us(POWER_SETTLE_US);
            self.state.accel_mode = written.map(|()| accel.mode);
            self.state.gyro_mode = written.map(|()| gyro.mode);
        }

        if let Some(code) = accel_pending {
            let written = status.check(self.device.accel_config_0().write(|w| {
                w.set_accel_odr(code);
                w.set_accel_ui_fs_sel(accel_fs::G16);
            }));
            self.state.accel_odr = written.map(|()| code);
        }

        if let Some(code) = gyro_pending {
            let written = status.check(self.device.gyro_config_0().write(|w| {
                w.set_gyro_odr(code);
                w.set_gyro_ui_fs_sel(gyro_fs::DPS2000);
            }));
            self.state.gyro_odr = written.map(|()| code);
        }

        self.fifo_multiplier = self.compute_fifo_multiplier(achieved);

        RateUpdate {
            achieved,
            change: RateChange::Applied,
        }
    }
}

impl<T: Transport> Imu for Icm45686Driver<T> {
    type BusError = T::Error;

    fn init(
        &mut self,
        external_clock_hz: f32,
        requested: Periods,
    ) -> Result<Periods, Error<T::Error>> {
        let mut status = BusStatus::new();

        if external_clock_hz > 0.0 {
            self.clock_scale = external_clock_hz / CLOCK_REFERENCE_HZ;
            // Route pad 9 to CLKIN and clock the RTC from it
            status.check(self.device.ioc_pad_scenario_ovrd().write(|w| {
                w.set_pad_nine_clkin(true);
                w.set_pad_nine_ovrd(true);
            }));
            status.check(self.device.rtc_config().modify(|w| {
                w.set_rtc_mode(true);
            }));
        } else {
            self.clock_scale = 1.0;
        }

        status.check(self.write_indirect(
            registers::IPREG_TOP1,
            registers::SREG_CTRL,
            [registers::SREG_DATA_BIG_ENDIAN],
        ));

        self.state = RateState::UNKNOWN;
        let update = self.apply_rates(requested, &mut status);

        self.device.interface.transport().delay_ms(STARTUP_DELAY_MS);

        status.check(self.device.fifo_config_0().write(|w| {
            w.set_fifo_mode(FIFO_MODE_STOP_ON_FULL);
            w.set_fifo_depth(FIFO_DEPTH_2K);
        }));
        status.check(self.device.fifo_config_3().write(|w| {
            w.set_fifo_if_en(true);
            w.set_fifo_accel_en(true);
            w.set_fifo_gyro_en(true);
            w.set_fifo_hires_en(true);
        }));

        status.finish()?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "ICM-45686 initialized, clock scale {}, accel {}s, gyro {}s",
            self.clock_scale,
            update.achieved.accel,
            update.achieved.gyro
        );

        Ok(update.achieved)
    }

    fn shutdown(&mut self) -> Result<(), Error<T::Error>> {
        self.state = RateState::UNKNOWN;
        // The reset completes on its own; nothing else talks to the chip after this
        self.device.reg_misc_2().write(|w| {
            w.set_soft_rst(true);
        })?;
        Ok(())
    }

    fn set_full_scale(&mut self, _requested: FullScale) -> FullScale {
        // High-resolution FIFO packets always carry the widest range
        FullScale {
            accel_g: 32.0,
            gyro_dps: 4000.0,
        }
    }

    fn set_rate(
        &mut self,
        requested: Periods,
    ) -> Result<RateUpdate<Periods>, Error<T::Error>> {
        let mut status = BusStatus::new();
        let update = self.apply_rates(requested, &mut status);
        status.finish()?;
        Ok(update)
    }

    fn packet_size(&self) -> usize {
        fifo::PACKET_SIZE
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn read_fifo(&mut self, buffer: &mut [u8]) -> Result<usize, Error<T::Error>> {
        let mut status = BusStatus::new();
        let address = self.device.interface.address();
        let mut offset = 0;
        let mut total = 0;

        while buffer.len() - offset >= fifo::PACKET_SIZE {
            let mut raw_count = [0u8; 2];
            if status
                .check(self.device.interface.read(registers::FIFO_COUNT, &mut raw_count))
                .is_none()
            {
                break;
            }
            let pending = usize::from(u16::from_be_bytes(raw_count));
            if pending == 0 {
                break;
            }

            // Packets keep arriving while the burst is read
            let extra = libm::floorf(pending as f32 * self.fifo_multiplier) as usize;
            let mut packets = pending + extra;

            let limit = (buffer.len() - offset) / fifo::PACKET_SIZE;
            if packets > limit {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "FIFO read buffer limit reached, {} packets dropped",
                    packets - limit
                );
                packets = limit;
            }

            let len = packets * fifo::PACKET_SIZE;
            let read = status.check(self.device.interface.transport().burst_read_interval(
                address,
                registers::FIFO_DATA,
                &mut buffer[offset..offset + len],
                fifo::PACKET_SIZE,
            ));
            if read.is_none() {
                break;
            }

            offset += len;
            total += packets;
        }

        status.finish()?;
        Ok(total)
    }

    fn decode_packet(&self, buffer: &[u8], index: usize) -> Result<ImuSample, PacketError> {
        fifo::decode(buffer, index)
    }

    fn read_accel(&mut self) -> Result<[f32; 3], Error<T::Error>> {
        let mut raw = [0u8; 6];
        self.device.interface.read(registers::ACCEL_DATA, &mut raw)?;
        Ok(core::array::from_fn(|axis| {
            f32::from(i16::from_be_bytes([raw[axis * 2], raw[axis * 2 + 1]])) * ACCEL_SENSITIVITY
        }))
    }

    fn read_gyro(&mut self) -> Result<[f32; 3], Error<T::Error>> {
        let mut raw = [0u8; 6];
        self.device.interface.read(registers::GYRO_DATA, &mut raw)?;
        Ok(core::array::from_fn(|axis| {
            f32::from(i16::from_be_bytes([raw[axis * 2], raw[axis * 2 + 1]])) * GYRO_SENSITIVITY
        }))
    }

    fn read_temperature(&mut self) -> Result<f32, Error<T::Error>> {
        let mut raw = [0u8; 2];
        self.device.interface.read(registers::TEMP_DATA, &mut raw)?;
        Ok(f32::from(i16::from_be_bytes(raw)) / TEMP_SENSITIVITY + TEMP_OFFSET)
    }

    fn configure_wake_on_motion(&mut self) -> Result<InterruptPinConfig, Error<T::Error>> {
        let mut status = BusStatus::new();

        // Reading INT1_STATUS0 clears the reset-done flag
        status.check(self.device.int_1_status_0().read());
        status.check(self.device.int_1_config_0().write(|w| {
            w.set_enables(0);
        }));
        status.check(self.device.accel_config_0().write(|w| {
            w.set_accel_odr(odr::HZ_200);
            w.set_accel_ui_fs_sel(accel_fs::G8);
        }));
        status.check(self.device.pwr_mgmt_0().write(|w| {
            w.set_accel_mode(AccelMode::LowPower as u8);
            w.set_gyro_mode(GyroMode::Off as u8);
        }));
        // 1x low-power averaging
        status.check(self.write_indirect(
            registers::IPREG_SYS2,
            registers::IPREG_SYS2_REG_129,
            [0x00],
        ));
        status.check(self.write_indirect(
            registers::IPREG_TOP1,
            registers::ACCEL_WOM_X_THR,
            [WOM_THRESHOLD; 3],
        ));
        status.check(self.device.tmst_wom_config().write(|w| {
            w.set_wom_en(true);
            w.set_wom_int_mode(true);
        }));
        status.check(self.device.int_1_config_1().write(|w| {
            w.set_wom_x_en(true);
            w.set_wom_y_en(true);
            w.set_wom_z_en(true);
        }));

        // Registers now hold the wake-on-motion setup, not the streaming one
        self.state = RateState::UNKNOWN;
        status.finish()?;

        #[cfg(feature = "defmt")]
        defmt::info!("ICM-45686: wake-on-motion armed");

        Ok(InterruptPinConfig::active_low())
    }

    fn configure_passthrough(&mut self, enable: bool) -> Result<(), Error<T::Error>> {
        self.device.ioc_pad_scenario_aux_ovrd().write(|w| {
            w.set_aux_enable(enable);
            w.set_aux_bypass(enable);
        })?;
        Ok(())
    }
}
