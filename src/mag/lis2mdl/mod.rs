//! LIS2MDL magnetometer driver
//!
//! The reference magnetometer driver. Instead of a FIFO the chip runs in
//! continuous, single-shot or idle mode; rate negotiation follows the same
//! pattern as the IMU drivers and writes `CFG_REG_A` only when the
//! (mode, rate) pair actually changes.

pub mod registers;

use registers::Lis2mdl as RegisterDevice;
use registers::{Mode, odr};

use crate::Error;
use crate::interface::{DeviceInterface, Transport};
use crate::power::ChannelMode;
use crate::sensors::odr::{RateLadder, Rung};
use crate::sensors::{Magnetometer, RateChange, RateUpdate};

/// Supported output data rates, fastest first
pub const ODR_LADDER: RateLadder<u8> = RateLadder::new(&[
    Rung { hz: 100.0, code: odr::HZ_100 },
    Rung { hz: 50.0, code: odr::HZ_50 },
    Rung { hz: 20.0, code: odr::HZ_20 },
    Rung { hz: 10.0, code: odr::HZ_10 },
]);

/// Gauss per LSB (1.5 mG/LSB)
const SENSITIVITY: f32 = 0.0015;
/// LSB per °C
const TEMP_SENSITIVITY: f32 = 8.0;
/// Raw sample length: X, Y, Z little endian
const SAMPLE_LEN: usize = 6;
/// Polls (1 ms apart) before a single measurement is given up on
const ONESHOT_POLL_LIMIT: u32 = 50;

/// LIS2MDL driver
pub struct Lis2mdlDriver<T> {
    device: RegisterDevice<DeviceInterface<T>>,
    /// Mode and rate code last written, `None` when unknown
    applied: Option<(Mode, u8)>,
    oneshot_pending: bool,
}

impl<T: Transport> Lis2mdlDriver<T> {
    /// Create a driver for the device at `address`
    pub fn new(transport: T, address: u8) -> Self {
        Self {
            device: RegisterDevice::new(DeviceInterface::new(transport, address)),
            applied: None,
            oneshot_pending: false,
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
    /// Returns `Error::InvalidDevice` with the value read if it is not 0x40, or
    /// a bus error if communication fails.
    pub fn verify_identity(&mut self) -> Result<(), Error<T::Error>> {
        let who_am_i = self.device.who_am_i().read()?.who_am_i();
        if who_am_i != registers::WHO_AM_I_VALUE {
            return Err(Error::InvalidDevice(who_am_i));
        }
        Ok(())
    }

    fn last_rate_code(&self) -> u8 {
        self.applied.map_or(odr::HZ_10, |(_, code)| code)
    }

    fn write_config(&mut self, mode: Mode, code: u8) -> Result<(), Error<T::Error>> {
        let result = self.device.cfg_reg_a().write(|w| {
            w.set_md(mode as u8);
            w.set_odr(code);
        });
        match result {
            Ok(()) => {
                self.applied = Some((mode, code));
                Ok(())
            }
            Err(error) => {
                self.applied = None;
                #[cfg(feature = "defmt")]
                defmt::error!("Communication error");
                Err(Error::Bus(error))
            }
        }
    }
}

impl<T: Transport> Magnetometer for Lis2mdlDriver<T> {
    type BusError = T::Error;

    fn init(&mut self, requested: f32) -> Result<f32, Error<T::Error>> {
        self.applied = None;
        self.oneshot_pending = false;
        let update = self.set_rate(requested)?;
        Ok(update.achieved)
    }

    fn shutdown(&mut self) -> Result<(), Error<T::Error>> {
        self.applied = None;
        self.oneshot_pending = false;
        self.device.cfg_reg_a().write(|w| {
            w.set_soft_rst(true);
        })?;
        Ok(())
    }

    fn set_rate(&mut self, requested: f32) -> Result<RateUpdate<f32>, Error<T::Error>> {
        // Standby and off both idle the chip; single-shot is driven explicitly
        let (mode, code, achieved) = if ChannelMode::from_period(requested).is_sampling() {
            let rung = ODR_LADDER.select(1.0 / requested);
            (Mode::Continuous, rung.code, 1.0 / rung.hz)
        } else {
            (Mode::Idle, self.last_rate_code(), 0.0)
        };

        if self.applied == Some((mode, code)) {
            return Ok(RateUpdate {
                achieved,
                change: RateChange::Unchanged,
            });
        }

        self.write_config(mode, code)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("LIS2MDL: {} at {}s", mode, achieved);

        Ok(RateUpdate {
            achieved,
            change: RateChange::Applied,
        })
    }

    fn trigger_oneshot(&mut self) -> Result<(), Error<T::Error>> {
        let code = self.last_rate_code();
        self.write_config(Mode::Single, code)?;
        // The chip returns to idle by itself once the conversion is done
        self.applied = Some((Mode::Idle, code));
        self.oneshot_pending = true;
        Ok(())
    }

    fn read_mag(&mut self) -> Result<[f32; 3], Error<T::Error>> {
        if self.oneshot_pending {
            let mut polls = 0;
            while Mode::from_bits(self.device.cfg_reg_a().read()?.md()) == Mode::Single {
                if polls >= ONESHOT_POLL_LIMIT {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("LIS2MDL: single measurement timed out");
                    return Err(Error::Timeout);
                }
                self.device.interface.transport().delay_ms(1);
                polls += 1;
            }
            self.oneshot_pending = false;
        }

        let mut raw = [0u8; SAMPLE_LEN];
        self.device.interface.read(registers::OUTX_L, &mut raw)?;
        Ok(decode(&raw))
    }

    fn read_temperature(&mut self) -> Result<f32, Error<T::Error>> {
        let mut raw = [0u8; 2];
        self.device.interface.read(registers::TEMP_OUT_L, &mut raw)?;
        Ok(f32::from(i16::from_le_bytes(raw)) / TEMP_SENSITIVITY)
    }

    fn sample_len(&self) -> usize {
        SAMPLE_LEN
    }

    fn decode_sample(&self, raw: &[u8]) -> Option<[f32; 3]> {
        let raw: &[u8; SAMPLE_LEN] = raw.get(..SAMPLE_LEN)?.try_into().ok()?;
        Some(decode(raw))
    }
}

fn decode(raw: &[u8; SAMPLE_LEN]) -> [f32; 3] {
    core::array::from_fn(|axis| {
        f32::from(i16::from_le_bytes([raw[axis * 2], raw[axis * 2 + 1]])) * SENSITIVITY
    })
}
