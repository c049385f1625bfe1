//! Placeholder drivers for device types without an implementation
//!
//! The identification tables know far more parts than this crate drives. A
//! role resolved to one of those parts still gets a driver object, so callers
//! dispatch uniformly: `init` reports [`Error::Unsupported`] and every other
//! operation succeeds without touching the bus.

use super::{
    FullScale, Imu, ImuSample, Magnetometer, PacketError, Periods, RateChange, RateUpdate,
};
use crate::Error;
use crate::interface::Transport;
use crate::interrupt::InterruptPinConfig;

/// IMU driver that does nothing
pub struct NoImu<T> {
    transport: T,
}

impl<T: Transport> NoImu<T> {
    /// Wrap a transport
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Return the transport
    pub fn release(self) -> T {
        self.transport
    }
}

impl<T: Transport> Imu for NoImu<T> {
    type BusError = T::Error;

    fn init(
        &mut self,
        _external_clock_hz: f32,
        _requested: Periods,
    ) -> Result<Periods, Error<T::Error>> {
        #[cfg(feature = "defmt")]
        defmt::warn!("No driver for this IMU");
        Err(Error::Unsupported)
    }

    fn shutdown(&mut self) -> Result<(), Error<T::Error>> {
        Ok(())
    }

    fn set_full_scale(&mut self, _requested: FullScale) -> FullScale {
        FullScale {
            accel_g: 0.0,
            gyro_dps: 0.0,
        }
    }

    fn set_rate(&mut self, _requested: Periods) -> Result<RateUpdate<Periods>, Error<T::Error>> {
        Ok(RateUpdate {
            achieved: Periods::OFF,
            change: RateChange::Unchanged,
        })
    }

    fn packet_size(&self) -> usize {
        0
    }

    fn read_fifo(&mut self, _buffer: &mut [u8]) -> Result<usize, Error<T::Error>> {
        Ok(0)
    }

    fn decode_packet(&self, _buffer: &[u8], _index: usize) -> Result<ImuSample, PacketError> {
        Err(PacketError::Empty)
    }

    fn read_accel(&mut self) -> Result<[f32; 3], Error<T::Error>> {
        Ok([0.0; 3])
    }

    fn read_gyro(&mut self) -> Result<[f32; 3], Error<T::Error>> {
        Ok([0.0; 3])
    }

    fn read_temperature(&mut self) -> Result<f32, Error<T::Error>> {
        Ok(0.0)
    }

    fn configure_wake_on_motion(&mut self) -> Result<InterruptPinConfig, Error<T::Error>> {
        Ok(InterruptPinConfig::active_low())
    }

    fn configure_passthrough(&mut self, _enable: bool) -> Result<(), Error<T::Error>> {
        Ok(())
    }
}

/// Magnetometer driver that does nothing
pub struct NoMag<T> {
    transport: T,
}

impl<T: Transport> NoMag<T> {
    /// Wrap a transport
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Return the transport
    pub fn release(self) -> T {
        self.transport
    }
}

impl<T: Transport> Magnetometer for NoMag<T> {
    type BusError = T::Error;

    fn init(&mut self, _requested: f32) -> Result<f32, Error<T::Error>> {
        #[cfg(feature = "defmt")]
        defmt::warn!("No driver for this magnetometer");
        Err(Error::Unsupported)
    }

    fn shutdown(&mut self) -> Result<(), Error<T::Error>> {
        Ok(())
    }

    fn set_rate(&mut self, _requested: f32) -> Result<RateUpdate<f32>, Error<T::Error>> {
        Ok(RateUpdate {
            achieved: 0.0,
            change: RateChange::Unchanged,
        })
    }

    fn trigger_oneshot(&mut self) -> Result<(), Error<T::Error>> {
        Ok(())
    }

    fn read_mag(&mut self) -> Result<[f32; 3], Error<T::Error>> {
        Ok([0.0; 3])
    }

    fn read_temperature(&mut self) -> Result<f32, Error<T::Error>> {
        Ok(0.0)
    }

    fn sample_len(&self) -> usize {
        0
    }

    fn decode_sample(&self, _raw: &[u8]) -> Option<[f32; 3]> {
        None
    }
}
