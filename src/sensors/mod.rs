//! Sensor capability interface
//!
//! Every IMU driver implements [`Imu`] and every magnetometer driver
//! implements [`Magnetometer`]. The set of operations is fixed: a driver that
//! lacks a capability (no pass-through, no wake-on-motion) still provides the
//! operation as a no-op, so callers can invoke anything on any detected device.

pub mod none;
pub mod odr;

use crate::Error;
use crate::interrupt::InterruptPinConfig;

/// Sampling periods of the two IMU channels, in seconds
///
/// `0.0` (or any non-positive value) means off, `f32::INFINITY` means standby.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Periods {
    /// Accelerometer sampling period
    pub accel: f32,
    /// Gyroscope sampling period
    pub gyro: f32,
}

impl Periods {
    /// Both channels off
    pub const OFF: Self = Self::new(0.0, 0.0);

    /// Create a period pair
    pub const fn new(accel: f32, gyro: f32) -> Self {
        Self { accel, gyro }
    }
}

/// Full-scale ranges of the two IMU channels
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FullScale {
    /// Accelerometer range in g
    pub accel_g: f32,
    /// Gyroscope range in °/s
    pub gyro_dps: f32,
}

/// Whether rate negotiation touched the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RateChange {
    /// New settings were written to the device
    Applied,
    /// The requested configuration was already active; nothing was written
    Unchanged,
}

/// Result of rate negotiation
///
/// Callers must use `achieved` for downstream timing, not the requested values.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RateUpdate<P> {
    /// Achieved sampling period(s); `0.0` for channels that are not sampling
    pub achieved: P,
    /// Whether the device was reconfigured
    pub change: RateChange,
}

/// One decoded IMU sample in physical units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImuSample {
    /// Acceleration in g (x, y, z)
    pub accel: [f32; 3],
    /// Angular rate in °/s (x, y, z)
    pub gyro: [f32; 3],
}

/// Why a FIFO packet was not decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// Header did not match the expected enabled-channel mask (contains the header)
    Header(u8),
    /// Well-formed header but no channel carried data
    Empty,
    /// Channel validity flags are inconsistent
    Corrupt,
    /// The packet index lies beyond the buffer
    Truncated,
}

/// Samples decoded from one FIFO burst
#[derive(Debug, Clone, Default)]
pub struct FifoBatch<const N: usize> {
    /// Valid samples in FIFO order
    pub samples: heapless::Vec<ImuSample, N>,
    /// Benign empty slots skipped
    pub empty: usize,
    /// Packets rejected for a bad header, corruption or truncation
    pub rejected: usize,
    /// Valid samples that did not fit into `samples`
    pub overflow: usize,
}

/// IMU capability interface
pub trait Imu {
    /// Transport error type
    type BusError;

    /// Initialize the device and negotiate the requested sampling periods
    ///
    /// `external_clock_hz` is the frequency of an external reference clock fed
    /// to the chip, or `0.0` to use the internal oscillator.
    ///
    /// # Errors
    ///
    /// Returns an error if any transfer of the initialization sequence failed.
    fn init(
        &mut self,
        external_clock_hz: f32,
        requested: Periods,
    ) -> Result<Periods, Error<Self::BusError>>;

    /// Reset the device into its lowest-power state
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    fn shutdown(&mut self) -> Result<(), Error<Self::BusError>>;

    /// Request full-scale ranges, returning the ranges actually in effect
    fn set_full_scale(&mut self, requested: FullScale) -> FullScale;

    /// Negotiate sampling periods
    ///
    /// # Errors
    ///
    /// Returns an error if any register write failed. All writes are attempted.
    fn set_rate(
        &mut self,
        requested: Periods,
    ) -> Result<RateUpdate<Periods>, Error<Self::BusError>>;

    /// Size of one FIFO packet in bytes
    fn packet_size(&self) -> usize;

    /// Drain the FIFO into `buffer`, returning the number of packets read
    ///
    /// Packets that do not fit are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    fn read_fifo(&mut self, buffer: &mut [u8]) -> Result<usize, Error<Self::BusError>>;

    /// Decode packet `index` of a buffer filled by [`read_fifo`](Self::read_fifo)
    ///
    /// # Errors
    ///
    /// Returns the reason the packet carries no usable sample.
    fn decode_packet(&self, buffer: &[u8], index: usize) -> Result<ImuSample, PacketError>;

    /// Decode the first `packets` packets of `buffer`
    fn decode_fifo<const N: usize>(&self, buffer: &[u8], packets: usize) -> FifoBatch<N> {
        let mut batch = FifoBatch::default();
        for index in 0..packets {
            match self.decode_packet(buffer, index) {
                Ok(sample) => {
                    if batch.samples.push(sample).is_err() {
                        batch.overflow += 1;
                    }
                }
                Err(PacketError::Empty) => batch.empty += 1,
                Err(_) => batch.rejected += 1,
            }
        }

        #[cfg(feature = "defmt")]
        if batch.rejected > 0 || batch.overflow > 0 {
            defmt::debug!(
                "FIFO decode: {} valid, {} empty, {} rejected, {} overflow",
                batch.samples.len(),
                batch.empty,
                batch.rejected,
                batch.overflow
            );
        }

        batch
    }

    /// Read the current acceleration in g, bypassing the FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    fn read_accel(&mut self) -> Result<[f32; 3], Error<Self::BusError>>;

    /// Read the current angular rate in °/s, bypassing the FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    fn read_gyro(&mut self) -> Result<[f32; 3], Error<Self::BusError>>;

    /// Read the die temperature in °C
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    fn read_temperature(&mut self) -> Result<f32, Error<Self::BusError>>;

    /// Arm wake-on-motion and return how the MCU interrupt pin must be set up
    ///
    /// # Errors
    ///
    /// Returns an error if any transfer of the sequence failed.
    fn configure_wake_on_motion(&mut self) -> Result<InterruptPinConfig, Error<Self::BusError>>;

    /// Enable or disable auxiliary bus pass-through to an attached magnetometer
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    fn configure_passthrough(&mut self, enable: bool) -> Result<(), Error<Self::BusError>>;
}

/// Magnetometer capability interface
pub trait Magnetometer {
    /// Transport error type
    type BusError;

    /// Initialize the device and negotiate the requested sampling period
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    fn init(&mut self, requested: f32) -> Result<f32, Error<Self::BusError>>;

    /// Reset the device into its lowest-power state
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    fn shutdown(&mut self) -> Result<(), Error<Self::BusError>>;

    /// Negotiate the sampling period
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    fn set_rate(&mut self, requested: f32) -> Result<RateUpdate<f32>, Error<Self::BusError>>;

    /// Start a single measurement
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    fn trigger_oneshot(&mut self) -> Result<(), Error<Self::BusError>>;

    /// Read the magnetic field in gauss
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails or a pending single
    /// measurement does not complete.
    fn read_mag(&mut self) -> Result<[f32; 3], Error<Self::BusError>>;

    /// Read the die temperature in °C
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    fn read_temperature(&mut self) -> Result<f32, Error<Self::BusError>>;

    /// Length of one raw sample in bytes
    fn sample_len(&self) -> usize;

    /// Convert one raw sample (as read from the data registers) to gauss
    fn decode_sample(&self, raw: &[u8]) -> Option<[f32; 3]>;
}
