#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod interface;
pub mod interrupt;
pub mod power;
pub mod registry;
pub mod retained;
pub mod scan;
pub mod sensors;

pub mod imu;
pub mod mag;

// Re-export main types
pub use imu::icm45686::Icm45686Driver;
pub use interface::{BusKind, DeviceInterface, I2cTransport, Monotonic, SpiTransport, Transport};
pub use interrupt::{InterruptPinConfig, Pull, Sense};
pub use mag::lis2mdl::Lis2mdlDriver;
pub use registry::{ImuDriver, ImuType, MagDriver, MagType};
pub use retained::{BuildIdentity, RetainedBlock, RetainedMemory, RetainedState, RetainedStatus};
pub use scan::{BusDescriptor, identify};
pub use sensors::{
    FifoBatch, FullScale, Imu, ImuSample, Magnetometer, PacketError, Periods, RateChange,
    RateUpdate,
};

/// Driver errors
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Communication error with the device
    Bus(E),
    /// Unexpected identity register value (contains the actual value read)
    InvalidDevice(u8),
    /// The resolved device type has no driver in this firmware
    Unsupported,
    /// The device did not finish an operation within the polling budget
    Timeout,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}

/// Outcome of a best-effort register sequence.
///
/// Every step of a multi-register configuration is attempted even when an
/// earlier transfer failed; the first failure is kept and reported once the
/// sequence is finished.
#[derive(Debug)]
pub(crate) struct BusStatus<E> {
    first_error: Option<E>,
}

impl<E> BusStatus<E> {
    pub(crate) const fn new() -> Self {
        Self { first_error: None }
    }

    /// Record the result of one step, returning its value on success
    pub(crate) fn check<T>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                if self.first_error.is_none() {
                    self.first_error = Some(error);
                }
                None
            }
        }
    }

    /// Finish the sequence, logging and returning the first failure
    pub(crate) fn finish(self) -> Result<(), Error<E>> {
        match self.first_error {
            None => Ok(()),
            Some(error) => {
                #[cfg(feature = "defmt")]
                defmt::error!("Communication error");
                Err(Error::Bus(error))
            }
        }
    }
}
