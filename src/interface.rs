//! Bus transport for sensor roles
//!
//! The [`Transport`] trait is the byte-level port every part of this crate
//! talks through: register reads and burst transfers addressed by bus address
//! and register, delays, and a monotonic tick counter. [`I2cTransport`] and
//! [`SpiTransport`] implement it on top of `embedded-hal`.
//!
//! [`DeviceInterface`] binds a transport to one resolved bus address and
//! implements the `device-driver` register interface, so the generated
//! register maps of the drivers can be used directly.

use device_driver::RegisterInterface;

/// Physical bus kind behind a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusKind {
    /// I2C (fast mode)
    I2c,
    /// SPI
    Spi,
}

/// Monotonic tick source
pub trait Monotonic {
    /// Current tick count since boot
    fn ticks(&self) -> u64;
}

impl<F> Monotonic for F
where
    F: Fn() -> u64,
{
    fn ticks(&self) -> u64 {
        self()
    }
}

/// Byte-level register access over a shared bus
///
/// All register I/O of one sensor role goes through a single transport owner.
/// Multi-step sequences are not atomic at this layer; if several tasks share a
/// physical bus, the implementation must provide the locking.
pub trait Transport {
    /// Bus error type
    type Error: core::fmt::Debug;

    /// Kind of the underlying bus
    fn kind(&self) -> BusKind {
        BusKind::I2c
    }

    /// Read consecutive registers starting at `register`
    ///
    /// # Errors
    ///
    /// Returns the bus error if the transfer fails.
    fn burst_read(&mut self, address: u8, register: u8, data: &mut [u8])
    -> Result<(), Self::Error>;

    /// Write consecutive registers starting at `register`
    ///
    /// # Errors
    ///
    /// Returns the bus error if the transfer fails.
    fn burst_write(&mut self, address: u8, register: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read a single register
    ///
    /// # Errors
    ///
    /// Returns the bus error if the transfer fails.
    fn read_register(&mut self, address: u8, register: u8) -> Result<u8, Self::Error> {
        let mut value = [0u8; 1];
        self.burst_read(address, register, &mut value)?;
        Ok(value[0])
    }

    /// Write a single register
    ///
    /// # Errors
    ///
    /// Returns the bus error if the transfer fails.
    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), Self::Error> {
        self.burst_write(address, register, &[value])
    }

    /// Read `data.len()` bytes from one register in `stride`-sized transfers
    ///
    /// Used for FIFO streaming where the data register does not auto-increment.
    ///
    /// # Errors
    ///
    /// Returns the bus error of the first failing transfer.
    fn burst_read_interval(
        &mut self,
        address: u8,
        register: u8,
        data: &mut [u8],
        stride: usize,
    ) -> Result<(), Self::Error> {
        for chunk in data.chunks_mut(stride.max(1)) {
            self.burst_read(address, register, chunk)?;
        }
        Ok(())
    }

    /// Busy-wait for `us` microseconds
    fn delay_us(&mut self, us: u32);

    /// Sleep for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);

    /// Monotonic tick count since boot
    fn monotonic_ticks(&self) -> u64;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn kind(&self) -> BusKind {
        (**self).kind()
    }

    fn burst_read(
        &mut self,
        address: u8,
        register: u8,
        data: &mut [u8],
    ) -> Result<(), Self::Error> {
        (**self).burst_read(address, register, data)
    }

    fn burst_write(&mut self, address: u8, register: u8, data: &[u8]) -> Result<(), Self::Error> {
        (**self).burst_write(address, register, data)
    }

    fn read_register(&mut self, address: u8, register: u8) -> Result<u8, Self::Error> {
        (**self).read_register(address, register)
    }

    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), Self::Error> {
        (**self).write_register(address, register, value)
    }

    fn burst_read_interval(
        &mut self,
        address: u8,
        register: u8,
        data: &mut [u8],
        stride: usize,
    ) -> Result<(), Self::Error> {
        (**self).burst_read_interval(address, register, data, stride)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms);
    }

    fn monotonic_ticks(&self) -> u64 {
        (**self).monotonic_ticks()
    }
}

/// I2C transport
pub struct I2cTransport<I2C, D, C> {
    i2c: I2C,
    delay: D,
    clock: C,
}

impl<I2C, D, C> I2cTransport<I2C, D, C> {
    /// Create a new I2C transport
    ///
    /// # Arguments
    /// * `i2c` - The I2C peripheral
    /// * `delay` - Delay provider
    /// * `clock` - Monotonic tick source
    pub const fn new(i2c: I2C, delay: D, clock: C) -> Self {
        Self { i2c, delay, clock }
    }

    /// Consume the transport and return the I2C peripheral
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, D, C> Transport for I2cTransport<I2C, D, C>
where
    I2C: embedded_hal::i2c::I2c,
    D: embedded_hal::delay::DelayNs,
    C: Monotonic,
{
    type Error = I2C::Error;

    fn burst_read(
        &mut self,
        address: u8,
        register: u8,
        data: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c.write_read(address, &[register], data)
    }

    fn burst_write(&mut self, address: u8, register: u8, data: &[u8]) -> Result<(), Self::Error> {
        // Adjacent writes go out as one transfer: register address, then payload
        let header = [register];
        let mut operations = [
            embedded_hal::i2c::Operation::Write(&header),
            embedded_hal::i2c::Operation::Write(data),
        ];

        self.i2c.transaction(address, &mut operations)
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    fn monotonic_ticks(&self) -> u64 {
        self.clock.ticks()
    }
}

/// SPI transport
///
/// Uses the `SpiDevice` trait from `embedded-hal`, so chip select is handled by
/// the device implementation. The bus address passed to the [`Transport`]
/// methods is ignored: one SPI device is one sensor.
pub struct SpiTransport<SPI, D, C> {
    spi: SPI,
    delay: D,
    clock: C,
}

impl<SPI, D, C> SpiTransport<SPI, D, C> {
    /// Create a new SPI transport
    pub const fn new(spi: SPI, delay: D, clock: C) -> Self {
        Self { spi, delay, clock }
    }

    /// Consume the transport and return the SPI device
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI, D, C> Transport for SpiTransport<SPI, D, C>
where
    SPI: embedded_hal::spi::SpiDevice,
    D: embedded_hal::delay::DelayNs,
    C: Monotonic,
{
    type Error = SPI::Error;

    fn kind(&self) -> BusKind {
        BusKind::Spi
    }

    fn burst_read(
        &mut self,
        _address: u8,
        register: u8,
        data: &mut [u8],
    ) -> Result<(), Self::Error> {
        // For SPI reads, set MSB to 1
        let header = [register | 0x80];

        let mut operations = [
            embedded_hal::spi::Operation::Write(&header),
            embedded_hal::spi::Operation::Read(data),
        ];

        self.spi.transaction(&mut operations)
    }

    fn burst_write(&mut self, _address: u8, register: u8, data: &[u8]) -> Result<(), Self::Error> {
        // For SPI writes, MSB should be 0
        let header = [register & 0x7F];

        let mut operations = [
            embedded_hal::spi::Operation::Write(&header),
            embedded_hal::spi::Operation::Write(data),
        ];

        self.spi.transaction(&mut operations)
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    fn monotonic_ticks(&self) -> u64 {
        self.clock.ticks()
    }
}

/// A transport bound to one resolved device address
///
/// Implements [`RegisterInterface`] so `device-driver` register maps can be
/// driven through any [`Transport`].
pub struct DeviceInterface<T> {
    transport: T,
    address: u8,
}

impl<T: Transport> DeviceInterface<T> {
    /// Bind `transport` to the device at `address`
    pub const fn new(transport: T, address: u8) -> Self {
        Self { transport, address }
    }

    /// Bus address of the device
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Underlying transport
    pub fn transport(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Burst read from the bound device
    ///
    /// # Errors
    ///
    /// Returns the bus error if the transfer fails.
    pub fn read(&mut self, register: u8, data: &mut [u8]) -> Result<(), T::Error> {
        self.transport.burst_read(self.address, register, data)
    }

    /// Burst write to the bound device
    ///
    /// # Errors
    ///
    /// Returns the bus error if the transfer fails.
    pub fn write(&mut self, register: u8, data: &[u8]) -> Result<(), T::Error> {
        self.transport.burst_write(self.address, register, data)
    }

    /// Consume the interface and return the transport
    pub fn release(self) -> T {
        self.transport
    }
}

impl<T: Transport> RegisterInterface for DeviceInterface<T> {
    type Error = T::Error;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits; // Size is implicit in read_data.len()
        self.transport.burst_read(self.address, address, read_data)
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits; // Size is implicit in write_data.len()
        self.transport.burst_write(self.address, address, write_data)
    }
}
