//! Bus device identification
//!
//! [`identify`] walks a [`ProbeTable`] to find which chip of a role is fitted.
//! For each candidate address it does one throw-away read (some chips NACK the
//! very first transaction after power-up), runs any pre-read action the table
//! declares, then reads each id register and compares the value against the
//! expected ids. The first match wins.
//!
//! A descriptor that carries a previously resolved address or register is
//! scanned in two passes: first restricted to the preferred target, then, if
//! that fails, over the whole table. If nothing answers, the descriptor is
//! marked disabled and later calls return immediately without bus traffic.
//!
//! # Example
//!
//! ```
//! # use tracker_sensors::scan::{BusDescriptor, ADDRESS_DISABLED};
//! let mut role = BusDescriptor::<u8>::new();
//! assert!(!role.is_disabled());
//! role.address = ADDRESS_DISABLED;
//! assert!(role.is_disabled());
//! ```

pub mod table;

pub use table::{PreRead, ProbeGroup, ProbeTable, RegisterProbe};

use core::ops::RangeInclusive;

use crate::interface::Transport;

/// Addresses a preferred address must lie in to restrict the first pass
pub const SCAN_ADDRESS_RANGE: RangeInclusive<u8> = 0x08..=0x77;
/// Address of a role that has not been scanned
pub const ADDRESS_UNRESOLVED: u8 = 0x00;
/// Address of a role with no device; any address from 0x7F up is disabled
pub const ADDRESS_DISABLED: u8 = 0xFF;
/// Register of a role that has not been scanned
pub const REGISTER_UNRESOLVED: u8 = 0xFF;

/// Register read once per address before probing
const DUMMY_REGISTER: u8 = 0x00;

/// Identification state of one sensor role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusDescriptor<D> {
    /// Bus address: [`ADDRESS_UNRESOLVED`], a resolved address, or disabled (≥ 0x7F)
    pub address: u8,
    /// Id register that identified the device, or [`REGISTER_UNRESOLVED`]
    pub register: u8,
    /// Identified device type
    pub device: Option<D>,
}

impl<D> BusDescriptor<D> {
    /// Unresolved descriptor, scanned over the whole table
    pub const fn new() -> Self {
        Self {
            address: ADDRESS_UNRESOLVED,
            register: REGISTER_UNRESOLVED,
            device: None,
        }
    }

    /// Descriptor that tries `address` / `register` first
    ///
    /// Pass [`ADDRESS_UNRESOLVED`] or [`REGISTER_UNRESOLVED`] to leave either
    /// unrestricted.
    pub const fn with_preference(address: u8, register: u8) -> Self {
        Self {
            address,
            register,
            device: None,
        }
    }

    /// Descriptor for a role with no hardware; never scanned
    pub const fn disabled() -> Self {
        Self::with_preference(ADDRESS_DISABLED, REGISTER_UNRESOLVED)
    }

    /// True if the role is skipped
    pub const fn is_disabled(&self) -> bool {
        self.address >= 0x7F
    }

    /// Forget the identification so the next [`identify`] rescans the table
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn preferred_address(&self) -> Option<u8> {
        SCAN_ADDRESS_RANGE
            .contains(&self.address)
            .then_some(self.address)
    }

    fn preferred_register(&self) -> Option<u8> {
        (self.register != REGISTER_UNRESOLVED).then_some(self.register)
    }
}

impl<D> Default for BusDescriptor<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Restriction applied to one scan pass
#[derive(Debug, Clone, Copy)]
struct Preference {
    address: Option<u8>,
    register: Option<u8>,
}

impl Preference {
    const NONE: Self = Self {
        address: None,
        register: None,
    };

    const fn is_restricted(&self) -> bool {
        self.address.is_some() || self.register.is_some()
    }
}

/// Identify the device of a role
///
/// Returns the device type and records address, register and type on the
/// descriptor. Returns `None` (and marks the descriptor disabled) if no device
/// matched, or immediately if the descriptor was already disabled.
pub fn identify<T, D>(
    transport: &mut T,
    descriptor: &mut BusDescriptor<D>,
    table: &ProbeTable<D>,
) -> Option<D>
where
    T: Transport,
    D: Copy + 'static,
{
    if descriptor.is_disabled() {
        #[cfg(feature = "defmt")]
        defmt::debug!("Skipping disabled role");
        return None;
    }

    let preference = Preference {
        address: descriptor.preferred_address(),
        register: descriptor.preferred_register(),
    };

    if let Some(device) = scan(transport, descriptor, table, preference) {
        return Some(device);
    }

    if preference.is_restricted() {
        #[cfg(feature = "defmt")]
        defmt::warn!("No device found at address: 0x{:02X}", descriptor.address);

        descriptor.address = ADDRESS_UNRESOLVED;
        descriptor.register = REGISTER_UNRESOLVED;
        if let Some(device) = scan(transport, descriptor, table, Preference::NONE) {
            return Some(device);
        }
    }

    #[cfg(feature = "defmt")]
    defmt::warn!("No device found");

    descriptor.address = ADDRESS_DISABLED;
    descriptor.register = REGISTER_UNRESOLVED;
    descriptor.device = None;
    None
}

/// One pass over the table
fn scan<T, D>(
    transport: &mut T,
    descriptor: &mut BusDescriptor<D>,
    table: &ProbeTable<D>,
    preference: Preference,
) -> Option<D>
where
    T: Transport,
    D: Copy + 'static,
{
    for group in table.groups() {
        for &address in group.addresses {
            if preference.address.is_some_and(|preferred| preferred != address) {
                continue;
            }

            #[cfg(feature = "defmt")]
            defmt::debug!("Scanning address: 0x{:02X}", address);

            // First transaction after power-up may NACK; the result is irrelevant
            let _ = transport.read_register(address, DUMMY_REGISTER);

            for probe in group.probes() {
                if preference
                    .register
                    .is_some_and(|preferred| preferred != probe.register)
                {
                    continue;
                }

                #[cfg(feature = "defmt")]
                defmt::debug!("Scanning register: 0x{:02X}", probe.register);

                if let Some(action) = table.pre_read(address, probe.register) {
                    if transport
                        .write_register(address, action.write_register, action.value)
                        .is_err()
                    {
                        break;
                    }
                    #[cfg(feature = "defmt")]
                    defmt::debug!(
                        "Pre-read write 0x{:02X} = 0x{:02X}",
                        action.write_register,
                        action.value
                    );
                    transport.delay_ms(action.settle_ms);
                }

                let Ok(value) = transport.read_register(address, probe.register) else {
                    break;
                };

                #[cfg(feature = "defmt")]
                defmt::debug!("Read value: 0x{:02X}", value);

                if let Some(device) = probe.lookup(value) {
                    descriptor.address = address;
                    descriptor.register = probe.register;
                    descriptor.device = Some(device);

                    #[cfg(feature = "defmt")]
                    defmt::info!(
                        "Valid device found at address: 0x{:02X} (register: 0x{:02X}, value: 0x{:02X})",
                        address,
                        probe.register,
                        value
                    );

                    return Some(device);
                }
            }
        }
    }

    None
}
