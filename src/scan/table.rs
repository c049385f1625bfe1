//! Length-prefixed probe tables
//!
//! A probe table describes the address/register/id space of one bus role in
//! four flat arrays:
//!
//! - `addresses`: per group, a count followed by that many bus addresses
//! - `registers`: per group, a count followed by that many id registers
//! - `ids`: per register (across all groups, in order), a count followed by
//!   that many expected id values
//! - `devices`: one device type per id, in the same order as the ids
//!
//! ```text
//! addresses: [2, 0x68, 0x69,   2, 0x6A, 0x6B]
//! registers: [1, 0x75,         1, 0x0F]
//! ids:       [2, 0x68, 0x71,   1, 0x6C]
//! devices:   [Mpu6050, Icm42688, Lsm6dso]
//! ```
//!
//! [`ProbeTable::new`] checks the counts in const context, so a malformed table
//! declared as a `const` or `static` fails to compile.

/// Side-effecting write needed before an id register becomes readable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PreRead {
    /// Id register the action applies to
    pub register: u8,
    /// First bus address the action applies to
    pub address_min: u8,
    /// Last bus address the action applies to (inclusive)
    pub address_max: u8,
    /// Control register to write
    pub write_register: u8,
    /// Value to write
    pub value: u8,
    /// Wait after the write, in milliseconds
    pub settle_ms: u32,
}

impl PreRead {
    /// True if this action must run before reading `register` at `address`
    pub const fn applies(&self, address: u8, register: u8) -> bool {
        self.register == register && address >= self.address_min && address <= self.address_max
    }
}

/// Static probe table for one bus role
#[derive(Debug)]
pub struct ProbeTable<D: 'static> {
    group_count: usize,
    addresses: &'static [u8],
    registers: &'static [u8],
    ids: &'static [u8],
    devices: &'static [D],
    pre_reads: &'static [PreRead],
}

impl<D: 'static> ProbeTable<D> {
    /// Build a table, checking that all counts are consistent
    ///
    /// # Panics
    ///
    /// Panics if the arrays are not consumed exactly by their length prefixes.
    /// Used in a `const` item this is a compile error.
    pub const fn new(
        addresses: &'static [u8],
        registers: &'static [u8],
        ids: &'static [u8],
        devices: &'static [D],
        pre_reads: &'static [PreRead],
    ) -> Self {
        let mut a = 0;
        let mut r = 0;
        let mut i = 0;
        let mut device_count = 0;
        let mut group_count = 0;

        while a < addresses.len() {
            let address_count = addresses[a] as usize;
            assert!(address_count > 0, "empty address group");
            a += 1 + address_count;
            assert!(a <= addresses.len(), "address group overruns table");

            assert!(r < registers.len(), "missing register group");
            let register_count = registers[r] as usize;
            assert!(register_count > 0, "empty register group");
            r += 1 + register_count;
            assert!(r <= registers.len(), "register group overruns table");

            let mut k = 0;
            while k < register_count {
                assert!(i < ids.len(), "missing id group");
                let id_count = ids[i] as usize;
                assert!(id_count > 0, "empty id group");
                i += 1 + id_count;
                assert!(i <= ids.len(), "id group overruns table");
                device_count += id_count;
                k += 1;
            }

            group_count += 1;
        }

        assert!(r == registers.len(), "unused register groups");
        assert!(i == ids.len(), "unused id groups");
        assert!(device_count == devices.len(), "device count does not match ids");

        Self {
            group_count,
            addresses,
            registers,
            ids,
            devices,
            pre_reads,
        }
    }

    /// Number of address groups
    pub const fn group_count(&self) -> usize {
        self.group_count
    }

    /// Iterate over the address groups in table order
    pub fn groups(&self) -> Groups<'_, D> {
        Groups {
            table: self,
            a: 0,
            r: 0,
            i: 0,
            d: 0,
        }
    }

    /// Pre-read action for `register` at `address`, if any
    pub fn pre_read(&self, address: u8, register: u8) -> Option<&PreRead> {
        self.pre_reads
            .iter()
            .find(|action| action.applies(address, register))
    }
}

/// One address group: the addresses and the registers probed on each
#[derive(Debug)]
pub struct ProbeGroup<'a, D> {
    /// Candidate bus addresses
    pub addresses: &'a [u8],
    registers: &'a [u8],
    ids: &'a [u8],
    devices: &'a [D],
}

impl<'a, D> ProbeGroup<'a, D> {
    /// Iterate over the register probes of this group
    pub fn probes(&self) -> Probes<'a, D> {
        Probes {
            registers: self.registers,
            ids: self.ids,
            devices: self.devices,
        }
    }
}

/// One id register and the ids it may hold
#[derive(Debug)]
pub struct RegisterProbe<'a, D> {
    /// Id register
    pub register: u8,
    /// Accepted id values
    pub ids: &'a [u8],
    /// Device type for each id
    pub devices: &'a [D],
}

impl<D: Copy> RegisterProbe<'_, D> {
    /// Device type identified by `value`, if it is one of the ids
    pub fn lookup(&self, value: u8) -> Option<D> {
        self.ids
            .iter()
            .position(|&id| id == value)
            .map(|index| self.devices[index])
    }
}

/// Iterator over address groups
pub struct Groups<'a, D: 'static> {
    table: &'a ProbeTable<D>,
    a: usize,
    r: usize,
    i: usize,
    d: usize,
}

impl<'a, D: 'static> Iterator for Groups<'a, D> {
    type Item = ProbeGroup<'a, D>;

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.table;
        let address_count = usize::from(*table.addresses.get(self.a)?);
        let addresses = &table.addresses[self.a + 1..self.a + 1 + address_count];
        self.a += 1 + address_count;

        let register_count = usize::from(table.registers[self.r]);
        let registers = &table.registers[self.r + 1..self.r + 1 + register_count];
        self.r += 1 + register_count;

        // Span of ids and devices belonging to this group
        let id_start = self.i;
        let device_start = self.d;
        for _ in 0..register_count {
            let id_count = usize::from(table.ids[self.i]);
            self.i += 1 + id_count;
            self.d += id_count;
        }

        Some(ProbeGroup {
            addresses,
            registers,
            ids: &table.ids[id_start..self.i],
            devices: &table.devices[device_start..self.d],
        })
    }
}

/// Iterator over the register probes of one group
pub struct Probes<'a, D> {
    registers: &'a [u8],
    ids: &'a [u8],
    devices: &'a [D],
}

impl<'a, D> Iterator for Probes<'a, D> {
    type Item = RegisterProbe<'a, D>;

    fn next(&mut self) -> Option<Self::Item> {
        let (&register, registers) = self.registers.split_first()?;
        let (&id_count, rest) = self.ids.split_first()?;
        let id_count = usize::from(id_count);
        let (ids, rest) = rest.split_at(id_count);
        let (devices, remaining_devices) = self.devices.split_at(id_count);

        self.registers = registers;
        self.ids = rest;
        self.devices = remaining_devices;

        Some(RegisterProbe {
            register,
            ids,
            devices,
        })
    }
}
