//! Byte layout of the retained block
//!
//! ```text
//! offset  size  field
//!      0     4  build identity               u32 LE
//!      4    12  gyro sensitivity scale       [f32; 3] LE
//!     16     8  uptime sum                   u64 LE
//!     24     8  uptime latest                u64 LE
//!     32     8  battery uptime sum           u64 LE
//!     40     8  battery uptime latest        u64 LE
//!     48     4  CRC-32/ISO-HDLC of 0..48     u32 LE
//!     52     4  reserved, not checked
//! ```
//!
//! The field order is shared with firmware that already has blocks in the
//! field and must not change.

use crc::{CRC_32_ISO_HDLC, Crc};

/// Size of the retained region
pub const RETAINED_SIZE: usize = 56;
/// Offset of the CRC field
pub const CRC_OFFSET: usize = 48;
/// Bytes covered by the residue check: all fields up to and including the CRC
pub const CHECKED_LEN: usize = CRC_OFFSET + 4;
/// CRC-32/ISO-HDLC over a message followed by its own little-endian CRC
pub const CRC_RESIDUE: u32 = 0x2144_DF1C;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

const BUILD_OFFSET: usize = 0;
const GYRO_SCALE_OFFSET: usize = 4;
const UPTIME_SUM_OFFSET: usize = 16;
const UPTIME_LATEST_OFFSET: usize = 24;
const BATTERY_SUM_OFFSET: usize = 32;
const BATTERY_LATEST_OFFSET: usize = 40;
const RESERVED_OFFSET: usize = CHECKED_LEN;

/// Decoded retained block
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetainedBlock {
    /// Identity of the build that last wrote the block
    pub build: u32,
    /// Per-axis gyroscope sensitivity correction
    pub gyro_sens_scale: [f32; 3],
    /// Accumulated uptime in ticks
    pub uptime_sum: u64,
    /// Tick count at the last uptime update of this session
    pub uptime_latest: u64,
    /// Accumulated uptime on battery in ticks
    pub battery_uptime_sum: u64,
    /// Tick count at the last battery uptime update of this session
    pub battery_uptime_latest: u64,
    /// Stored CRC
    pub crc: u32,
    /// Bytes after the checked span, carried through unchanged
    pub reserved: [u8; 4],
}

impl RetainedBlock {
    /// Block with every byte zero
    pub const fn zeroed() -> Self {
        Self {
            build: 0,
            gyro_sens_scale: [0.0; 3],
            uptime_sum: 0,
            uptime_latest: 0,
            battery_uptime_sum: 0,
            battery_uptime_latest: 0,
            crc: 0,
            reserved: [0; 4],
        }
    }

    /// Parse a raw block
    pub fn decode(bytes: &[u8; RETAINED_SIZE]) -> Self {
        Self {
            build: read_u32(bytes, BUILD_OFFSET),
            gyro_sens_scale: core::array::from_fn(|axis| {
                f32::from_bits(read_u32(bytes, GYRO_SCALE_OFFSET + axis * 4))
            }),
            uptime_sum: read_u64(bytes, UPTIME_SUM_OFFSET),
            uptime_latest: read_u64(bytes, UPTIME_LATEST_OFFSET),
            battery_uptime_sum: read_u64(bytes, BATTERY_SUM_OFFSET),
            battery_uptime_latest: read_u64(bytes, BATTERY_LATEST_OFFSET),
            crc: read_u32(bytes, CRC_OFFSET),
            reserved: [
                bytes[RESERVED_OFFSET],
                bytes[RESERVED_OFFSET + 1],
                bytes[RESERVED_OFFSET + 2],
                bytes[RESERVED_OFFSET + 3],
            ],
        }
    }

    /// Serialize the block, CRC field included as stored
    pub fn encode(&self) -> [u8; RETAINED_SIZE] {
        let mut bytes = [0u8; RETAINED_SIZE];
        write(&mut bytes, BUILD_OFFSET, &self.build.to_le_bytes());
        for (axis, scale) in self.gyro_sens_scale.iter().enumerate() {
            write(&mut bytes, GYRO_SCALE_OFFSET + axis * 4, &scale.to_le_bytes());
        }
        write(&mut bytes, UPTIME_SUM_OFFSET, &self.uptime_sum.to_le_bytes());
        write(&mut bytes, UPTIME_LATEST_OFFSET, &self.uptime_latest.to_le_bytes());
        write(&mut bytes, BATTERY_SUM_OFFSET, &self.battery_uptime_sum.to_le_bytes());
        write(&mut bytes, BATTERY_LATEST_OFFSET, &self.battery_uptime_latest.to_le_bytes());
        write(&mut bytes, CRC_OFFSET, &self.crc.to_le_bytes());
        write(&mut bytes, RESERVED_OFFSET, &self.reserved);
        bytes
    }

    /// Recompute the CRC over every field before it
    pub fn seal(&mut self) {
        let bytes = self.encode();
        self.crc = CRC32.checksum(&bytes[..CRC_OFFSET]);
    }

    /// True if the checked span of a raw block carries a matching CRC
    pub fn is_intact(bytes: &[u8; RETAINED_SIZE]) -> bool {
        CRC32.checksum(&bytes[..CHECKED_LEN]) == CRC_RESIDUE
    }
}

impl Default for RetainedBlock {
    fn default() -> Self {
        Self::zeroed()
    }
}

fn read_u32(bytes: &[u8; RETAINED_SIZE], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn read_u64(bytes: &[u8; RETAINED_SIZE], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(raw)
}

fn write(bytes: &mut [u8; RETAINED_SIZE], offset: usize, value: &[u8]) {
    bytes[offset..offset + value.len()].copy_from_slice(value);
}
