//! High-resolution FIFO packet decoding
//!
//! With `FIFO_CONFIG3` selecting accel + gyro + hi-res, every FIFO record is a
//! 20-byte packet:
//!
//! | Bytes  | Content                                                   |
//! |--------|-----------------------------------------------------------|
//! | 0      | Header (`0x78`: accel, gyro, hi-res, timestamp present)   |
//! | 1..7   | Accel X, Y, Z bits 19..4, big endian                      |
//! | 7..13  | Gyro X, Y, Z bits 19..4, big endian                       |
//! | 13..15 | Temperature                                               |
//! | 15..17 | Timestamp                                                 |
//! | 17..20 | X, Y, Z extension: accel bits 3..0 in the high nibble,    |
//! |        | gyro bits 3..0 in the low nibble                          |
//!
//! A channel with no data carries the sentinel `0x8000` on all three axes.
//! Reads past the end of the FIFO return `0x7F` filled packets, which fail the
//! header check.

use crate::sensors::{ImuSample, PacketError};

/// Size of one FIFO packet in bytes
pub const PACKET_SIZE: usize = 20;

/// Header of a packet carrying accel, gyro and timestamp in hi-res format
pub const HEADER_HIRES: u8 = 0x78;

/// Channel payload of a channel without data
const INVALID_AXES: [u8; 6] = [0x80, 0x00, 0x80, 0x00, 0x80, 0x00];

const ACCEL_OFFSET: usize = 1;
const GYRO_OFFSET: usize = 7;
const EXTENSION_OFFSET: usize = 17;

/// g per LSB of a 20-bit sample (hi-res packets are fixed at ±32 g)
pub const ACCEL_SCALE: f32 = 32.0 / 524_288.0;
/// °/s per LSB of a 20-bit sample (hi-res packets are fixed at ±4000 °/s)
pub const GYRO_SCALE: f32 = 4000.0 / 524_288.0;

/// Sign-extend a 20-bit sample from its high byte, low byte and 4-bit extension
fn unpack_axis(high: u8, low: u8, extension: u8) -> i32 {
    // Place the 20 bits at the top of an i32 and shift back arithmetically
    i32::from_be_bytes([high, low, extension << 4, 0]) >> 12
}

/// Raw 20-bit accelerometer samples of a packet
pub fn accel_raw(packet: &[u8; PACKET_SIZE]) -> [i32; 3] {
    core::array::from_fn(|axis| {
        unpack_axis(
            packet[ACCEL_OFFSET + axis * 2],
            packet[ACCEL_OFFSET + axis * 2 + 1],
            packet[EXTENSION_OFFSET + axis] >> 4,
        )
    })
}

/// Raw 20-bit gyroscope samples of a packet
pub fn gyro_raw(packet: &[u8; PACKET_SIZE]) -> [i32; 3] {
    core::array::from_fn(|axis| {
        unpack_axis(
            packet[GYRO_OFFSET + axis * 2],
            packet[GYRO_OFFSET + axis * 2 + 1],
            packet[EXTENSION_OFFSET + axis] & 0x0F,
        )
    })
}

#[allow(clippy::cast_precision_loss)]
fn scale(raw: [i32; 3], factor: f32) -> [f32; 3] {
    raw.map(|value| value as f32 * factor)
}

/// Decode packet `index` of `buffer`
///
/// # Errors
///
/// - [`PacketError::Truncated`] if the packet lies outside `buffer`
/// - [`PacketError::Header`] if the header is not [`HEADER_HIRES`]
/// - [`PacketError::Empty`] if neither channel carries data
/// - [`PacketError::Corrupt`] if the gyro carries data but the accel does not
pub fn decode(buffer: &[u8], index: usize) -> Result<ImuSample, PacketError> {
    let start = index * PACKET_SIZE;
    let packet: &[u8; PACKET_SIZE] = buffer
        .get(start..start + PACKET_SIZE)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(PacketError::Truncated)?;

    if packet[0] != HEADER_HIRES {
        return Err(PacketError::Header(packet[0]));
    }

    let accel_valid = packet[ACCEL_OFFSET..ACCEL_OFFSET + 6] != INVALID_AXES;
    let gyro_valid = packet[GYRO_OFFSET..GYRO_OFFSET + 6] != INVALID_AXES;

    match (accel_valid, gyro_valid) {
        (false, false) => Err(PacketError::Empty),
        (false, true) => Err(PacketError::Corrupt),
        (true, gyro_valid) => Ok(ImuSample {
            accel: scale(accel_raw(packet), ACCEL_SCALE),
            gyro: if gyro_valid {
                scale(gyro_raw(packet), GYRO_SCALE)
            } else {
                [0.0; 3]
            },
        }),
    }
}
