//! Firmware build identity
//!
//! A packed build timestamp stored in the retained block. A block written by a
//! different build is discarded at boot.

/// Placeholder for a date or time component that could not be parsed
const UNKNOWN: i32 = 99;

/// Compact fingerprint of the firmware build time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BuildIdentity(u32);

impl BuildIdentity {
    /// Wrap a raw identity value
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw identity value as stored in the retained block
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Pack a build date and time
    ///
    /// The masks on the individual components are part of the stored format
    /// and are kept as-is, so distinct times may share an identity.
    pub const fn from_parts(
        year: i32,
        month: i32,
        day: i32,
        hour: i32,
        minute: i32,
        second: i32,
    ) -> Self {
        let packed = (year.wrapping_sub(2020) & 127) as u32;
        let packed = packed * 12 + (month & 15) as u32;
        let packed = packed * 31 + (day & 31) as u32;
        let packed = packed * 24 + (hour & 24) as u32;
        let packed = packed * 60 + (minute & 60) as u32;
        let packed = packed * 60 + (second & 60) as u32;
        Self(packed)
    }

    /// Pack compiler-style build strings
    ///
    /// `date` is `"Mmm dd yyyy"` (day may be space padded) and `time` is
    /// `"hh:mm:ss"`. A string starting with `?` or too short to parse marks all
    /// of its components unknown (99).
    ///
    /// # Example
    ///
    /// ```
    /// # use tracker_sensors::BuildIdentity;
    /// let build = BuildIdentity::from_build_strings("Mar  7 2025", "14:05:09");
    /// assert_eq!(build, BuildIdentity::from_parts(2025, 3, 7, 14, 5, 9));
    /// ```
    pub const fn from_build_strings(date: &str, time: &str) -> Self {
        let date = date.as_bytes();
        let time = time.as_bytes();

        let (year, month, day) = if date.len() < 11 || date[0] == b'?' {
            (UNKNOWN, UNKNOWN, UNKNOWN)
        } else {
            let year = digit(date[7]) * 1000
                + digit(date[8]) * 100
                + digit(date[9]) * 10
                + digit(date[10]);
            let tens = if date[4] >= b'0' { digit(date[4]) * 10 } else { 0 };
            (year, month_number(date[0], date[1], date[2]), tens + digit(date[5]))
        };

        let (hour, minute, second) = if time.len() < 8 || time[0] == b'?' {
            (UNKNOWN, UNKNOWN, UNKNOWN)
        } else {
            (
                digit(time[0]) * 10 + digit(time[1]),
                digit(time[3]) * 10 + digit(time[4]),
                digit(time[6]) * 10 + digit(time[7]),
            )
        };

        Self::from_parts(year, month, day, hour, minute, second)
    }
}

const fn digit(byte: u8) -> i32 {
    byte as i32 - b'0' as i32
}

const fn month_number(a: u8, b: u8, c: u8) -> i32 {
    match (a, b, c) {
        (b'J', b'a', b'n') => 1,
        (b'F', _, _) => 2,
        (b'M', b'a', b'r') => 3,
        (b'A', b'p', _) => 4,
        (b'M', b'a', b'y') => 5,
        (b'J', b'u', b'n') => 6,
        (b'J', b'u', b'l') => 7,
        (b'A', b'u', _) => 8,
        (b'S', _, _) => 9,
        (b'O', _, _) => 10,
        (b'N', _, _) => 11,
        (b'D', _, _) => 12,
        _ => UNKNOWN,
    }
}
