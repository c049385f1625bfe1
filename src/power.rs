//! Channel power modes requested through sampling periods
//!
//! Rate negotiation takes desired sampling *periods* in seconds rather than
//! rates. Two values carry special meaning:
//! - a non-positive period turns the channel **off**
//! - an infinite period puts the channel in **standby** (powered, not sampling)
//!
//! Chips that cannot tell standby from off treat both the same.
//!
//! # Example
//!
//! ```
//! # use tracker_sensors::power::ChannelMode;
//! assert_eq!(ChannelMode::from_period(0.0), ChannelMode::Off);
//! assert_eq!(ChannelMode::from_period(f32::INFINITY), ChannelMode::Standby);
//! assert_eq!(ChannelMode::from_period(0.0025), ChannelMode::Sampling);
//! ```

/// Requested power state of one sensor channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelMode {
    /// Channel powered down
    Off,
    /// Channel powered but not sampling
    Standby,
    /// Channel sampling at a finite rate
    Sampling,
}

impl ChannelMode {
    /// Interpret a requested sampling period
    #[must_use]
    pub fn from_period(period: f32) -> Self {
        if period.is_nan() || period <= 0.0 {
            Self::Off
        } else if period.is_infinite() {
            Self::Standby
        } else {
            Self::Sampling
        }
    }

    /// True if the channel produces samples
    #[must_use]
    pub const fn is_sampling(self) -> bool {
        matches!(self, Self::Sampling)
    }
}
