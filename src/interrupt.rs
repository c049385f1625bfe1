//! Interrupt pin configuration reported by wake-on-motion setup
//!
//! After a driver arms wake-on-motion it tells the caller how the MCU pin
//! wired to the sensor interrupt output must be configured: which pull
//! resistor to enable and which level wakes the system.
//!
//! # Example
//!
//! ```
//! # use tracker_sensors::interrupt::{InterruptPinConfig, Pull, Sense};
//! let pin = InterruptPinConfig::active_low();
//! assert_eq!(pin.pull, Pull::Up);
//! assert_eq!(pin.sense, Sense::Low);
//! ```

/// Pull resistor on the MCU interrupt pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    /// No pull resistor
    None = 0,
    /// Pull-down resistor
    Down = 1,
    /// Pull-up resistor
    Up = 3,
}

/// Pin level that signals the interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sense {
    /// Wake on high level
    High = 2,
    /// Wake on low level
    Low = 3,
}

/// Interrupt pin electrical configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptPinConfig {
    /// Pull resistor to enable
    pub pull: Pull,
    /// Active level
    pub sense: Sense,
}

impl InterruptPinConfig {
    /// Active-low output with a pull-up (open-drain or push-pull low pulse)
    pub const fn active_low() -> Self {
        Self {
            pull: Pull::Up,
            sense: Sense::Low,
        }
    }

    /// Active-high output with a pull-down
    pub const fn active_high() -> Self {
        Self {
            pull: Pull::Down,
            sense: Sense::High,
        }
    }

    /// Pack as `pull << 4 | sense`, the layout GPIO sense configuration expects
    pub const fn packed(self) -> u8 {
        (self.pull as u8) << 4 | self.sense as u8
    }
}
