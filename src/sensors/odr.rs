//! Output data rate ladders
//!
//! A [`RateLadder`] lists the discrete rates a channel supports, fastest first,
//! together with the register code for each. Selection picks the fastest rate
//! that does not exceed the target; targets above the top rung saturate to it
//! and targets below the bottom rung clamp to the slowest rate.

/// Relative slack allowed when comparing a target against a rung
///
/// Periods reported back to callers are reciprocals of ladder rates; feeding one
/// back in must land on the same rung despite float rounding.
const RATE_TOLERANCE: f32 = 1e-3;

/// One rung of a rate ladder
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rung<C> {
    /// Rate in Hz
    pub hz: f32,
    /// Register code selecting this rate
    pub code: C,
}

/// Supported output data rates, fastest first
#[derive(Debug, Clone, Copy)]
pub struct RateLadder<C: 'static> {
    rungs: &'static [Rung<C>],
}

impl<C: Copy> RateLadder<C> {
    /// Create a ladder from rungs sorted by descending rate
    ///
    /// # Panics
    ///
    /// Panics (at compile time when used in a `const`) if the ladder is empty
    /// or not strictly descending.
    pub const fn new(rungs: &'static [Rung<C>]) -> Self {
        assert!(!rungs.is_empty(), "rate ladder must not be empty");
        let mut i = 1;
        while i < rungs.len() {
            assert!(
                rungs[i].hz < rungs[i - 1].hz,
                "rate ladder must be strictly descending"
            );
            i += 1;
        }
        Self { rungs }
    }

    /// Fastest supported rung
    pub const fn fastest(&self) -> Rung<C> {
        self.rungs[0]
    }

    /// Slowest supported rung
    pub const fn slowest(&self) -> Rung<C> {
        self.rungs[self.rungs.len() - 1]
    }

    /// All rungs, fastest first
    pub const fn rungs(&self) -> &'static [Rung<C>] {
        self.rungs
    }

    /// Pick the fastest rung not exceeding `target_hz`
    pub fn select(&self, target_hz: f32) -> Rung<C> {
        let limit = target_hz * (1.0 + RATE_TOLERANCE);
        self.rungs
            .iter()
            .copied()
            .find(|rung| rung.hz <= limit)
            .unwrap_or_else(|| self.slowest())
    }
}
