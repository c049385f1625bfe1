//! Retained state across warm resets
//!
//! A small memory region that survives a warm reset holds the gyroscope
//! calibration scale and the accumulated uptime counters. [`RetainedState`]
//! owns that region for the lifetime of a boot session:
//!
//! 1. [`RetainedState::new`] is constructed as early as possible in boot and
//!    captures the session start tick.
//! 2. [`RetainedState::validate`] checks the CRC residue and the build
//!    identity once, reinitializing the block on any mismatch.
//! 3. [`RetainedState::update`] is called periodically to persist uptime.
//!
//! Every change is resealed and stored immediately, so a reset at any point
//! leaves a block that validates on the next boot.

pub mod block;
pub mod build;

pub use block::{CHECKED_LEN, CRC_OFFSET, CRC_RESIDUE, RETAINED_SIZE, RetainedBlock};
pub use build::BuildIdentity;

use crate::interface::Monotonic;

/// Backing storage of the retained region
pub trait RetainedMemory {
    /// Read the whole region
    fn load(&mut self) -> [u8; RETAINED_SIZE];

    /// Overwrite the whole region
    fn store(&mut self, bytes: &[u8; RETAINED_SIZE]);
}

impl RetainedMemory for [u8; RETAINED_SIZE] {
    fn load(&mut self) -> [u8; RETAINED_SIZE] {
        *self
    }

    fn store(&mut self, bytes: &[u8; RETAINED_SIZE]) {
        *self = *bytes;
    }
}

impl<M: RetainedMemory + ?Sized> RetainedMemory for &mut M {
    fn load(&mut self) -> [u8; RETAINED_SIZE] {
        (**self).load()
    }

    fn store(&mut self, bytes: &[u8; RETAINED_SIZE]) {
        (**self).store(bytes);
    }
}

/// Validation state of the retained block in this boot session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RetainedStatus {
    /// [`RetainedState::validate`] has not run yet
    Uninitialized,
    /// The block from the previous session was accepted
    Valid,
    /// The block was discarded and reset to defaults
    Reinitialized,
}

/// Retained state manager
pub struct RetainedState<M, C> {
    memory: M,
    clock: C,
    build: BuildIdentity,
    block: RetainedBlock,
    session_start: u64,
    status: RetainedStatus,
}

impl<M, C> RetainedState<M, C>
where
    M: RetainedMemory,
    C: Monotonic,
{
    /// Create the manager and capture the session start tick
    ///
    /// # Arguments
    ///
    /// * `memory` - Retained region
    /// * `clock` - Monotonic tick source shared with the rest of the firmware
    /// * `build` - Identity of the running firmware
    pub fn new(memory: M, clock: C, build: BuildIdentity) -> Self {
        let session_start = clock.ticks();
        Self {
            memory,
            clock,
            build,
            block: RetainedBlock::zeroed(),
            session_start,
            status: RetainedStatus::Uninitialized,
        }
    }

    /// Validate the block left by the previous session
    ///
    /// Returns `true` if the block was already valid. On a CRC or build
    /// identity mismatch the block is zeroed, stamped with the current build
    /// and the gyroscope scale is reset to 1.0 on every axis. In both cases the
    /// session markers restart at the session start tick.
    ///
    /// Only the first call has an effect; later calls report the same result.
    pub fn validate(&mut self) -> bool {
        if self.status != RetainedStatus::Uninitialized {
            return self.status == RetainedStatus::Valid;
        }

        let bytes = self.memory.load();
        let block = RetainedBlock::decode(&bytes);
        let valid = RetainedBlock::is_intact(&bytes) && block.build == self.build.raw();

        self.block = if valid {
            block
        } else {
            RetainedBlock {
                build: self.build.raw(),
                gyro_sens_scale: [1.0; 3],
                ..RetainedBlock::zeroed()
            }
        };

        self.block.uptime_latest = self.session_start;
        self.block.battery_uptime_latest = self.session_start;
        self.commit();

        if valid {
            self.status = RetainedStatus::Valid;
            #[cfg(feature = "defmt")]
            defmt::info!("Retained data valid, uptime {} ticks", self.block.uptime_sum);
        } else {
            self.status = RetainedStatus::Reinitialized;
            #[cfg(feature = "defmt")]
            defmt::warn!("Retained data reinitialized");
        }

        valid
    }

    /// Accumulate the uptime since the last update and persist the block
    pub fn update(&mut self) {
        if !self.is_validated() {
            return;
        }
        let now = self.clock.ticks();
        self.block.uptime_sum += now.saturating_sub(self.block.uptime_latest);
        self.block.uptime_latest = now;
        self.commit();
    }

    /// Accumulate the battery uptime since the last battery update
    pub fn update_battery_uptime(&mut self) {
        if !self.is_validated() {
            return;
        }
        let now = self.clock.ticks();
        self.block.battery_uptime_sum += now.saturating_sub(self.block.battery_uptime_latest);
        self.block.battery_uptime_latest = now;
        self.commit();
    }

    /// Clear the battery uptime counter, e.g. after a full charge
    pub fn reset_battery_uptime(&mut self) {
        if !self.is_validated() {
            return;
        }
        self.block.battery_uptime_sum = 0;
        self.block.battery_uptime_latest = self.clock.ticks();
        self.commit();
    }

    /// Per-axis gyroscope sensitivity correction
    pub fn gyro_sens_scale(&self) -> [f32; 3] {
        self.block.gyro_sens_scale
    }

    /// Store a new gyroscope sensitivity correction
    pub fn set_gyro_sens_scale(&mut self, scale: [f32; 3]) {
        if !self.is_validated() {
            return;
        }
        self.block.gyro_sens_scale = scale;
        self.commit();
    }

    /// Accumulated uptime in ticks, across sessions
    pub fn uptime_sum(&self) -> u64 {
        self.block.uptime_sum
    }

    /// Accumulated uptime on battery in ticks
    pub fn battery_uptime_sum(&self) -> u64 {
        self.block.battery_uptime_sum
    }

    /// Tick count captured at construction
    pub fn session_start(&self) -> u64 {
        self.session_start
    }

    /// Identity of the running firmware
    pub fn build(&self) -> BuildIdentity {
        self.build
    }

    /// Current decoded block
    pub fn block(&self) -> &RetainedBlock {
        &self.block
    }

    /// Validation state
    pub fn status(&self) -> RetainedStatus {
        self.status
    }

    /// Consume the manager and return the memory region
    pub fn release(self) -> M {
        self.memory
    }

    fn is_validated(&self) -> bool {
        if self.status == RetainedStatus::Uninitialized {
            #[cfg(feature = "defmt")]
            defmt::warn!("Retained data used before validation");
            return false;
        }
        true
    }

    fn commit(&mut self) {
        self.block.seal();
        self.memory.store(&self.block.encode());
    }
}
