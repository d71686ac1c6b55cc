//! Reconfiguration countdown and epoch trigger.

use std::sync::atomic::{AtomicU32, Ordering};

/// Counts ordinary blocks down to the start of committee assembly.
#[derive(Debug)]
pub struct ReconfigurationCountdown {
    remaining: AtomicU32,
}

impl ReconfigurationCountdown {
    /// Start counting down from `blocks`.
    pub fn new(blocks: u32) -> Self {
        Self {
            remaining: AtomicU32::new(blocks),
        }
    }

    /// Count one produced block. Returns true exactly once, on the tick
    /// that reaches zero.
    pub fn tick(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .map(|previous| previous == 1)
            .unwrap_or(false)
    }

    /// Blocks left before assembly.
    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::Acquire)
    }
}

/// Recognises the epoch at which the view stops taking transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochTrigger {
    reconfiguration_epoch: u32,
}

impl EpochTrigger {
    /// Trigger on `reconfiguration_epoch`.
    pub fn new(reconfiguration_epoch: u32) -> Self {
        Self {
            reconfiguration_epoch,
        }
    }

    /// Whether `epoch` is the reconfiguration epoch.
    pub fn fires_on(&self, epoch: u32) -> bool {
        epoch == self.reconfiguration_epoch
    }

    /// The reconfiguration epoch.
    pub fn reconfiguration_epoch(&self) -> u32 {
        self.reconfiguration_epoch
    }
}
