//! Per-replica clock used to mint node ids.
//!
//! Unlike a Lamport clock the value is never shared with other sites: ids
//! are unique because they pair the clock with the owning site. The clock
//! only has to be strictly increasing on one replica.

use crate::crdt::error::ClockExhausted;

/// Largest clock value a replica can mint. Ids above it are never valid.
pub const MAX_CLOCK: u64 = u64::MAX - 1;

/// A monotonically increasing counter owned by one replica.
#[derive(Debug, Clone, Default)]
pub struct LocalClock {
    next: u64,
}

impl LocalClock {
    /// Creates a new clock whose first tick is 0.
    pub fn new() -> Self {
        LocalClock { next: 0 }
    }

    /// Returns the current value and advances the clock.
    ///
    /// Fails once every value up to [`MAX_CLOCK`] has been handed out; the
    /// clock is left unchanged in that case.
    pub fn tick(&mut self) -> Result<u64, ClockExhausted> {
        let value = self.next;
        self.next = value.checked_add(1).ok_or(ClockExhausted)?;
        Ok(value)
    }

    /// Moves the clock past a value this site already used.
    ///
    /// Called when a replica merges one of its own earlier operations
    /// (for example after a restart), so later ticks never collide with it.
    pub fn observe(&mut self, used: u64) {
        if used >= self.next {
            self.next = used.saturating_add(1);
        }
    }

    /// The value the next tick will return.
    pub fn current(&self) -> u64 {
        self.next
    }
}
