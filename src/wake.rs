//! Wake tick counter shared with the timer interrupt.
//!
//! The periodic wake timer is the only interrupt source. Its handler does
//! one thing: [`WakeCounter::tick`]. The main loop consumes the count with
//! [`WakeCounter::take_if_at_least`] once it reaches the next trigger
//! threshold. The compare and the zeroing are one atomic step, so a tick
//! landing in between is never dropped. One writer, one reader, no locks.

use portable_atomic::{AtomicU32, Ordering};

/// Ticks elapsed since the last annoyance episode.
pub struct WakeCounter {
    ticks: AtomicU32,
}

impl WakeCounter {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
        }
    }

    /// Records one timer firing. Call only from the wake interrupt.
    pub fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Release);
    }

    pub fn count(&self) -> u32 {
        self.ticks.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.ticks.store(0, Ordering::Release);
    }

    /// Zeroes the counter if it has reached `threshold` and returns the
    /// ticks consumed. Leaves it untouched otherwise.
    pub fn take_if_at_least(&self, threshold: u32) -> Option<u32> {
        self.ticks
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |ticks| {
                (ticks >= threshold).then_some(0)
            })
            .ok()
    }
}

impl Default for WakeCounter {
    fn default() -> Self {
        Self::new()
    }
}
