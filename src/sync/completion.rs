//! One-shot completion
//!
//! Single producer, any number of consumers: the value is set exactly once
//! and every waiter observes that same value.

use spin::once::Once;

use super::SchedulerRelax;

/// A value that becomes available exactly once.
pub struct Completion<T> {
    slot: Once<T, SchedulerRelax>,
}

impl<T> Completion<T> {
    /// Create an unsignaled completion.
    pub const fn new() -> Self {
        Self { slot: Once::new() }
    }

    /// Publish `value`.
    ///
    /// Returns `true` if this call completed it, `false` if it was already
    /// signaled (the earlier value is kept).
    pub fn signal(&self, value: T) -> bool {
        let mut fresh = false;
        self.slot.call_once(|| {
            fresh = true;
            value
        });
        fresh
    }

    /// Block until signaled and return the value.
    pub fn wait(&self) -> &T {
        self.slot.wait()
    }

    /// The value, if already signaled.
    pub fn get(&self) -> Option<&T> {
        self.slot.get()
    }
}

impl<T> Default for Completion<T> {
    fn default() -> Self {
        Self::new()
    }
}
