//! Counting semaphore
//!
//! Unlike a mutex guard, a permit taken with `down` may be returned with
//! `up` from a different thread. The readers/writer gate relies on this:
//! the first reader takes the write permit and the last reader returns it.

use spin::relax::RelaxStrategy;

use super::{Mutex, SchedulerRelax};

/// A counting semaphore.
pub struct Semaphore {
    permits: Mutex<usize>,
}

impl Semaphore {
    /// Create a semaphore holding `permits` permits.
    pub const fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
        }
    }

    /// Take one permit, blocking until one is available.
    pub fn down(&self) {
        loop {
            if self.try_down() {
                return;
            }
            SchedulerRelax::relax();
        }
    }

    /// Take one permit if available without blocking.
    pub fn try_down(&self) -> bool {
        let mut permits = self.permits.lock();
        if *permits > 0 {
            *permits -= 1;
            true
        } else {
            false
        }
    }

    /// Return one permit.
    pub fn up(&self) {
        *self.permits.lock() += 1;
    }
}
