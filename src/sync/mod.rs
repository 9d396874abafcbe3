//! Kernel synchronization primitives for the system call layer
//!
//! - `Semaphore`: counting semaphore
//! - `Completion<T>`: one-shot, signal-exactly-once value
//! - `IoLock`: readers/writer gate over shared I/O (console and files)
//!
//! Blocking primitives never hard-spin once the scheduler is up: waiters
//! relax through `SchedulerRelax`, which yields to the hook installed by
//! `install_yield`. Before installation they fall back to a CPU spin hint.

mod completion;
mod io;
mod semaphore;

pub use completion::Completion;
pub use io::{IoLock, ReadSession, WriteSession};
pub use semaphore::Semaphore;

use spin::relax::RelaxStrategy;
use spin::Once;

/// Scheduler yield hook, set once during boot.
static YIELD_HOOK: Once<fn()> = Once::new();

/// Install the scheduler's yield function used by blocked waiters.
///
/// Only the first installation takes effect. Returns `false` if a hook was
/// already present.
pub fn install_yield(hook: fn()) -> bool {
    let mut installed = false;
    YIELD_HOOK.call_once(|| {
        installed = true;
        hook
    });
    installed
}

/// Relax strategy that gives the CPU back to the scheduler.
pub struct SchedulerRelax;

impl RelaxStrategy for SchedulerRelax {
    #[inline]
    fn relax() {
        match YIELD_HOOK.get() {
            Some(hook) => hook(),
            None => core::hint::spin_loop(),
        }
    }
}

/// Spin mutex that relaxes through the scheduler.
pub(crate) type Mutex<T> = spin::mutex::Mutex<T, SchedulerRelax>;
