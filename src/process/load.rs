//! Load handshake between a spawning parent and its new child
//!
//! `exec` must not return a pid for a program that never loaded. The child
//! reports the outcome of its binary load exactly once; the parent blocks
//! until it does.

use crate::sync::Completion;

/// Load state of a newly spawned process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The loader has not reported yet.
    NotLoaded,
    /// The executable image is mapped and the process will run.
    Loaded,
    /// The executable could not be loaded; the process is going away.
    LoadFailed,
}

/// One-shot load report from child to parent.
#[derive(Default)]
pub struct LoadSignal {
    done: Completion<bool>,
}

impl LoadSignal {
    /// Create a signal in the `NotLoaded` state.
    pub const fn new() -> Self {
        Self {
            done: Completion::new(),
        }
    }

    /// Report the load result. Only the first report counts.
    pub fn report(&self, loaded: bool) -> bool {
        self.done.signal(loaded)
    }

    /// Current state, without blocking.
    pub fn state(&self) -> LoadOutcome {
        match self.done.get() {
            None => LoadOutcome::NotLoaded,
            Some(true) => LoadOutcome::Loaded,
            Some(false) => LoadOutcome::LoadFailed,
        }
    }

    /// Block until the child reports, then return the outcome.
    pub fn wait(&self) -> LoadOutcome {
        if *self.done.wait() {
            LoadOutcome::Loaded
        } else {
            LoadOutcome::LoadFailed
        }
    }
}

impl core::fmt::Debug for LoadSignal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "LoadSignal({:?})", self.state())
    }
}
