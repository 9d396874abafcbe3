//! Exit-status propagation from child to parent
//!
//! Each child shares one `ExitRecord` with its parent. The child writes its
//! status once when it terminates; the parent's `wait` blocks on it, reads
//! it, and drops the record from its registry so it cannot be read again.

use alloc::collections::BTreeMap;
use alloc::sync::Arc;

use super::Pid;
use crate::sync::Completion;
use crate::ERROR;

/// Map a status passed to `exit` to the status that is recorded.
///
/// Every negative status collapses to `ERROR`.
#[inline]
pub const fn normalize_status(status: i32) -> i32 {
    if status < 0 {
        ERROR
    } else {
        status
    }
}

/// Termination status of one child, shared between child and parent.
#[derive(Default)]
pub struct ExitRecord {
    status: Completion<i32>,
}

impl ExitRecord {
    /// Create a record for a child that has not terminated.
    pub const fn new() -> Self {
        Self {
            status: Completion::new(),
        }
    }

    /// Record the child's status. Only the first call has an effect.
    pub fn record(&self, status: i32) -> bool {
        self.status.signal(status)
    }

    /// Block until the child has terminated and return its status.
    pub fn wait(&self) -> i32 {
        *self.status.wait()
    }

    /// The status, if the child has terminated.
    pub fn status(&self) -> Option<i32> {
        self.status.get().copied()
    }
}

impl core::fmt::Debug for ExitRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.status() {
            Some(status) => write!(f, "ExitRecord(exited {})", status),
            None => write!(f, "ExitRecord(running)"),
        }
    }
}

/// Exit records of the children of one process, keyed by child pid.
#[derive(Debug, Default)]
pub struct ExitRegistry {
    records: BTreeMap<Pid, Arc<ExitRecord>>,
}

impl ExitRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Track the record of child `pid`, replacing any stale record.
    pub fn insert(&mut self, pid: Pid, record: Arc<ExitRecord>) {
        self.records.insert(pid, record);
    }

    /// Find the record of child `pid`.
    pub fn find(&self, pid: Pid) -> Option<&Arc<ExitRecord>> {
        self.records.get(&pid)
    }

    /// Stop tracking child `pid`, returning its record.
    pub fn remove(&mut self, pid: Pid) -> Option<Arc<ExitRecord>> {
        self.records.remove(&pid)
    }

    /// Block until child `pid` terminates, then consume its record.
    ///
    /// Returns `None` if `pid` is not a child with an unconsumed record.
    pub fn wait(&mut self, pid: Pid) -> Option<i32> {
        let status = self.find(pid)?.wait();
        self.remove(pid);
        Some(status)
    }

    /// Drop every record (the parent is exiting).
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of tracked children.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no child is tracked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
