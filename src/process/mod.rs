//! User process state owned by the system call layer
//!
//! The scheduler owns threads and their lifecycle; each user process's
//! control block embeds one `Process`, which holds what system calls
//! mutate: the open-file table, the exit records of its children, and the
//! links shared with its own parent.
//!
//! # Ownership
//! - `FileTable` and `ExitRegistry` are reachable only through `&mut Process`
//! - The only state shared across processes is the child's `ExitRecord` and
//!   `LoadSignal`, each behind an `Arc`

mod exit;
mod load;

pub use exit::{normalize_status, ExitRecord, ExitRegistry};
pub use load::{LoadOutcome, LoadSignal};

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::fmt;

use crate::fs::{Fd, FileTable};

/// A process identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Pid(i32);

impl Pid {
    /// Wrap a raw pid.
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Get the raw pid value.
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pid({})", self.0)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State a parent hands to a child it is spawning.
#[derive(Debug, Clone)]
pub struct ChildLink {
    /// Where the child records its exit status.
    pub exit: Arc<ExitRecord>,
    /// Where the child reports its load outcome.
    pub load: Arc<LoadSignal>,
}

impl ChildLink {
    /// Create the link for a child that is about to be started.
    pub fn new() -> Self {
        Self {
            exit: Arc::new(ExitRecord::new()),
            load: Arc::new(LoadSignal::new()),
        }
    }
}

impl Default for ChildLink {
    fn default() -> Self {
        Self::new()
    }
}

/// Process creation collaborator.
pub trait ProcessManager: Sync {
    /// Start a new process running `cmdline`.
    ///
    /// The new process must be built with `Process::with_parent(.., link)`
    /// and its loader must call `Process::report_load` once. Returns `None`
    /// if no process could be created at all.
    fn execute(&self, cmdline: &str, link: ChildLink) -> Option<Pid>;
}

/// Program name of a command line: its first whitespace-delimited word.
pub fn program_name(cmdline: &str) -> &str {
    cmdline.split_whitespace().next().unwrap_or("")
}

/// System call state of one user process.
#[derive(Debug)]
pub struct Process {
    pid: Pid,
    name: String,
    files: FileTable,
    children: ExitRegistry,
    parent: Option<ChildLink>,
}

impl Process {
    /// Create a process that has no waiting parent (e.g. the first one).
    pub fn new(pid: Pid, name: &str) -> Self {
        Self {
            pid,
            name: name.to_string(),
            files: FileTable::new(),
            children: ExitRegistry::new(),
            parent: None,
        }
    }

    /// Create a process spawned through `ProcessManager::execute`.
    pub fn with_parent(pid: Pid, name: &str, link: ChildLink) -> Self {
        let mut process = Self::new(pid, name);
        process.parent = Some(link);
        process
    }

    /// Process identifier.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Name printed in the termination message.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open files of this process.
    pub fn files(&self) -> &FileTable {
        &self.files
    }

    /// Open files of this process, mutably.
    pub fn files_mut(&mut self) -> &mut FileTable {
        &mut self.files
    }

    /// Exit records of this process's children.
    pub fn children(&self) -> &ExitRegistry {
        &self.children
    }

    /// Exit records of this process's children, mutably.
    pub fn children_mut(&mut self) -> &mut ExitRegistry {
        &mut self.children
    }

    /// Report the outcome of loading this process's executable to the
    /// parent blocked in `exec`. Only the first report counts.
    pub fn report_load(&self, loaded: bool) -> bool {
        match &self.parent {
            Some(link) => link.load.report(loaded),
            None => false,
        }
    }

    /// Record the final status where the parent can see it.
    pub(crate) fn record_exit(&self, status: i32) -> bool {
        match &self.parent {
            Some(link) => link.exit.record(status),
            None => false,
        }
    }

    /// Release every resource owned by the process.
    ///
    /// Closes all open files, drops the records of all children, and fails a
    /// load report that never happened so a spawning parent is not left
    /// blocked forever.
    pub(crate) fn release(&mut self) {
        let closed = self.files.close(Fd::CLOSE_ALL);
        let orphans = self.children.len();
        self.children.clear();
        if let Some(link) = &self.parent {
            link.load.report(false);
        }
        log::debug!(
            "[PROCESS] {} ({}) released {} files, {} child records",
            self.name,
            self.pid,
            closed,
            orphans
        );
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        if self.report_load(false) {
            log::debug!(
                "[PROCESS] {} ({}) dropped before loading",
                self.name,
                self.pid
            );
        }
    }
}
