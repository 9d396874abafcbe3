//! Per-process Open-File Table
//!
//! Maps handles to open files for exactly one process.
//!
//! # Design
//! - Handles come from a per-process counter starting at `Fd::FIRST_FILE`
//! - Handles are never reused, so a stale handle can never reach a newer file
//! - Entries are kept ordered by handle, which is also open order

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use core::fmt;

use super::File;

/// A file handle as seen by user programs.
///
/// This is a newtype to keep raw argument words from being used as handles
/// without going through the table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Fd(i32);

impl Fd {
    /// Reserved handle for console input.
    pub const STDIN: Self = Self(0);

    /// Reserved handle for console output.
    pub const STDOUT: Self = Self(1);

    /// First handle given to a real file.
    pub const FIRST_FILE: Self = Self(2);

    /// Passed to `close` to release every open file of the process.
    pub const CLOSE_ALL: Self = Self(-1);

    /// Wrap a raw handle value.
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Get the raw handle value.
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Debug for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fd({})", self.0)
    }
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Open files of one process.
pub struct FileTable {
    entries: BTreeMap<Fd, Box<dyn File>>,
    next: i32,
}

impl FileTable {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next: Fd::FIRST_FILE.0,
        }
    }

    /// Record an open file and return its fresh handle.
    ///
    /// Returns `None` once the handle space is exhausted; the file is
    /// dropped (closed) in that case.
    pub fn insert(&mut self, file: Box<dyn File>) -> Option<Fd> {
        let fd = Fd(self.next);
        self.next = self.next.checked_add(1)?;
        self.entries.insert(fd, file);
        Some(fd)
    }

    /// Look up the file behind `fd`.
    pub fn get_mut(&mut self, fd: Fd) -> Option<&mut (dyn File + 'static)> {
        self.entries.get_mut(&fd).map(|file| &mut **file)
    }

    /// Look up the file behind `fd` for reading its state.
    pub fn get(&self, fd: Fd) -> Option<&(dyn File + 'static)> {
        self.entries.get(&fd).map(|file| &**file)
    }

    /// Close `fd`, or every entry when `fd` is `Fd::CLOSE_ALL`.
    ///
    /// Returns the number of files closed.
    pub fn close(&mut self, fd: Fd) -> usize {
        if fd == Fd::CLOSE_ALL {
            let closed = self.entries.len();
            self.entries.clear();
            closed
        } else {
            usize::from(self.entries.remove(&fd).is_some())
        }
    }

    /// Handles of all open files, in open order.
    pub fn fds(&self) -> impl Iterator<Item = Fd> + '_ {
        self.entries.keys().copied()
    }

    /// Check if no file is open.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FileTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FileTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileTable")
            .field("open", &self.entries.keys().collect::<alloc::vec::Vec<_>>())
            .field("next", &self.next)
            .finish()
    }
}
