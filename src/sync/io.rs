//! Readers/writer gate over shared I/O
//!
//! One write permit serializes every writer (console or file), so bytes of
//! two write calls never interleave. Readers share the permit: the first
//! reader of a session takes it on behalf of all readers and the last one
//! returns it. Readers run concurrently with each other, never with a
//! writer.
//!
//! Sessions are RAII guards. Dropping one, on any path, releases it.

use super::{Mutex, Semaphore};

/// Shared I/O lock. One instance per kernel, created before the first
/// user process runs and passed to the dispatcher by reference.
pub struct IoLock {
    write: Semaphore,
    readers: Mutex<usize>,
}

impl IoLock {
    /// Create an idle lock.
    pub const fn new() -> Self {
        Self {
            write: Semaphore::new(1),
            readers: Mutex::new(0),
        }
    }

    /// Enter a read session, blocking while a writer is active.
    pub fn read(&self) -> ReadSession<'_> {
        let mut readers = self.readers.lock();
        *readers += 1;
        if *readers == 1 {
            self.write.down();
        }
        ReadSession { lock: self }
    }

    /// Enter a read session only if no writer is active.
    pub fn try_read(&self) -> Option<ReadSession<'_>> {
        let mut readers = self.readers.lock();
        if *readers == 0 && !self.write.try_down() {
            return None;
        }
        *readers += 1;
        Some(ReadSession { lock: self })
    }

    /// Enter an exclusive write session, blocking while anyone else holds
    /// the lock.
    pub fn write(&self) -> WriteSession<'_> {
        self.write.down();
        WriteSession { lock: self }
    }

    /// Enter a write session only if the lock is idle.
    pub fn try_write(&self) -> Option<WriteSession<'_>> {
        if self.write.try_down() {
            Some(WriteSession { lock: self })
        } else {
            None
        }
    }

    /// Number of read sessions currently open.
    pub fn active_readers(&self) -> usize {
        *self.readers.lock()
    }

    fn end_read(&self) {
        let mut readers = self.readers.lock();
        *readers -= 1;
        if *readers == 0 {
            self.write.up();
        }
    }
}

impl Default for IoLock {
    fn default() -> Self {
        Self::new()
    }
}

/// An open read session on an `IoLock`.
#[must_use = "the session ends as soon as it is dropped"]
pub struct ReadSession<'a> {
    lock: &'a IoLock,
}

impl Drop for ReadSession<'_> {
    fn drop(&mut self) {
        self.lock.end_read();
    }
}

/// An exclusive write session on an `IoLock`.
#[must_use = "the session ends as soon as it is dropped"]
pub struct WriteSession<'a> {
    lock: &'a IoLock,
}

impl Drop for WriteSession<'_> {
    fn drop(&mut self) {
        self.lock.write.up();
    }
}
