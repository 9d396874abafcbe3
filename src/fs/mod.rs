//! File system interface and per-process open-file table
//!
//! The on-disk file system and its buffer cache are collaborators. This
//! module defines what the system call layer needs from them and owns the
//! mapping from user-visible handles to open files.

mod table;

pub use table::{Fd, FileTable};

use alloc::boxed::Box;

/// An open file object.
///
/// Closing is dropping: the file system releases the file when the box is
/// dropped.
pub trait File: Send {
    /// Read into `buf` from the current position, returning bytes read.
    fn read(&mut self, buf: &mut [u8]) -> usize;
    /// Write `buf` at the current position, returning bytes written.
    fn write(&mut self, buf: &[u8]) -> usize;
    /// Move the current position.
    fn seek(&mut self, position: u32);
    /// Current position.
    fn tell(&self) -> u32;
    /// File length in bytes.
    fn length(&self) -> u32;
}

/// The file system collaborator.
pub trait FileSystem: Sync {
    /// Create an empty file of `initial_size` bytes at `path`.
    fn create(&self, path: &str, initial_size: u32) -> bool;
    /// Delete the file at `path`.
    fn remove(&self, path: &str) -> bool;
    /// Open the file at `path`.
    fn open(&self, path: &str) -> Option<Box<dyn File>>;
}
