//! PantherOS user-program system call layer
//!
//! The trusted boundary every user process crosses to ask the kernel for
//! something: terminate, spawn and wait for children, and file I/O.
//!
//! # Components
//! - `syscall`: dispatcher, argument decoding, user-memory validation
//! - `fs`: per-process open-file table and the file system interface
//! - `process`: exit-status records and the exec load handshake
//! - `sync`: semaphores, one-shot completions, the shared I/O lock
//! - `mm`, `drivers`: interfaces to page tables, console, power
//!
//! # Security Features
//! - No user pointer is dereferenced before translation and bounds checks
//! - Faulting processes are terminated, never trusted with partial results
//! - Per-process tables are owned, not shared; handles are never reused
//!
//! # Integration
//! The scheduler, page tables, file system, loader and device drivers are
//! collaborators. The kernel implements their traits, builds one
//! `Services`, and calls `syscall::dispatch` from its trap handler:
//!
//! ```ignore
//! static IO: IoLock = IoLock::new();
//!
//! fn syscall_trap(frame: &mut TrapFrame) {
//!     let services = Services { memory: &PAGE_TABLES, fs: &FILESYS,
//!         console: &CONSOLE, processes: &LOADER, power: &SHUTDOWN, io: &IO };
//!     match syscall::dispatch(frame, current_process(), &services) {
//!         SyscallOutcome::Resume => {}
//!         SyscallOutcome::Terminate(_) => thread_exit(),
//!         SyscallOutcome::PowerOff => unreachable!(),
//!     }
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod drivers;
pub mod fs;
pub mod mm;
pub mod process;
pub mod sync;
pub mod syscall;

#[cfg(test)]
mod testing;

/// Canonical error value: failed calls return it and abnormal
/// termination records it as the exit status.
pub const ERROR: i32 = -1;
