//! System Call Interface
//!
//! The trusted boundary between user programs and the kernel.
//!
//! # Security Model
//! - Whitelist approach: only the calls in `numbers` do anything
//! - Every user address is validated before the kernel touches it
//! - A validation failure terminates the caller; it is never a return value
//! - Resource failures (missing file, failed load) are ordinary return values
//!
//! # Syscalls
//! - 0: halt()
//! - 1: exit(status)
//! - 2: exec(cmdline) -> pid
//! - 3: wait(pid) -> status
//! - 4: create(path, size) -> bool
//! - 5: remove(path) -> bool
//! - 6: open(path) -> fd
//! - 7: filesize(fd) -> size
//! - 8: read(fd, buf, len) -> count
//! - 9: write(fd, buf, len) -> count
//! - 10: seek(fd, pos)
//! - 11: tell(fd) -> pos
//! - 12: close(fd)

mod file;
mod frame;
mod handler;
mod validate;

pub use frame::{decode, numbers, Request, Syscall, TrapFrame, MAX_ARGS, SYSCALL_VECTOR};
pub use handler::{dispatch, terminate, Services, SyscallOutcome};
pub use validate::{Access, Fault, UserMemory, MAX_USER_STR};
