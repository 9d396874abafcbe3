//! System Call Handler
//!
//! Dispatches system calls and implements the process-control handlers.
//! File handlers live in `file.rs`.
//!
//! # Security Considerations
//! - The stack pointer and every argument slot are validated before use
//! - Pointer arguments are validated again against their contents
//! - Any validation failure terminates the caller with `ERROR`
//! - Unknown system call numbers are ignored and leave `eax` untouched

use super::file;
use super::frame::{decode, Request, Syscall, TrapFrame};
use super::validate::{Fault, UserMemory};
use crate::drivers::{Console, Power};
use crate::fs::FileSystem;
use crate::mm::AddressSpace;
use crate::process::{normalize_status, ChildLink, LoadOutcome, Pid, Process, ProcessManager};
use crate::sync::IoLock;
use crate::{cprintln, ERROR};

/// Kernel services the dispatcher calls into.
///
/// Built once by the kernel and passed to every `dispatch`.
#[derive(Clone, Copy)]
pub struct Services<'k> {
    /// Page-table lookup.
    pub memory: &'k dyn AddressSpace,
    /// File system.
    pub fs: &'k dyn FileSystem,
    /// Console device.
    pub console: &'k dyn Console,
    /// Process creation.
    pub processes: &'k dyn ProcessManager,
    /// Power controller.
    pub power: &'k dyn Power,
    /// Shared I/O lock.
    pub io: &'k IoLock,
}

/// What the trap glue must do after `dispatch` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallOutcome {
    /// Return to the user program (result, if any, is in `eax`).
    Resume,
    /// The process has terminated with this status and must be reaped.
    Terminate(i32),
    /// The machine is powering off.
    PowerOff,
}

/// Result of one handler before it is applied to the trap frame.
enum Reply {
    Value(u32),
    Void,
    Exit(i32),
    Halt,
}

/// Dispatch a system call
///
/// # Arguments
/// * `frame` - Saved user registers; `esp` points at the request
/// * `process` - The calling process
/// * `services` - Kernel collaborators and shared locks
///
/// # Returns
/// What the caller's thread does next. Results are written to `frame.eax`.
pub fn dispatch(
    frame: &mut TrapFrame,
    process: &mut Process,
    services: &Services<'_>,
) -> SyscallOutcome {
    let reply = {
        let memory = UserMemory::new(services.memory, process.pid());
        decode(frame, &memory).and_then(|request| {
            handle(&request, &memory, process, services)
        })
    };

    match reply {
        Ok(Reply::Value(value)) => {
            frame.eax = value;
            SyscallOutcome::Resume
        }
        Ok(Reply::Void) => SyscallOutcome::Resume,
        Ok(Reply::Exit(status)) => SyscallOutcome::Terminate(terminate(process, services, status)),
        Ok(Reply::Halt) => {
            log::info!("[SYSCALL] halt requested by {} ({})", process.name(), process.pid());
            services.power.power_off();
            SyscallOutcome::PowerOff
        }
        Err(fault) => {
            log::warn!(
                "[SYSCALL] {} ({}): {}",
                process.name(),
                process.pid(),
                fault
            );
            SyscallOutcome::Terminate(terminate(process, services, ERROR))
        }
    }
}

fn handle(
    request: &Request,
    memory: &UserMemory<'_>,
    process: &mut Process,
    services: &Services<'_>,
) -> Result<Reply, Fault> {
    let Some(call) = request.call else {
        log::debug!(
            "[SYSCALL] {} ({}): unknown syscall {}",
            process.name(),
            process.pid(),
            request.number
        );
        return Ok(Reply::Void);
    };
    log::trace!("[SYSCALL] {} {:?} {:x?}", process.pid(), call, request.args);

    let reply = match call {
        Syscall::Halt => Reply::Halt,
        Syscall::Exit => Reply::Exit(request.int(0)),
        Syscall::Exec => {
            let cmdline = memory.read_str(request.addr(0))?;
            Reply::Value(sys_exec(process, services, &cmdline) as u32)
        }
        Syscall::Wait => Reply::Value(sys_wait(process, Pid::new(request.int(0))) as u32),
        Syscall::Create => {
            let path = memory.read_str(request.addr(0))?;
            Reply::Value(file::sys_create(services, &path, request.uint(1)) as u32)
        }
        Syscall::Remove => {
            let path = memory.read_str(request.addr(0))?;
            Reply::Value(file::sys_remove(services, &path) as u32)
        }
        Syscall::Open => {
            let path = memory.read_str(request.addr(0))?;
            Reply::Value(file::sys_open(process, services, &path) as u32)
        }
        Syscall::Filesize => Reply::Value(file::sys_filesize(process, request.int(0)) as u32),
        Syscall::Read => Reply::Value(file::sys_read(
            process,
            services,
            memory,
            request.int(0),
            request.addr(1),
            request.uint(2),
        )? as u32),
        Syscall::Write => Reply::Value(file::sys_write(
            process,
            services,
            memory,
            request.int(0),
            request.addr(1),
            request.uint(2),
        )? as u32),
        Syscall::Seek => {
            file::sys_seek(process, request.int(0), request.uint(1));
            Reply::Void
        }
        Syscall::Tell => Reply::Value(file::sys_tell(process, request.int(0))),
        Syscall::Close => {
            file::sys_close(process, request.int(0));
            Reply::Void
        }
    };
    Ok(reply)
}

/// Terminate `process` with `status`.
///
/// Normalizes the status, records it for the parent, prints the
/// termination line, and releases every resource of the process. Returns
/// the recorded status. Used for `exit`, for validation failures, and by
/// the kernel when it kills a process for any other reason.
pub fn terminate(process: &mut Process, services: &Services<'_>, status: i32) -> i32 {
    let status = normalize_status(status);
    process.record_exit(status);
    {
        let _session = services.io.write();
        cprintln!(services.console, "{}: exit({})", process.name(), status);
    }
    log::info!("[PROCESS] {} ({}) exited with status {}", process.name(), process.pid(), status);
    process.release();
    status
}

/// Spawn a child running `cmdline` and wait for its load to finish.
///
/// Returns the child's pid, or `ERROR` if it could not be created or its
/// executable failed to load.
fn sys_exec(process: &mut Process, services: &Services<'_>, cmdline: &[u8]) -> i32 {
    let Ok(cmdline) = core::str::from_utf8(cmdline) else {
        return ERROR;
    };
    let link = ChildLink::new();
    let Some(pid) = services.processes.execute(cmdline, link.clone()) else {
        log::debug!("[PROCESS] exec {:?}: no process created", cmdline);
        return ERROR;
    };
    process.children_mut().insert(pid, link.exit);

    match link.load.wait() {
        LoadOutcome::Loaded => pid.as_i32(),
        LoadOutcome::LoadFailed | LoadOutcome::NotLoaded => {
            log::debug!("[PROCESS] exec {:?}: load failed", cmdline);
            process.children_mut().remove(pid);
            ERROR
        }
    }
}

/// Wait for child `pid` and return its exit status.
///
/// Returns `ERROR` when `pid` is not a child of this process or was
/// already waited for.
fn sys_wait(process: &mut Process, pid: Pid) -> i32 {
    process.children_mut().wait(pid).unwrap_or(ERROR)
}
