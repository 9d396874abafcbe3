//! File and console system calls
//!
//! Handles 0 and 1 are the console; every other handle goes through the
//! caller's `FileTable`. Reads and writes run inside an `IoLock` session;
//! the other calls touch only the caller's own table.

use super::handler::Services;
use super::validate::{Access, Fault, UserMemory};
use crate::fs::Fd;
use crate::mm::UserAddr;
use crate::process::Process;
use crate::ERROR;

fn path_str(path: &[u8]) -> Option<&str> {
    let path = core::str::from_utf8(path).ok();
    if path.is_none() {
        log::debug!("[FS] rejecting non-UTF-8 path");
    }
    path
}

/// Create a file of `initial_size` bytes.
pub(super) fn sys_create(services: &Services<'_>, path: &[u8], initial_size: u32) -> bool {
    path_str(path).is_some_and(|path| services.fs.create(path, initial_size))
}

/// Delete a file.
pub(super) fn sys_remove(services: &Services<'_>, path: &[u8]) -> bool {
    path_str(path).is_some_and(|path| services.fs.remove(path))
}

/// Open a file and return its new handle, or `ERROR`.
pub(super) fn sys_open(process: &mut Process, services: &Services<'_>, path: &[u8]) -> i32 {
    let Some(file) = path_str(path).and_then(|path| services.fs.open(path)) else {
        return ERROR;
    };
    match process.files_mut().insert(file) {
        Some(fd) => fd.as_i32(),
        None => {
            log::warn!("[FS] {} ({}): out of file handles", process.name(), process.pid());
            ERROR
        }
    }
}

/// Size in bytes of the file behind `fd`, or `ERROR`.
pub(super) fn sys_filesize(process: &Process, fd: i32) -> i32 {
    match process.files().get(Fd::new(fd)) {
        Some(file) => file.length() as i32,
        None => ERROR,
    }
}

/// Read up to `len` bytes from `fd` into the user buffer at `buf`.
///
/// Handle 0 reads the console until `len` bytes or the end of input.
/// Returns bytes read, or `ERROR` for an unknown handle.
pub(super) fn sys_read(
    process: &mut Process,
    services: &Services<'_>,
    memory: &UserMemory<'_>,
    fd: i32,
    buf: UserAddr,
    len: u32,
) -> Result<i32, Fault> {
    let len = len as usize;
    memory.check_buffer(buf, len, Access::Write)?;

    let fd = Fd::new(fd);
    let _session = services.io.read();
    let read = if fd == Fd::STDIN {
        memory.write_to(buf, len, |chunk| {
            let mut n = 0;
            while n < chunk.len() {
                match services.console.getc() {
                    Some(byte) => chunk[n] = byte,
                    None => break,
                }
                n += 1;
            }
            n
        })?
    } else {
        let Some(file) = process.files_mut().get_mut(fd) else {
            return Ok(ERROR);
        };
        memory.write_to(buf, len, |chunk| file.read(chunk))?
    };
    Ok(read as i32)
}

/// Write `len` bytes from the user buffer at `buf` to `fd`.
///
/// Handle 1 writes the console. A length that is zero or negative as a
/// signed value is returned unchanged without touching anything. Returns
/// bytes written, or `ERROR` for an unknown handle.
pub(super) fn sys_write(
    process: &mut Process,
    services: &Services<'_>,
    memory: &UserMemory<'_>,
    fd: i32,
    buf: UserAddr,
    len: u32,
) -> Result<i32, Fault> {
    if len as i32 <= 0 {
        return Ok(len as i32);
    }
    let len = len as usize;
    memory.check_buffer(buf, len, Access::Read)?;

    let fd = Fd::new(fd);
    let _session = services.io.write();
    let written = if fd == Fd::STDOUT {
        memory.read_from(buf, len, |chunk| {
            services.console.put_buffer(chunk);
            chunk.len()
        })?
    } else {
        let Some(file) = process.files_mut().get_mut(fd) else {
            return Ok(ERROR);
        };
        memory.read_from(buf, len, |chunk| file.write(chunk))?
    };
    Ok(written as i32)
}

/// Move the position of `fd`. Unknown handles are ignored.
pub(super) fn sys_seek(process: &mut Process, fd: i32, position: u32) {
    if let Some(file) = process.files_mut().get_mut(Fd::new(fd)) {
        file.seek(position);
    }
}

/// Position of `fd`, or `ERROR` for an unknown handle.
pub(super) fn sys_tell(process: &Process, fd: i32) -> u32 {
    match process.files().get(Fd::new(fd)) {
        Some(file) => file.tell(),
        None => ERROR as u32,
    }
}

/// Close `fd`, or every open file for `Fd::CLOSE_ALL`.
pub(super) fn sys_close(process: &mut Process, fd: i32) {
    let closed = process.files_mut().close(Fd::new(fd));
    log::trace!("[FS] {} closed {} file(s) for fd {}", process.pid(), closed, fd);
}
