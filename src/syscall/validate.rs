//! System Call Input Validation
//!
//! Every address a user program hands to the kernel passes through here
//! before the kernel touches the memory behind it.
//!
//! # Security Principles
//! - Validate ALL inputs before use
//! - Fail-secure: any doubt is a `Fault`, and a fault kills the caller
//! - Re-translate at every page boundary; user pages need not be contiguous
//!   in kernel memory
//! - Strings are copied into kernel memory (no TOCTOU on paths)

use alloc::vec::Vec;
use core::fmt;

use crate::mm::{AddressSpace, Mapping, PageFlags, UserAddr, PAGE_SIZE, USER_FLOOR};
use crate::process::Pid;

/// Longest string, terminator excluded, accepted from user memory.
pub const MAX_USER_STR: usize = PAGE_SIZE;

/// Why a user address was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Address below `USER_FLOOR`.
    BelowUserFloor(UserAddr),
    /// Address at or above `PHYS_BASE`.
    KernelAddress(UserAddr),
    /// No present mapping.
    Unmapped(UserAddr),
    /// Kernel would write into a page the user cannot write.
    ReadOnly(UserAddr),
    /// Region wraps around the end of the address space.
    Overflow(UserAddr),
    /// String has no terminator within `MAX_USER_STR` bytes.
    TooLong(UserAddr),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BelowUserFloor(a) => write!(f, "address {} below user floor", a),
            Self::KernelAddress(a) => write!(f, "address {} in kernel space", a),
            Self::Unmapped(a) => write!(f, "address {} not mapped", a),
            Self::ReadOnly(a) => write!(f, "address {} not writable", a),
            Self::Overflow(a) => write!(f, "region at {} overflows", a),
            Self::TooLong(a) => write!(f, "string at {} not terminated", a),
        }
    }
}

/// Kind of access the kernel is about to perform on user memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Kernel reads user memory.
    Read,
    /// Kernel writes user memory.
    Write,
}

impl Access {
    const fn required(self) -> PageFlags {
        match self {
            Self::Read => PageFlags::USER_RO,
            Self::Write => PageFlags::USER_RW,
        }
    }
}

/// Validated access to the memory of one user process.
pub struct UserMemory<'a> {
    space: &'a dyn AddressSpace,
    pid: Pid,
}

impl<'a> UserMemory<'a> {
    /// View the address space of `pid`.
    pub fn new(space: &'a dyn AddressSpace, pid: Pid) -> Self {
        Self { space, pid }
    }

    /// Translate one user address.
    ///
    /// # Security Checks
    /// 1. Address is at or above `USER_FLOOR`
    /// 2. Address is below `PHYS_BASE`
    /// 3. Page is present in this process
    /// 4. Page permits `access`
    pub fn translate(&self, addr: UserAddr, access: Access) -> Result<Mapping, Fault> {
        if !addr.is_user() {
            return Err(if addr.as_u32() < USER_FLOOR {
                Fault::BelowUserFloor(addr)
            } else {
                Fault::KernelAddress(addr)
            });
        }
        let mapping = self
            .space
            .translate(self.pid, addr)
            .ok_or(Fault::Unmapped(addr))?;
        if !mapping.flags().contains(access.required()) {
            return Err(match access {
                Access::Read => Fault::Unmapped(addr),
                Access::Write => Fault::ReadOnly(addr),
            });
        }
        Ok(mapping)
    }

    /// Read one little-endian word, validating every byte of it.
    pub fn read_word(&self, addr: UserAddr) -> Result<u32, Fault> {
        let mut word = [0u8; 4];
        let mut filled = 0;
        self.read_from(addr, word.len(), |chunk| {
            word[filled..filled + chunk.len()].copy_from_slice(chunk);
            filled += chunk.len();
            chunk.len()
        })?;
        Ok(u32::from_le_bytes(word))
    }

    /// Copy a NUL-terminated string into kernel memory.
    ///
    /// Walks byte by byte and re-translates whenever the cursor enters a
    /// new page. The terminator is not included.
    pub fn read_str(&self, addr: UserAddr) -> Result<Vec<u8>, Fault> {
        let mut out = Vec::new();
        let mut cursor = addr;
        let mut mapping = self.translate(cursor, Access::Read)?;
        let mut left_in_page = cursor.bytes_to_page_end();
        let mut offset = 0;

        loop {
            // SAFETY: `offset < left_in_page` bytes from the translated
            // pointer, which `AddressSpace` guarantees readable to the end
            // of its page.
            let byte = unsafe { mapping.ptr().as_ptr().add(offset).read() };
            if byte == 0 {
                return Ok(out);
            }
            if out.len() == MAX_USER_STR {
                return Err(Fault::TooLong(addr));
            }
            out.push(byte);

            cursor = cursor.checked_add(1).ok_or(Fault::Overflow(addr))?;
            offset += 1;
            if offset == left_in_page {
                mapping = self.translate(cursor, Access::Read)?;
                left_in_page = cursor.bytes_to_page_end();
                offset = 0;
            }
        }
    }

    /// Validate a `len`-byte region starting at `addr` for `access`.
    ///
    /// The start and end bounds are checked first, then every page in
    /// between. A zero-length region is always valid.
    pub fn check_buffer(&self, addr: UserAddr, len: usize, access: Access) -> Result<(), Fault> {
        if len == 0 {
            return Ok(());
        }
        let last = u32::try_from(len - 1)
            .ok()
            .and_then(|span| addr.checked_add(span))
            .ok_or(Fault::Overflow(addr))?;

        self.translate(addr, access)?;
        self.translate(last, access)?;

        let mut page = addr.page_base();
        while page < last.page_base() {
            page = page
                .checked_add(PAGE_SIZE as u32)
                .ok_or(Fault::Overflow(addr))?;
            self.translate(page, access)?;
        }
        Ok(())
    }

    /// Pass a user buffer to `sink` in page-sized chunks.
    ///
    /// The whole region is validated before `sink` sees any of it. `sink`
    /// returns how many bytes of the chunk it consumed; a short count ends
    /// the transfer. Returns the total consumed.
    pub fn read_from<F>(&self, addr: UserAddr, len: usize, mut sink: F) -> Result<usize, Fault>
    where
        F: FnMut(&[u8]) -> usize,
    {
        self.check_buffer(addr, len, Access::Read)?;
        let mut done = 0;
        while done < len {
            let cursor = offset_addr(addr, done)?;
            let mapping = self.translate(cursor, Access::Read)?;
            let n = cursor.bytes_to_page_end().min(len - done);
            // SAFETY: `n` does not cross the end of the translated page, and
            // the page was just checked readable.
            let chunk = unsafe { core::slice::from_raw_parts(mapping.ptr().as_ptr(), n) };
            let used = sink(chunk).min(n);
            done += used;
            if used < n {
                break;
            }
        }
        Ok(done)
    }

    /// Let `source` fill a user buffer in page-sized chunks.
    ///
    /// The whole region is validated writable before `source` runs.
    /// `source` returns how many bytes it produced; a short count ends the
    /// transfer. Returns the total produced.
    pub fn write_to<F>(&self, addr: UserAddr, len: usize, mut source: F) -> Result<usize, Fault>
    where
        F: FnMut(&mut [u8]) -> usize,
    {
        self.check_buffer(addr, len, Access::Write)?;
        let mut done = 0;
        while done < len {
            let cursor = offset_addr(addr, done)?;
            let mapping = self.translate(cursor, Access::Write)?;
            let n = cursor.bytes_to_page_end().min(len - done);
            // SAFETY: `n` does not cross the end of the translated page, and
            // the page was just checked writable.
            let chunk = unsafe { core::slice::from_raw_parts_mut(mapping.ptr().as_ptr(), n) };
            let produced = source(chunk).min(n);
            done += produced;
            if produced < n {
                break;
            }
        }
        Ok(done)
    }
}

fn offset_addr(addr: UserAddr, offset: usize) -> Result<UserAddr, Fault> {
    u32::try_from(offset)
        .ok()
        .and_then(|offset| addr.checked_add(offset))
        .ok_or(Fault::Overflow(addr))
}
