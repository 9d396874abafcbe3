//! Address Space Collaborator
//!
//! The page-table implementation lives outside this crate. The system call
//! layer only needs one question answered: "which kernel pointer backs this
//! user address in this process, and with what permissions?"

use core::ptr::NonNull;

use bitflags::bitflags;

use super::address::UserAddr;
use crate::process::Pid;

bitflags! {
    /// Permission bits of a user mapping, as reported by the page tables.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PageFlags: u32 {
        /// Page is present in memory.
        const PRESENT = 1 << 0;
        /// Page may be written.
        const WRITABLE = 1 << 1;
        /// Page is accessible from user mode.
        const USER = 1 << 2;
    }
}

impl PageFlags {
    /// Flags of an ordinary read/write user page.
    pub const USER_RW: Self = Self::PRESENT.union(Self::WRITABLE).union(Self::USER);
    /// Flags of a read-only user page (e.g. code).
    pub const USER_RO: Self = Self::PRESENT.union(Self::USER);
}

/// A present translation of one user address.
#[derive(Debug, Clone, Copy)]
pub struct Mapping {
    ptr: NonNull<u8>,
    flags: PageFlags,
}

impl Mapping {
    /// Create a mapping record.
    #[inline]
    pub const fn new(ptr: NonNull<u8>, flags: PageFlags) -> Self {
        Self { ptr, flags }
    }

    /// Kernel pointer to the translated byte.
    #[inline]
    pub const fn ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Permission bits of the backing page.
    #[inline]
    pub const fn flags(&self) -> PageFlags {
        self.flags
    }
}

/// Page-table lookup for user processes.
///
/// # Safety
/// For a returned `Mapping` of address `a`, `ptr()` must be valid for reads
/// of `a.bytes_to_page_end()` bytes, and for writes of the same range when
/// `flags()` contains `WRITABLE`, for as long as the process `pid` is inside
/// the current system call.
pub unsafe trait AddressSpace: Sync {
    /// Translate `vaddr` in the address space of `pid`.
    ///
    /// Returns `None` when no present mapping exists.
    fn translate(&self, pid: Pid, vaddr: UserAddr) -> Option<Mapping>;
}
