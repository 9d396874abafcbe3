//! User Virtual Address Types
//!
//! Type-safe wrapper for addresses handed to the kernel by user programs.
//! A `UserAddr` is only a number: nothing in this module dereferences it.
//! Turning one into a usable pointer goes through the address validator.
//!
//! # Address Layout (32-bit user ABI)
//! ```text
//! 0x0000_0000 ┌──────────────────────┐
//!             │ unmapped / reserved  │  never valid for system calls
//! 0x0804_8000 ├──────────────────────┤  USER_FLOOR
//!             │ user code, data,     │
//!             │ heap and stack       │
//! 0xC000_0000 ├──────────────────────┤  PHYS_BASE
//!             │ kernel               │
//! 0xFFFF_FFFF └──────────────────────┘
//! ```

use core::fmt;

/// Page size (4 KiB)
pub const PAGE_SIZE: usize = 4096;
/// Page size mask
pub const PAGE_MASK: usize = PAGE_SIZE - 1;

/// Lowest address a user program may pass to the kernel.
pub const USER_FLOOR: u32 = 0x0804_8000;

/// Kernel/user split. Everything at or above belongs to the kernel.
pub const PHYS_BASE: u32 = 0xC000_0000;

/// Size in bytes of one argument slot on the user stack.
pub const WORD_SIZE: u32 = 4;

/// A user virtual address.
///
/// Arithmetic is checked: an address that would wrap is not representable.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct UserAddr(u32);

impl UserAddr {
    /// The null address.
    pub const NULL: Self = Self(0);

    /// Wrap a raw address word.
    #[inline]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Get the raw address value.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Check if the address lies inside the user window
    /// (`USER_FLOOR <= addr < PHYS_BASE`).
    #[inline]
    pub const fn is_user(self) -> bool {
        self.0 >= USER_FLOOR && self.0 < PHYS_BASE
    }

    /// Align the address down to its page boundary.
    #[inline]
    pub const fn page_base(self) -> Self {
        Self(self.0 & !(PAGE_MASK as u32))
    }

    /// Offset of the address within its page.
    #[inline]
    pub const fn page_offset(self) -> usize {
        self.0 as usize & PAGE_MASK
    }

    /// Bytes from this address to the end of its page (at least 1).
    #[inline]
    pub const fn bytes_to_page_end(self) -> usize {
        PAGE_SIZE - self.page_offset()
    }

    /// Add a byte offset, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(self, offset: u32) -> Option<Self> {
        match self.0.checked_add(offset) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }
}

impl fmt::Debug for UserAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserAddr({:#010x})", self.0)
    }
}

impl fmt::Display for UserAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
