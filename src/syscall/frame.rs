//! Trap frame and request decoding
//!
//! User programs pass the system call number followed by up to three
//! argument words on their own stack:
//!
//! ```text
//! esp + 12 ┌──────────┐
//!          │  arg 2   │
//! esp + 8  ├──────────┤
//!          │  arg 1   │
//! esp + 4  ├──────────┤
//!          │  arg 0   │
//! esp      ├──────────┤
//!          │  number  │
//!          └──────────┘
//! ```
//!
//! The result goes back in `eax`.

use super::validate::{Fault, UserMemory};
use crate::mm::{UserAddr, WORD_SIZE};

/// Interrupt vector user programs trap through.
pub const SYSCALL_VECTOR: u8 = 0x30;

/// Maximum number of argument words of any system call.
pub const MAX_ARGS: usize = 3;

/// System call numbers
pub mod numbers {
    pub const SYS_HALT: u32 = 0;
    pub const SYS_EXIT: u32 = 1;
    pub const SYS_EXEC: u32 = 2;
    pub const SYS_WAIT: u32 = 3;
    pub const SYS_CREATE: u32 = 4;
    pub const SYS_REMOVE: u32 = 5;
    pub const SYS_OPEN: u32 = 6;
    pub const SYS_FILESIZE: u32 = 7;
    pub const SYS_READ: u32 = 8;
    pub const SYS_WRITE: u32 = 9;
    pub const SYS_SEEK: u32 = 10;
    pub const SYS_TELL: u32 = 11;
    pub const SYS_CLOSE: u32 = 12;
}

/// Saved user register state the dispatcher reads and writes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrapFrame {
    /// User stack pointer at the time of the trap.
    pub esp: u32,
    /// Result register.
    pub eax: u32,
}

/// A recognized system call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syscall {
    Halt,
    Exit,
    Exec,
    Wait,
    Create,
    Remove,
    Open,
    Filesize,
    Read,
    Write,
    Seek,
    Tell,
    Close,
}

impl Syscall {
    /// Decode a system call number.
    pub const fn from_number(number: u32) -> Option<Self> {
        use self::numbers::*;
        Some(match number {
            SYS_HALT => Self::Halt,
            SYS_EXIT => Self::Exit,
            SYS_EXEC => Self::Exec,
            SYS_WAIT => Self::Wait,
            SYS_CREATE => Self::Create,
            SYS_REMOVE => Self::Remove,
            SYS_OPEN => Self::Open,
            SYS_FILESIZE => Self::Filesize,
            SYS_READ => Self::Read,
            SYS_WRITE => Self::Write,
            SYS_SEEK => Self::Seek,
            SYS_TELL => Self::Tell,
            SYS_CLOSE => Self::Close,
            _ => return None,
        })
    }

    /// Number of argument words taken from the stack.
    pub const fn arity(self) -> usize {
        match self {
            Self::Halt => 0,
            Self::Exit
            | Self::Exec
            | Self::Wait
            | Self::Remove
            | Self::Open
            | Self::Filesize
            | Self::Tell
            | Self::Close => 1,
            Self::Create | Self::Seek => 2,
            Self::Read | Self::Write => 3,
        }
    }
}

/// One decoded system call request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    /// Raw number from the stack.
    pub number: u32,
    /// The call, if the number is known.
    pub call: Option<Syscall>,
    /// Argument words; unused slots are zero.
    pub args: [u32; MAX_ARGS],
}

impl Request {
    /// Argument `index` as a signed integer.
    #[inline]
    pub fn int(&self, index: usize) -> i32 {
        self.args[index] as i32
    }

    /// Argument `index` as an unsigned integer.
    #[inline]
    pub fn uint(&self, index: usize) -> u32 {
        self.args[index]
    }

    /// Argument `index` as a user address.
    #[inline]
    pub fn addr(&self, index: usize) -> UserAddr {
        UserAddr::new(self.args[index])
    }
}

/// Read the number and arguments from the user stack.
///
/// The stack pointer and every argument slot are validated before being
/// read. Unknown numbers decode with `call: None` and no arguments.
pub fn decode(frame: &TrapFrame, memory: &UserMemory<'_>) -> Result<Request, Fault> {
    let esp = UserAddr::new(frame.esp);
    let number = memory.read_word(esp)?;
    let call = Syscall::from_number(number);

    let mut args = [0u32; MAX_ARGS];
    let arity = call.map_or(0, Syscall::arity);
    let mut slot = esp;
    for arg in args.iter_mut().take(arity) {
        slot = slot.checked_add(WORD_SIZE).ok_or(Fault::Overflow(esp))?;
        *arg = memory.read_word(slot)?;
    }

    Ok(Request { number, call, args })
}
