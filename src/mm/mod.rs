//! Memory management interface for the system call layer
//!
//! Provides:
//! - User address types and the fixed user/kernel layout
//! - The address-space collaborator used to translate user addresses
//!
//! # Security Principles
//! - User addresses are plain numbers until validated
//! - Only `syscall::validate` turns a translation into a slice

mod address;
mod space;

pub use address::{UserAddr, PAGE_SIZE, PHYS_BASE, USER_FLOOR, WORD_SIZE};
pub use space::{AddressSpace, Mapping, PageFlags};
