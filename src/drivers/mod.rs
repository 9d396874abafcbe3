//! Device interfaces used by system calls
//!
//! - Console (keyboard input, display output)
//! - Power controller

mod console;

pub use console::{Console, ConsoleWriter};

/// The power controller collaborator.
pub trait Power: Sync {
    /// Turn the machine off. A real implementation does not return.
    fn power_off(&self);
}
