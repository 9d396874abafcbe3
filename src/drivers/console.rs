//! Console device interface
//!
//! The keyboard and display drivers live outside this crate. System calls
//! need byte-at-a-time input for handle 0 and whole-buffer output for
//! handle 1.
//!
//! # Security Considerations
//! - Output is only ever issued while holding the I/O write session, so
//!   buffers from different processes never interleave

use core::fmt;

/// The console collaborator.
pub trait Console: Sync {
    /// Read one byte of input, or `None` when no more input is available.
    fn getc(&self) -> Option<u8>;

    /// Write a whole buffer to the display.
    fn put_buffer(&self, buf: &[u8]);
}

/// `core::fmt::Write` adapter over a `Console`.
///
/// Used for kernel-formatted messages such as the termination line.
pub struct ConsoleWriter<'a> {
    console: &'a dyn Console,
}

impl<'a> ConsoleWriter<'a> {
    /// Wrap a console.
    pub fn new(console: &'a dyn Console) -> Self {
        Self { console }
    }
}

impl fmt::Write for ConsoleWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.console.put_buffer(s.as_bytes());
        Ok(())
    }
}

/// Print to a console, `print!` style.
#[macro_export]
macro_rules! cprint {
    ($console:expr, $($arg:tt)*) => {{
        use core::fmt::Write;
        let mut writer = $crate::drivers::ConsoleWriter::new($console);
        let _ = write!(writer, $($arg)*);
    }};
}

/// Print a line to a console, `println!` style.
#[macro_export]
macro_rules! cprintln {
    ($console:expr) => {
        $crate::cprint!($console, "\n")
    };
    ($console:expr, $($arg:tt)*) => {{
        $crate::cprint!($console, $($arg)*);
        $crate::cprint!($console, "\n");
    }};
}
