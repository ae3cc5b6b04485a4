//! Output helpers for commands with BrokenPipe handling.
//!
//! `archive-import ls big.osz | head` closes stdout early; that is not an error.

/// Print with newline, handling BrokenPipe gracefully.
///
/// Returns `Ok(())` early if BrokenPipe is encountered.
/// Propagates other IO errors.
#[macro_export]
macro_rules! print_line {
    ($($arg:tt)*) => {{
        use std::io::Write;
        match writeln!(std::io::stdout(), $($arg)*) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }};
}

pub use print_line;

/// Whether an error chain ends in a closed pipe
pub fn is_broken_pipe(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::BrokenPipe
}
