//! Captured chat output.
//!
//! - [`LogBuffer`]: bounded, thread-safe FIFO of lines served at `/logs`
//! - [`strip_ansi`]: removes terminal control sequences from subprocess output

mod ansi;
mod buffer;

pub use ansi::strip_ansi;
pub use buffer::{DEFAULT_MAX_LINES, LogBuffer};
