//! Console primitives
//!
//! This module contains the OS console surface:
//! - `backend`: the [`ConsoleBackend`] trait and error types
//! - `input`: typed input records drained from the console queue
//! - `session`: the Win32 implementation (Windows only)
//! - `writer`: the exclusive screen writer built on top of a backend

pub mod backend;
pub mod input;
pub mod writer;

#[cfg(windows)]
pub mod session;

pub use backend::{ConsoleBackend, ConsoleError, Result};
pub use input::{MouseEventFlags, RawInputRecord};
pub use writer::ScreenWriter;
