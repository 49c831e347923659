//! Console backend abstraction
//!
//! Everything above the OS layer (event loop, writer, debouncer, manager) is
//! written against this trait. The Windows implementation lives in
//! `console::session`; tests drive the same code paths with a mock.

use std::io;

use thiserror::Error;

use super::input::RawInputRecord;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Failed to open console input handle: {0}")]
    InputHandle(#[source] io::Error),

    #[error("Failed to create screen buffer: {0}")]
    ScreenBuffer(#[source] io::Error),

    #[error("Failed to set console mode: {0}")]
    Mode(#[source] io::Error),

    #[error("Failed to read console input: {0}")]
    Read(#[source] io::Error),

    #[error("Failed to write to console: {0}")]
    Write(#[source] io::Error),

    #[error("Failed to query console state: {0}")]
    Query(#[source] io::Error),

    #[error("Failed to resize screen buffer: {0}")]
    Resize(#[source] io::Error),

    #[error("Event loop already started")]
    AlreadyStarted,
}

pub type Result<T> = std::result::Result<T, ConsoleError>;

/// The OS console surface consumed by the event loop, writer, and debouncer.
///
/// Coordinates are zero-based cells, `(x, y)` = (column, row). Sizes are
/// `(cols, rows)` of the *visible* window, which is also the canvas that
/// bounds-checked writes are validated against.
pub trait ConsoleBackend {
    /// Number of unread records in the input queue.
    fn pending_events(&mut self) -> Result<usize>;

    /// Drain all pending records in one call, preserving delivery order.
    fn read_batch(&mut self) -> Result<Vec<RawInputRecord>>;

    /// Current visible window size as `(cols, rows)`.
    fn window_size(&mut self) -> Result<(u16, u16)>;

    /// Resize the active screen buffer.
    fn resize_buffer(&mut self, cols: u16, rows: u16) -> Result<()>;

    fn set_cursor_position(&mut self, x: u16, y: u16) -> Result<()>;

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()>;

    /// Write raw text at the current cursor position.
    fn write_text(&mut self, text: &str) -> Result<()>;

    /// Current default color attribute of the screen buffer.
    fn color_attribute(&mut self) -> Result<u16>;

    fn set_color_attribute(&mut self, attr: u16) -> Result<()>;

    /// Fill `len` cells starting at `(x, y)` with `ch`, wrapping by row.
    fn fill_char(&mut self, x: u16, y: u16, len: u32, ch: char) -> Result<()>;

    /// Fill `len` cells starting at `(x, y)` with the color attribute `attr`.
    fn fill_attribute(&mut self, x: u16, y: u16, len: u32, attr: u16) -> Result<()>;

    /// Release the underlying OS resources. Must be idempotent: the first
    /// call restores saved state, later calls are no-ops.
    fn release(&mut self) -> Result<()>;
}
