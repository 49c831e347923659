//! Exclusive screen writer
//!
//! Every write to the shared screen buffer goes through this type and its
//! single mutex: positioned text, plain prints, key echo, and color fills.
//! A cursor move and the write that follows it are therefore atomic with
//! respect to any other writer.
//!
//! While a resize settle is in flight the canvas dimensions are in flux, so
//! user-facing writes are suppressed: positioned writes report the
//! out-of-bounds sentinel, prints become no-ops. The gate is consulted under
//! the write lock, after the debouncer has raised it, so a write cannot slip
//! past a settle that has already begun. The settle worker itself bypasses
//! the gate through [`ScreenWriter::blank`].

use std::sync::{Arc, Mutex, MutexGuard};

use super::backend::{ConsoleBackend, Result};
use crate::debounce::SettleGate;

pub struct ScreenWriter<B: ConsoleBackend> {
    backend: Arc<Mutex<B>>,
    gate: SettleGate,
}

// Manual impl: `B` itself need not be Clone, only the shared handle is.
impl<B: ConsoleBackend> Clone for ScreenWriter<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            gate: self.gate.clone(),
        }
    }
}

impl<B: ConsoleBackend> ScreenWriter<B> {
    pub fn new(backend: Arc<Mutex<B>>, gate: SettleGate) -> Self {
        Self { backend, gate }
    }

    fn lock(&self) -> MutexGuard<'_, B> {
        // A poisoned lock only means a panic unwound elsewhere; the console
        // handle itself is still usable.
        self.backend
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Write `text` with the cell at `(x, y)` as its first character.
    ///
    /// Returns `Ok(false)` without writing when the position lies outside
    /// the current visible window, or while a resize settle is in flight.
    pub fn print_at(&self, x: u16, y: u16, text: &str) -> Result<bool> {
        let mut backend = self.lock();
        if self.gate.is_settling() {
            return Ok(false);
        }
        let (cols, rows) = backend.window_size()?;
        if x >= cols || y >= rows {
            return Ok(false);
        }
        backend.set_cursor_position(x, y)?;
        backend.write_text(text)?;
        Ok(true)
    }

    /// Append `text` and a newline at the current cursor position.
    /// No-op while a resize settle is in flight.
    pub fn print(&self, text: &str) -> Result<()> {
        let mut backend = self.lock();
        if self.gate.is_settling() {
            return Ok(());
        }
        backend.write_text(&format!("{text}\n"))
    }

    /// Write `text` verbatim at the current cursor position (key echo path).
    /// No-op while a resize settle is in flight.
    pub fn echo(&self, text: &str) -> Result<()> {
        let mut backend = self.lock();
        if self.gate.is_settling() {
            return Ok(());
        }
        backend.write_text(text)
    }

    pub fn set_cursor_visible(&self, visible: bool) -> Result<()> {
        self.lock().set_cursor_visible(visible)
    }

    pub fn color_attribute(&self) -> Result<u16> {
        self.lock().color_attribute()
    }

    pub fn set_color_attribute(&self, attr: u16) -> Result<()> {
        self.lock().set_color_attribute(attr)
    }

    /// Set the color attribute of the single cell at `(x, y)`.
    ///
    /// Same sentinel contract as [`ScreenWriter::print_at`].
    pub fn color_at(&self, x: u16, y: u16, attr: u16) -> Result<bool> {
        self.color_rect(x, y, 1, 1, attr)
    }

    /// Set the color attribute of a `w` x `h` rectangle anchored at `(x, y)`.
    ///
    /// The anchor is bounds-checked like a positioned write; the extent is
    /// clipped to the visible window.
    pub fn color_rect(&self, x: u16, y: u16, w: u16, h: u16, attr: u16) -> Result<bool> {
        let mut backend = self.lock();
        if self.gate.is_settling() {
            return Ok(false);
        }
        let (cols, rows) = backend.window_size()?;
        if x >= cols || y >= rows || w == 0 || h == 0 {
            return Ok(false);
        }
        let run = u32::from(w.min(cols - x));
        let bottom = y.saturating_add(h).min(rows);
        for row in y..bottom {
            backend.fill_attribute(x, row, run, attr)?;
        }
        Ok(true)
    }

    /// Current visible window size.
    pub fn window_size(&self) -> Result<(u16, u16)> {
        self.lock().window_size()
    }

    /// Space-fill a `cols` x `rows` canvas and park the cursor at the origin.
    ///
    /// Used by the settle worker while the gate is held; not suppressed.
    pub(crate) fn blank(&self, cols: u16, rows: u16) -> Result<()> {
        let mut backend = self.lock();
        let attr = backend.color_attribute()?;
        for row in 0..rows {
            backend.fill_char(0, row, u32::from(cols), ' ')?;
            backend.fill_attribute(0, row, u32::from(cols), attr)?;
        }
        backend.set_cursor_position(0, 0)
    }

    /// Resize the screen buffer to the current window size, returning the
    /// committed dimensions. Settle-worker path; not suppressed.
    pub(crate) fn commit_resize(&self) -> Result<(u16, u16)> {
        let mut backend = self.lock();
        let (cols, rows) = backend.window_size()?;
        backend.resize_buffer(cols, rows)?;
        Ok((cols, rows))
    }
}
