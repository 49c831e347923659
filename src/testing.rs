//! Test doubles shared across module tests.
//!
//! `MockConsole` stands in for the Win32 session behind [`ConsoleBackend`];
//! clones share one state cell, so a test keeps a clone as a probe while the
//! writer or manager owns the other.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::console::backend::{ConsoleBackend, Result};
use crate::console::input::RawInputRecord;
use crate::events::EventSink;

#[derive(Debug, Default)]
pub struct MockState {
    pub size: (u16, u16),
    pub queue: VecDeque<RawInputRecord>,
    pub cursor: (u16, u16),
    pub cursor_visible: bool,
    pub attr: u16,
    /// Text written at the cursor, in order.
    pub writes: Vec<String>,
    /// `(x, y, len, ch)` per fill_char call.
    pub char_fills: Vec<(u16, u16, u32, char)>,
    /// `(x, y, len, attr)` per fill_attribute call.
    pub attr_fills: Vec<(u16, u16, u32, u16)>,
    /// Buffer sizes committed via resize_buffer.
    pub resizes: Vec<(u16, u16)>,
    pub release_calls: usize,
}

#[derive(Clone)]
pub struct MockConsole {
    state: Arc<Mutex<MockState>>,
}

impl MockConsole {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                size: (cols, rows),
                cursor_visible: true,
                attr: 0x07,
                ..MockState::default()
            })),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn set_size(&self, cols: u16, rows: u16) {
        self.state().size = (cols, rows);
    }

    pub fn push_records(&self, records: Vec<RawInputRecord>) {
        self.state().queue.extend(records);
    }
}

impl ConsoleBackend for MockConsole {
    fn pending_events(&mut self) -> Result<usize> {
        Ok(self.state().queue.len())
    }

    fn read_batch(&mut self) -> Result<Vec<RawInputRecord>> {
        Ok(self.state().queue.drain(..).collect())
    }

    fn window_size(&mut self) -> Result<(u16, u16)> {
        Ok(self.state().size)
    }

    fn resize_buffer(&mut self, cols: u16, rows: u16) -> Result<()> {
        self.state().resizes.push((cols, rows));
        Ok(())
    }

    fn set_cursor_position(&mut self, x: u16, y: u16) -> Result<()> {
        self.state().cursor = (x, y);
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        self.state().cursor_visible = visible;
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.state().writes.push(text.to_string());
        Ok(())
    }

    fn color_attribute(&mut self) -> Result<u16> {
        Ok(self.state().attr)
    }

    fn set_color_attribute(&mut self, attr: u16) -> Result<()> {
        self.state().attr = attr;
        Ok(())
    }

    fn fill_char(&mut self, x: u16, y: u16, len: u32, ch: char) -> Result<()> {
        self.state().char_fills.push((x, y, len, ch));
        Ok(())
    }

    fn fill_attribute(&mut self, x: u16, y: u16, len: u32, attr: u16) -> Result<()> {
        self.state().attr_fills.push((x, y, len, attr));
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.state().release_calls += 1;
        Ok(())
    }
}

/// Sink call log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Move(i16, i16),
    Click(i16, i16, u32),
    Scroll(i16, i16),
    Resize,
}

/// An [`EventSink`] that records every call.
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<Call>>,
    resize_times: Mutex<Vec<Instant>>,
}

impl RecordingSink {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn resize_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Resize))
            .count()
    }

    pub fn first_resize_at(&self) -> Option<Instant> {
        self.resize_times
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .first()
            .copied()
    }

    fn record(&self, call: Call) {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(call);
    }
}

impl EventSink for RecordingSink {
    fn on_move(&self, x: i16, y: i16) {
        self.record(Call::Move(x, y));
    }

    fn on_click(&self, x: i16, y: i16, button_state: u32) {
        self.record(Call::Click(x, y, button_state));
    }

    fn on_scroll(&self, x: i16, y: i16) {
        self.record(Call::Scroll(x, y));
    }

    fn on_resize(&self) {
        self.resize_times
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(Instant::now());
        self.record(Call::Resize);
    }
}
