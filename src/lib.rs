//! wincon - Windows console event manager
//!
//! wincon owns a raw Win32 console session and turns its input queue into a
//! typed callback API. It provides:
//!
//! - **Input event loop**: a polling loop that drains keyboard/mouse records
//!   in arrival order and dispatches them to an [`EventSink`]
//! - **Resize debouncing**: bursts of window-resize notifications collapse
//!   into a single resize-and-redraw action after a quiet period
//! - **Serialized output**: positioned text writes, cursor control, and
//!   per-cell color attributes, all behind one exclusive writer lock
//! - **Guaranteed teardown**: the original input mode is restored and the
//!   console handles are released on every exit path, including a panic
//!   escaping a user callback
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use wincon::{Config, ConsoleManager, EventSink};
//!
//! struct Clicks;
//! impl EventSink for Clicks {
//!     fn on_click(&self, x: i16, y: i16, button_state: u32) {
//!         let _ = (x, y, button_state);
//!     }
//! }
//!
//! # #[cfg(windows)]
//! # fn run() -> wincon::Result<()> {
//! let mut manager = ConsoleManager::acquire(Arc::new(Clicks), Config::default())?;
//! manager.start()?;
//! manager.print_at(0, 0, "hello")?;
//! manager.wait()?; // returns when the loop stops (ESC or stop())
//! # Ok(())
//! # }
//! ```
//!
//! The OS console surface is abstracted behind [`ConsoleBackend`], so every
//! layer above the Win32 session can be driven by a test double.

pub mod config;
pub mod console;
pub mod debounce;
pub mod event_loop;
pub mod events;
pub mod manager;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use console::backend::{ConsoleBackend, ConsoleError, Result};
pub use console::input::{virtual_key_name, MouseEventFlags, RawInputRecord, VK_ESCAPE};
pub use console::writer::ScreenWriter;
pub use debounce::{ResizeDebouncer, SettleGate};
pub use events::{EventSink, NullSink};
pub use manager::{ConsoleManager, ResizeNotifier};

#[cfg(windows)]
pub use console::session::ConsoleSession;
