//! Event callbacks
//!
//! User code receives input through an [`EventSink`] supplied at
//! construction. Every method defaults to a no-op, so a sink only implements
//! the events it cares about.

/// Callback surface for console events.
///
/// Methods are invoked from the event-loop thread, except [`on_resize`],
/// which is invoked from the resize settle worker. Panics are not caught:
/// they unwind through the loop after the console session has been released.
///
/// [`on_resize`]: EventSink::on_resize
pub trait EventSink: Send + Sync {
    /// The mouse moved to a new cell. Adjacent duplicate positions are
    /// suppressed before this is called.
    fn on_move(&self, x: i16, y: i16) {
        let _ = (x, y);
    }

    /// A mouse button changed state, or a double-click occurred.
    ///
    /// `button_state` is the raw button word: non-zero on press, zero on
    /// release. Both are delivered through this one callback.
    fn on_click(&self, x: i16, y: i16, button_state: u32) {
        let _ = (x, y, button_state);
    }

    /// The vertical wheel was rolled at `(x, y)`.
    fn on_scroll(&self, x: i16, y: i16) {
        let _ = (x, y);
    }

    /// The window size settled after a burst of resize notifications and the
    /// screen buffer has been resized to match.
    fn on_resize(&self) {}
}

/// A sink that ignores every event.
pub struct NullSink;

impl EventSink for NullSink {}
