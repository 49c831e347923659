//! Resize debouncing
//!
//! Native window resizes arrive as a burst of notifications, often dozens
//! for one drag. [`ResizeDebouncer`] collapses each burst into a single
//! resize-and-redraw action: a settle worker waits until a full settle
//! interval passes with no new notification, then resizes the screen buffer
//! to the final window size, blanks the canvas, and fires `on_resize`.
//!
//! The debounce is a resettable deadline. `notify()` pushes the deadline
//! forward; the worker sleeps on a condvar until the deadline expires
//! unmoved. A worker is alive exactly while the deadline slot is occupied,
//! which makes the at-most-one-worker guarantee structural.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::console::backend::ConsoleBackend;
use crate::console::writer::ScreenWriter;
use crate::events::EventSink;

/// Shared flag the writer consults to suppress user writes while a settle
/// worker has the canvas in flux. Counts active workers so a worker that
/// finishes while a fresh burst is already settling does not drop the gate.
#[derive(Clone, Default)]
pub struct SettleGate(Arc<AtomicUsize>);

impl SettleGate {
    pub fn is_settling(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }

    pub(crate) fn enter(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn leave(&self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct Deadline {
    slot: Mutex<Option<Instant>>,
    settled: Condvar,
}

/// Collapses bursts of resize notifications into one settle action.
pub struct ResizeDebouncer<B: ConsoleBackend + Send + 'static> {
    deadline: Arc<Deadline>,
    writer: ScreenWriter<B>,
    sink: Arc<dyn EventSink>,
    gate: SettleGate,
    settle_interval: Duration,
}

impl<B: ConsoleBackend + Send + 'static> Clone for ResizeDebouncer<B> {
    fn clone(&self) -> Self {
        Self {
            deadline: self.deadline.clone(),
            writer: self.writer.clone(),
            sink: self.sink.clone(),
            gate: self.gate.clone(),
            settle_interval: self.settle_interval,
        }
    }
}

impl<B: ConsoleBackend + Send + 'static> ResizeDebouncer<B> {
    pub fn new(
        writer: ScreenWriter<B>,
        sink: Arc<dyn EventSink>,
        gate: SettleGate,
        settle_interval: Duration,
    ) -> Self {
        Self {
            deadline: Arc::new(Deadline {
                slot: Mutex::new(None),
                settled: Condvar::new(),
            }),
            writer,
            sink,
            gate,
            settle_interval,
        }
    }

    /// Record one raw resize notification.
    ///
    /// Callable from any thread; tolerates bursty at-least-once delivery.
    /// The first notification since idle spawns the settle worker, later
    /// ones only push its deadline forward.
    pub fn notify(&self) {
        let mut slot = self
            .deadline
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let was_idle = slot.is_none();
        *slot = Some(Instant::now() + self.settle_interval);
        if was_idle {
            // Entered while the slot lock is still held, so the gate is
            // already up for any writer that observes the new deadline.
            self.gate.enter();
        }
        drop(slot);

        if was_idle {
            let worker = self.clone();
            thread::spawn(move || worker.settle());
        } else {
            self.deadline.settled.notify_one();
        }
    }

    /// Whether a settle worker is currently active.
    pub fn is_settling(&self) -> bool {
        self.gate.is_settling()
    }

    /// Settle worker body: blank the stale canvas, wait for a quiet settle
    /// interval, then commit the resize and fire `on_resize`.
    fn settle(self) {
        // Stale glyphs from the old dimensions must not survive the
        // transition; blank the provisional canvas up front.
        match self.writer.window_size() {
            Ok((cols, rows)) => {
                if let Err(e) = self.writer.blank(cols, rows) {
                    error!("Failed to blank canvas before settle: {}", e);
                }
            }
            Err(e) => error!("Failed to snapshot window size: {}", e),
        }

        let mut slot = self
            .deadline
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        loop {
            let Some(deadline) = *slot else { break };
            let now = Instant::now();
            if now >= deadline {
                // Quiet interval observed; back to idle.
                *slot = None;
                break;
            }
            let (guard, _timeout) = self
                .deadline
                .settled
                .wait_timeout(slot, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            slot = guard;
        }
        drop(slot);

        match self.writer.commit_resize() {
            Ok((cols, rows)) => {
                info!("Resize settled at {}x{}", cols, rows);
                if let Err(e) = self.writer.blank(cols, rows) {
                    error!("Failed to blank canvas after resize: {}", e);
                }
            }
            Err(e) => error!("Failed to resize screen buffer: {}", e),
        }
        self.gate.leave();
        self.sink.on_resize();
    }
}
