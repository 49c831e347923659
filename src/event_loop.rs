//! Input event loop
//!
//! Polls the console input queue on a dedicated thread, classifies raw
//! records, and dispatches them to the registered [`EventSink`]. Stopping is
//! cooperative: the stop flag is checked once per iteration, and the Escape
//! key sets it from inside the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::info;

use crate::console::backend::{ConsoleBackend, Result};
use crate::console::input::{virtual_key_name, MouseEventFlags, RawInputRecord, VK_ESCAPE};
use crate::console::writer::ScreenWriter;
use crate::events::EventSink;

/// Loop lifecycle. Not restartable: a stopped loop stays stopped, and a new
/// loop requires a new console session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Running,
    Stopping,
    Stopped,
}

pub struct InputEventLoop<B: ConsoleBackend> {
    backend: Arc<Mutex<B>>,
    writer: ScreenWriter<B>,
    sink: Arc<dyn EventSink>,
    stop: Arc<AtomicBool>,
    poll_interval: Duration,
    echo_input: bool,
    /// Last position delivered to `on_move`, for adjacent-duplicate
    /// suppression. Updated on every move record whether or not the
    /// callback fired.
    last_mouse: Option<(i16, i16)>,
    state: LoopState,
}

impl<B: ConsoleBackend> InputEventLoop<B> {
    pub fn new(
        backend: Arc<Mutex<B>>,
        writer: ScreenWriter<B>,
        sink: Arc<dyn EventSink>,
        stop: Arc<AtomicBool>,
        poll_interval: Duration,
        echo_input: bool,
    ) -> Self {
        Self {
            backend,
            writer,
            sink,
            stop,
            poll_interval,
            echo_input,
            last_mouse: None,
            state: LoopState::Running,
        }
    }

    /// Run until the stop flag is set.
    ///
    /// Panics from sink callbacks are not caught here; they unwind through
    /// the loop to the caller, whose release guard still runs.
    pub fn run(&mut self) -> Result<()> {
        while !self.stop.load(Ordering::SeqCst) {
            let pending = {
                let mut backend = self.lock_backend();
                backend.pending_events()?
            };
            if pending == 0 {
                thread::sleep(self.poll_interval);
                continue;
            }

            let batch = {
                let mut backend = self.lock_backend();
                backend.read_batch()?
            };
            for record in batch {
                self.dispatch(record)?;
                if self.state == LoopState::Stopping {
                    // Remaining records in this batch are discarded.
                    break;
                }
            }
        }
        self.state = LoopState::Stopped;
        info!("Input event loop stopped");
        Ok(())
    }

    fn lock_backend(&self) -> std::sync::MutexGuard<'_, B> {
        self.backend
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn dispatch(&mut self, record: RawInputRecord) -> Result<()> {
        match record {
            RawInputRecord::Key {
                ch,
                virtual_key,
                is_down: true,
            } => {
                if self.echo_input {
                    self.echo_key(ch, virtual_key)?;
                }
                if virtual_key == VK_ESCAPE {
                    self.stop.store(true, Ordering::SeqCst);
                    self.state = LoopState::Stopping;
                }
            }
            RawInputRecord::Mouse {
                x,
                y,
                event_flags,
                button_state,
            } => self.dispatch_mouse(x, y, event_flags, button_state),
            // Key releases and other record kinds are ignored.
            RawInputRecord::Key { .. } | RawInputRecord::Other => {}
        }
        Ok(())
    }

    fn echo_key(&self, ch: Option<char>, virtual_key: u16) -> Result<()> {
        match ch.filter(|c| !c.is_control()) {
            Some(printable) => {
                let mut buf = [0u8; 4];
                self.writer.echo(printable.encode_utf8(&mut buf))
            }
            None => match virtual_key_name(virtual_key) {
                Some(name) => self.writer.print(name),
                None => self.writer.print(&format!("VirtualKeyCode: {virtual_key}")),
            },
        }
    }

    fn dispatch_mouse(&mut self, x: i16, y: i16, flags: MouseEventFlags, button_state: u32) {
        if flags.is_empty() || flags == MouseEventFlags::DOUBLE_CLICK {
            // Press and release both land here with the literal button word.
            self.sink.on_click(x, y, button_state);
        } else if flags == MouseEventFlags::MOVED {
            if self.last_mouse != Some((x, y)) {
                self.sink.on_move(x, y);
            }
            self.last_mouse = Some((x, y));
        } else if flags == MouseEventFlags::WHEELED {
            self.sink.on_scroll(x, y);
        }
        // Any other flag combination is ignored.
    }
}
