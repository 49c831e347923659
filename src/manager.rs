//! Console manager
//!
//! The root composition a caller instantiates: it owns the console backend,
//! the exclusive writer, the resize debouncer, and the event-loop thread,
//! and exposes the public write surface.
//!
//! The loop thread holds a release guard, so the console session is released
//! on every exit path: ESC, an external `stop()`, or a panic unwinding out
//! of a user callback. The panic itself is surfaced again by [`wait`].
//!
//! [`wait`]: ConsoleManager::wait

use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{error, info};

use crate::config::Config;
use crate::console::backend::{ConsoleBackend, ConsoleError, Result};
use crate::console::writer::ScreenWriter;
use crate::debounce::{ResizeDebouncer, SettleGate};
use crate::events::EventSink;

/// Cloneable, type-erased handle the external resize hook calls.
///
/// The hook's contract is at-least-once delivery per native resize, from any
/// thread, possibly in rapid bursts; the debouncer behind this handle is
/// built for exactly that.
#[derive(Clone)]
pub struct ResizeNotifier {
    notify: Arc<dyn Fn() + Send + Sync>,
}

impl ResizeNotifier {
    pub fn notify(&self) {
        (self.notify)();
    }
}

/// Releases the backend when the loop thread exits, normally or by unwind.
struct ReleaseGuard<B: ConsoleBackend> {
    backend: Arc<Mutex<B>>,
}

impl<B: ConsoleBackend> Drop for ReleaseGuard<B> {
    fn drop(&mut self) {
        let mut backend = self
            .backend
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = backend.release() {
            error!("Failed to release console session: {}", e);
        }
    }
}

pub struct ConsoleManager<B: ConsoleBackend + Send + 'static> {
    backend: Arc<Mutex<B>>,
    writer: ScreenWriter<B>,
    debouncer: ResizeDebouncer<B>,
    sink: Arc<dyn EventSink>,
    stop: Arc<AtomicBool>,
    config: Config,
    loop_thread: Option<JoinHandle<Result<()>>>,
}

impl<B: ConsoleBackend + Send + 'static> ConsoleManager<B> {
    /// Compose a manager over an already-acquired backend.
    pub fn with_backend(backend: B, sink: Arc<dyn EventSink>, config: Config) -> Self {
        let backend = Arc::new(Mutex::new(backend));
        let gate = SettleGate::default();
        let writer = ScreenWriter::new(backend.clone(), gate.clone());
        let debouncer = ResizeDebouncer::new(
            writer.clone(),
            sink.clone(),
            gate,
            config.settle_interval(),
        );
        Self {
            backend,
            writer,
            debouncer,
            sink,
            stop: Arc::new(AtomicBool::new(false)),
            config,
            loop_thread: None,
        }
    }

    /// Start the input event loop on a dedicated thread.
    ///
    /// A manager is single-shot: starting twice, or after the loop has
    /// stopped, is an error.
    pub fn start(&mut self) -> Result<()> {
        if self.loop_thread.is_some() || self.stop.load(Ordering::SeqCst) {
            return Err(ConsoleError::AlreadyStarted);
        }

        let backend = self.backend.clone();
        let writer = self.writer.clone();
        let sink = self.sink.clone();
        let stop = self.stop.clone();
        let poll_interval = self.config.poll_interval();
        let echo_input = self.config.echo_input;

        let handle = thread::spawn(move || {
            let _guard = ReleaseGuard {
                backend: backend.clone(),
            };
            let mut event_loop = crate::event_loop::InputEventLoop::new(
                backend,
                writer,
                sink,
                stop,
                poll_interval,
                echo_input,
            );
            event_loop.run()
        });
        self.loop_thread = Some(handle);
        info!("Console manager started");
        Ok(())
    }

    /// Request a cooperative stop; honored at the loop's next iteration.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Whether the event loop is still running.
    pub fn is_running(&self) -> bool {
        !self.stop.load(Ordering::SeqCst) && self.loop_thread.is_some()
    }

    /// Join the event-loop thread.
    ///
    /// A panic that escaped a user callback is resumed on this caller after
    /// the session release guard has already run.
    pub fn wait(&mut self) -> Result<()> {
        match self.loop_thread.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(payload) => panic::resume_unwind(payload),
            },
            None => Ok(()),
        }
    }

    /// Handle for the external resize hook.
    pub fn notifier(&self) -> ResizeNotifier {
        let debouncer = self.debouncer.clone();
        ResizeNotifier {
            notify: Arc::new(move || debouncer.notify()),
        }
    }

    /// Record one raw resize notification directly.
    pub fn notify_resize(&self) {
        self.debouncer.notify();
    }

    // Write surface: thin delegation to the exclusive writer.

    pub fn print_at(&self, x: u16, y: u16, text: &str) -> Result<bool> {
        self.writer.print_at(x, y, text)
    }

    pub fn print(&self, text: &str) -> Result<()> {
        self.writer.print(text)
    }

    pub fn set_cursor_visible(&self, visible: bool) -> Result<()> {
        self.writer.set_cursor_visible(visible)
    }

    pub fn color_attribute(&self) -> Result<u16> {
        self.writer.color_attribute()
    }

    pub fn set_color_attribute(&self, attr: u16) -> Result<()> {
        self.writer.set_color_attribute(attr)
    }

    pub fn color_at(&self, x: u16, y: u16, attr: u16) -> Result<bool> {
        self.writer.color_at(x, y, attr)
    }

    pub fn color_rect(&self, x: u16, y: u16, w: u16, h: u16, attr: u16) -> Result<bool> {
        self.writer.color_rect(x, y, w, h, attr)
    }

    pub fn window_size(&self) -> Result<(u16, u16)> {
        self.writer.window_size()
    }
}

#[cfg(windows)]
impl ConsoleManager<crate::console::session::ConsoleSession> {
    /// Acquire a real Win32 console session and compose a manager over it.
    pub fn acquire(sink: Arc<dyn EventSink>, config: Config) -> Result<Self> {
        let session = crate::console::session::ConsoleSession::acquire()?;
        Ok(Self::with_backend(session, sink, config))
    }
}

impl<B: ConsoleBackend + Send + 'static> Drop for ConsoleManager<B> {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.loop_thread.take() {
            // Panic payloads were the callback's business; teardown already
            // ran in the loop thread's guard.
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use crate::console::input::{RawInputRecord, VK_ESCAPE};
    use crate::events::NullSink;
    use crate::testing::{MockConsole, RecordingSink};

    fn esc() -> RawInputRecord {
        RawInputRecord::Key {
            ch: Some('\x1b'),
            virtual_key: VK_ESCAPE,
            is_down: true,
        }
    }

    fn test_config() -> Config {
        Config {
            poll_interval_ms: 1,
            settle_interval_ms: 20,
            echo_input: false,
        }
    }

    fn wait_for_release(probe: &MockConsole) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while probe.state().release_calls == 0 {
            assert!(Instant::now() < deadline, "session never released");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_escape_exit_releases_once() {
        let mock = MockConsole::new(80, 25);
        let probe = mock.clone();
        let mut manager =
            ConsoleManager::with_backend(mock, Arc::new(NullSink), test_config());
        manager.start().unwrap();
        probe.push_records(vec![esc()]);
        manager.wait().unwrap();
        assert_eq!(probe.state().release_calls, 1);
        drop(manager);
        assert_eq!(probe.state().release_calls, 1);
    }

    #[test]
    fn test_external_stop_releases_once() {
        let mock = MockConsole::new(80, 25);
        let probe = mock.clone();
        let mut manager =
            ConsoleManager::with_backend(mock, Arc::new(NullSink), test_config());
        manager.start().unwrap();
        manager.stop();
        manager.wait().unwrap();
        assert_eq!(probe.state().release_calls, 1);
    }

    #[test]
    fn test_callback_panic_releases_then_resumes() {
        struct PanickingSink;
        impl crate::events::EventSink for PanickingSink {
            fn on_click(&self, _x: i16, _y: i16, _button_state: u32) {
                panic!("callback failure");
            }
        }

        let mock = MockConsole::new(80, 25);
        let probe = mock.clone();
        let mut manager =
            ConsoleManager::with_backend(mock, Arc::new(PanickingSink), test_config());
        manager.start().unwrap();
        probe.push_records(vec![RawInputRecord::Mouse {
            x: 1,
            y: 1,
            event_flags: crate::console::input::MouseEventFlags::empty(),
            button_state: 1,
        }]);

        let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| manager.wait()));
        assert!(outcome.is_err());
        // Release ran during the unwind, before the panic reached us
        assert_eq!(probe.state().release_calls, 1);
    }

    #[test]
    fn test_start_is_single_shot() {
        let mock = MockConsole::new(80, 25);
        let probe = mock.clone();
        let mut manager =
            ConsoleManager::with_backend(mock, Arc::new(NullSink), test_config());
        manager.start().unwrap();
        assert!(matches!(
            manager.start(),
            Err(ConsoleError::AlreadyStarted)
        ));
        probe.push_records(vec![esc()]);
        manager.wait().unwrap();
        assert!(matches!(
            manager.start(),
            Err(ConsoleError::AlreadyStarted)
        ));
    }

    #[test]
    fn test_notifier_drives_debouncer() {
        let mock = MockConsole::new(80, 25);
        let probe = mock.clone();
        let mut manager = ConsoleManager::with_backend(
            mock,
            Arc::new(RecordingSink::default()),
            test_config(),
        );
        manager.start().unwrap();

        let notifier = manager.notifier();
        let hook = thread::spawn(move || {
            for _ in 0..5 {
                notifier.notify();
                thread::sleep(Duration::from_millis(2));
            }
        });
        hook.join().unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while probe.state().resizes.is_empty() {
            assert!(Instant::now() < deadline, "settle never committed");
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(30));
        assert_eq!(probe.state().resizes, vec![(80, 25)]);

        manager.stop();
        manager.wait().unwrap();
        wait_for_release(&probe);
    }

    #[test]
    fn test_write_surface_delegates() {
        let mock = MockConsole::new(20, 10);
        let probe = mock.clone();
        let manager =
            ConsoleManager::with_backend(mock, Arc::new(NullSink), test_config());
        assert!(manager.print_at(1, 1, "x").unwrap());
        assert!(!manager.print_at(20, 1, "x").unwrap());
        manager.set_color_attribute(0x4E).unwrap();
        assert_eq!(manager.color_attribute().unwrap(), 0x4E);
        assert!(manager.color_rect(0, 0, 2, 2, 0x4E).unwrap());
        assert_eq!(manager.window_size().unwrap(), (20, 10));
        assert_eq!(probe.state().writes, vec!["x".to_string()]);
    }
}
