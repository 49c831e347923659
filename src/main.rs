//! wincon - Windows console event manager
//!
//! Demo binary for the wincon library: acquires a console session, starts
//! the input event loop with a logging event sink, and runs a small polling
//! resize hook that feeds the debouncer. Press ESC to exit.
//!
//! ```text
//! wincon                 # Run with defaults (~/.wincon/config.toml)
//! wincon --settle-ms 250 # Slower resize settling
//! wincon --quiet         # No key echo
//! ```

use std::env;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use wincon::{Config, EventSink};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command-line overrides on top of the config file
struct Args {
    poll_ms: Option<u64>,
    settle_ms: Option<u64>,
    quiet: bool,
}

fn print_version() {
    eprintln!("wincon {}", VERSION);
}

fn print_help() {
    eprintln!("wincon {} - Windows console event manager", VERSION);
    eprintln!();
    eprintln!("Usage: wincon [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --poll-ms <MS>        Input poll quantum (default 10)");
    eprintln!("  --settle-ms <MS>      Resize settle interval (default 100)");
    eprintln!("  -q, --quiet           Do not echo key presses");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Configuration: ~/.wincon/config.toml");
    eprintln!("Log file:      ~/.wincon/wincon.log");
    eprintln!();
    eprintln!("Exit: press ESC");
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args {
        poll_ms: None,
        settle_ms: None,
        quiet: false,
    };
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "--poll-ms" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --poll-ms")?;
                parsed.poll_ms = Some(value.parse().map_err(|_| "Invalid --poll-ms value")?);
            }
            "--settle-ms" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --settle-ms")?;
                parsed.settle_ms = Some(value.parse().map_err(|_| "Invalid --settle-ms value")?);
            }
            "-q" | "--quiet" => {
                parsed.quiet = true;
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

/// Initialize logging to ~/.wincon/wincon.log
fn init_logging() {
    let log_path = wincon::config::home_dir()
        .map(|h| h.join(".wincon").join("wincon.log"))
        .unwrap_or_else(|| std::path::PathBuf::from("wincon.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

/// Sink that records every event to the log file.
struct LoggingSink;

impl EventSink for LoggingSink {
    fn on_move(&self, x: i16, y: i16) {
        info!("Mouse moved to ({}, {})", x, y);
    }

    fn on_click(&self, x: i16, y: i16, button_state: u32) {
        info!("Mouse click at ({}, {}), buttons {:#x}", x, y, button_state);
    }

    fn on_scroll(&self, x: i16, y: i16) {
        info!("Wheel at ({}, {})", x, y);
    }

    fn on_resize(&self) {
        info!("Window resize settled");
    }
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("wincon {} starting...", VERSION);

    let mut config = Config::load();
    if let Some(poll) = args.poll_ms {
        config.poll_interval_ms = poll;
    }
    if let Some(settle) = args.settle_ms {
        config.settle_interval_ms = settle;
    }
    if args.quiet {
        config.echo_input = false;
    }

    #[cfg(windows)]
    {
        run(config)?;
    }

    #[cfg(not(windows))]
    {
        let _ = config;
        eprintln!("wincon drives the Win32 console and only runs on Windows.");
    }

    Ok(())
}

/// Run the event manager (Windows only)
#[cfg(windows)]
fn run(config: Config) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use wincon::ConsoleManager;

    let mut manager = ConsoleManager::acquire(Arc::new(LoggingSink), config)?;

    // The resize hook must be running before the loop starts and stop after
    // it ends. The demo hook polls the window size and notifies on change.
    let notifier = manager.notifier();
    let hook_running = Arc::new(AtomicBool::new(true));
    let hook = {
        let hook_running = hook_running.clone();
        std::thread::spawn(move || {
            let mut last = window_size_probe();
            while hook_running.load(Ordering::SeqCst) {
                let current = window_size_probe();
                if current != last {
                    notifier.notify();
                    last = current;
                }
                std::thread::sleep(Duration::from_millis(50));
            }
        })
    };

    manager.start()?;
    let (cols, rows) = manager.window_size()?;
    info!("Console size: {}x{}", cols, rows);
    manager.print_at(0, 0, "wincon demo - type, click, scroll, resize. ESC exits.")?;

    let result = manager.wait();

    hook_running.store(false, Ordering::SeqCst);
    let _ = hook.join();
    info!("wincon exiting");
    result?;
    Ok(())
}

/// Query the visible window size of the process console.
#[cfg(windows)]
fn window_size_probe() -> (i16, i16) {
    use windows::Win32::System::Console::{
        GetConsoleScreenBufferInfo, GetStdHandle, CONSOLE_SCREEN_BUFFER_INFO, STD_OUTPUT_HANDLE,
    };

    unsafe {
        if let Ok(handle) = GetStdHandle(STD_OUTPUT_HANDLE) {
            let mut info = CONSOLE_SCREEN_BUFFER_INFO::default();
            if GetConsoleScreenBufferInfo(handle, &mut info).is_ok() {
                let win = info.srWindow;
                return (win.Right - win.Left + 1, win.Bottom - win.Top + 1);
            }
        }
    }
    (0, 0)
}
