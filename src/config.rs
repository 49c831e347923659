//! Configuration for wincon.
//!
//! Loaded from `~/.wincon/config.toml`; every field has a default, so a
//! missing or malformed file falls back to the built-in values.
//!
//! ```toml
//! # Event loop poll quantum in milliseconds
//! poll_interval_ms = 10
//!
//! # Quiet period required before a resize burst is considered settled
//! settle_interval_ms = 100
//!
//! # Echo key presses to the screen buffer
//! echo_input = true
//! ```

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Event loop sleep when the input queue is empty, in milliseconds
    pub poll_interval_ms: u64,
    /// Quiet period the resize debouncer waits for, in milliseconds
    pub settle_interval_ms: u64,
    /// Whether key presses are echoed to the screen buffer
    pub echo_input: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            settle_interval_ms: 100,
            echo_input: true,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Self {
        if let Some(path) = Self::get_config_path() {
            if path.exists() {
                if let Ok(content) = fs::read_to_string(&path) {
                    if let Ok(config) = toml::from_str(&content) {
                        return config;
                    }
                }
            }
        }
        Self::default()
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        if let Some(home) = home_dir() {
            let wincon_dir = home.join(".wincon");
            if !wincon_dir.exists() {
                let _ = fs::create_dir_all(&wincon_dir);
            }
            return Some(wincon_dir.join("config.toml"));
        }
        None
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }
}

/// Get the home directory path
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(10));
        assert_eq!(config.settle_interval(), Duration::from_millis(100));
        assert!(config.echo_input);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("settle_interval_ms = 250").unwrap();
        assert_eq!(config.settle_interval_ms, 250);
        assert_eq!(config.poll_interval_ms, 10);
        assert!(config.echo_input);
    }

    #[test]
    fn test_full_toml() {
        let config: Config = toml::from_str(
            "poll_interval_ms = 5\nsettle_interval_ms = 50\necho_input = false",
        )
        .unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(5));
        assert_eq!(config.settle_interval(), Duration::from_millis(50));
        assert!(!config.echo_input);
    }
}
