//! Configuration loading and management
//!
//! All defaults are compiled in. An optional `camglance.json` beside the
//! executable can override any field. Relative files (cache, log) live in
//! the executable's directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::hook::keys;

/// Name of the optional override file beside the executable
const CONFIG_FILE: &str = "camglance.json";

/// Viewer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL of the webcam snapshot image
    pub url: String,

    /// Cache file name, relative to the executable
    pub cache_file: String,

    /// Log file name, relative to the executable
    pub log_file: String,

    /// Virtual-key codes that dismiss the viewer (and are suppressed
    /// from reaching other applications)
    pub watched_keys: Vec<u32>,

    /// Delay before the keyboard hook is installed, in milliseconds
    pub hook_delay_ms: u64,

    /// Re-download interval in seconds; `None` fetches exactly once
    pub refresh_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: "https://vid.nl/ImageCamera/cam_27".to_string(),
            cache_file: "webcam.jpg".to_string(),
            log_file: "camglance.log".to_string(),
            watched_keys: vec![keys::VK_NUMPAD_ADD, keys::VK_NUMPAD_DIVIDE],
            hook_delay_ms: 1000,
            refresh_secs: None,
        }
    }
}

impl Config {
    /// Load configuration from the directory beside the executable
    pub fn load() -> Result<Self> {
        Self::load_from(&base_dir())
    }

    /// Load configuration from `dir`, falling back to defaults when no
    /// override file is present
    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            let config = serde_json::from_str(&text)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Absolute path of the snapshot cache file
    pub fn cache_path(&self) -> PathBuf {
        base_dir().join(&self.cache_file)
    }

    /// Absolute path of the append-only log file
    pub fn log_path(&self) -> PathBuf {
        base_dir().join(&self.log_file)
    }

    /// Hook installation delay
    pub fn hook_delay(&self) -> Duration {
        Duration::from_millis(self.hook_delay_ms)
    }

    /// Re-download interval, if periodic refresh is enabled
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_secs.map(Duration::from_secs)
    }
}

/// Directory the executable lives in, where the cache and log files go.
/// Falls back to the current directory if the executable path is opaque.
pub fn base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.url.starts_with("https://"));
        assert_eq!(config.watched_keys, vec![107, 111]);
        assert_eq!(config.hook_delay(), Duration::from_secs(1));
        assert!(config.refresh_interval().is_none());
    }

    #[test]
    fn test_load_without_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.cache_file, "webcam.jpg");
    }

    #[test]
    fn test_load_with_partial_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"url":"https://example.com/cam.jpg","refresh_secs":60}"#,
        )
        .unwrap();

        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.url, "https://example.com/cam.jpg");
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(60)));
        // untouched fields keep their defaults
        assert_eq!(config.log_file, "camglance.log");
    }

    #[test]
    fn test_load_with_malformed_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "not json").unwrap();
        assert!(Config::load_from(dir.path()).is_err());
    }
}
