//! User configuration
//!
//! Read from `<config dir>/treewatch/config.toml` (or `--config FILE`);
//! command-line flags override file values. A missing default file means
//! defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use treewatch_core::{EventMask, ParseMaskError};
use watcher::config::DEFAULT_BUFFER_SIZE;
use watcher::{WatchError, WatcherConfig};

/// Longest accepted coalescing delay
pub const MAX_COALESCE_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("coalesce_ms must be between 0 and 1000, got {0}")]
    Coalesce(u64),

    #[error(transparent)]
    Events(#[from] ParseMaskError),

    #[error(transparent)]
    Engine(#[from] WatchError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub watch: WatchSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    /// Event names to report (`create`, `moved_to`, `all_events`, ...)
    pub events: Vec<String>,

    /// Give up after this long without events; negative waits forever
    pub timeout_ms: i64,

    /// Delay between the first event and reading the batch
    pub coalesce_ms: u64,

    /// Pending-event buffer, in bytes
    pub buffer_size: usize,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            events: ["create", "delete", "modify", "moved_from", "moved_to", "close_write"]
                .into_iter()
                .map(String::from)
                .collect(),
            timeout_ms: -1,
            coalesce_ms: 0,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl WatchSettings {
    pub fn mask(&self) -> Result<EventMask, ParseMaskError> {
        EventMask::from_names(&self.events)
    }

    pub fn timeout(&self) -> Option<Duration> {
        u64::try_from(self.timeout_ms).ok().map(Duration::from_millis)
    }

    pub fn coalesce(&self) -> Duration {
        Duration::from_millis(self.coalesce_ms)
    }
}

impl Settings {
    /// Engine configuration for these settings
    pub fn watcher_config(&self) -> Result<WatcherConfig, SettingsError> {
        let config = WatcherConfig {
            mask: self.watch.mask()?,
            buffer_size: self.watch.buffer_size,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.watch.coalesce_ms > MAX_COALESCE_MS {
            return Err(SettingsError::Coalesce(self.watch.coalesce_ms));
        }
        self.watcher_config()?;
        Ok(())
    }
}

/// Default config file location
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("treewatch").join("config.toml"))
}

/// Load settings from `path`, or from the default location if `None`
///
/// An explicit path must exist. Values are not validated here, since
/// command-line overrides still apply.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match config_file_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(Settings::default()),
        },
    };

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse(&contents).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn parse(contents: &str) -> Result<Settings> {
    Ok(toml::from_str(contents)?)
}

/// Commented example file with the default values
pub fn example_config() -> String {
    let defaults = WatchSettings::default();
    let events = defaults
        .events
        .iter()
        .map(|name| format!("{name:?}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"# treewatch configuration
# Location: ~/.config/treewatch/config.toml

[watch]
# Events to report; "all_events" for everything
events = [{events}]

# Stop after this many milliseconds without events (-1 = wait forever)
timeout_ms = {timeout_ms}

# Wait this long after the first event before reading, 0-{max} ms
coalesce_ms = {coalesce_ms}

# Pending-event buffer in bytes (at least 272)
buffer_size = {buffer_size}
"#,
        timeout_ms = defaults.timeout_ms,
        max = MAX_COALESCE_MS,
        coalesce_ms = defaults.coalesce_ms,
        buffer_size = defaults.buffer_size,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_example_parses_to_defaults() {
        let settings = parse(&example_config()).unwrap();
        assert_eq!(settings, Settings::default());
        settings.validate().unwrap();
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = parse("[watch]\ncoalesce_ms = 50\n").unwrap();
        assert_eq!(settings.watch.coalesce_ms, 50);
        assert_eq!(settings.watch.timeout_ms, -1);
        assert_eq!(settings.watch.buffer_size, DEFAULT_BUFFER_SIZE);

        let empty = parse("").unwrap();
        assert_eq!(empty, Settings::default());
    }

    #[test]
    fn test_timeout_conversion() {
        let mut watch = WatchSettings::default();
        assert_eq!(watch.timeout(), None);

        watch.timeout_ms = 0;
        assert_eq!(watch.timeout(), Some(Duration::ZERO));

        watch.timeout_ms = 1500;
        assert_eq!(watch.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        settings.watch.coalesce_ms = MAX_COALESCE_MS + 1;
        assert!(matches!(settings.validate(), Err(SettingsError::Coalesce(1001))));

        let mut settings = Settings::default();
        settings.watch.events = vec!["create".into(), "bogus".into()];
        assert!(matches!(settings.validate(), Err(SettingsError::Events(_))));

        let mut settings = Settings::default();
        settings.watch.events.clear();
        assert!(matches!(settings.validate(), Err(SettingsError::Engine(_))));

        let mut settings = Settings::default();
        settings.watch.buffer_size = 100;
        assert!(matches!(settings.validate(), Err(SettingsError::Engine(_))));
    }

    #[test]
    fn test_mask_from_events() {
        let mut watch = WatchSettings::default();
        watch.events = vec!["create".into(), "MOVED_TO".into()];
        assert_eq!(watch.mask().unwrap(), EventMask::CREATE | EventMask::MOVED_TO);
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[watch]\nevents = [\"delete\"]\ntimeout_ms = 250\n").unwrap();

        let settings = load(Some(&path)).unwrap();
        assert_eq!(settings.watch.events, vec!["delete".to_string()]);
        assert_eq!(settings.watch.timeout(), Some(Duration::from_millis(250)));

        assert!(load(Some(&temp_dir.path().join("missing.toml"))).is_err());

        std::fs::write(&path, "[watch]\ntimeout_ms = \"soon\"\n").unwrap();
        assert!(load(Some(&path)).is_err());
    }
}
