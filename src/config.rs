use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_CHECK_INTERVAL_SECS: u64 = 1;
const DEFAULT_ACTIVITY_WINDOW_SECS: u64 = 300;

/// Directory holding the database, config file and anything else the
/// daemon writes.
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".tally"))
        .unwrap_or_else(|| PathBuf::from(".tally"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub monitor: MonitorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: data_dir().join("tally.sqlite3"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sampling cadence in seconds.
    pub check_interval_secs: u64,
    /// Idle cutoff in seconds; at or beyond it the user counts as idle.
    pub activity_window_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            activity_window_secs: DEFAULT_ACTIVITY_WINDOW_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        data_dir().join("config.json")
    }

    /// Reads configuration from `path`. A missing file yields the
    /// defaults; a file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let mut config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;
        config.replace_invalid_values();
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory {}", parent.display())
            })?;
        }

        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write config to {}", path.display()))
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.check_interval_secs)
    }

    pub fn activity_window(&self) -> Duration {
        Duration::from_secs(self.monitor.activity_window_secs)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.logging
            .level
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }

    fn replace_invalid_values(&mut self) {
        if self.monitor.check_interval_secs == 0 {
            self.monitor.check_interval_secs = DEFAULT_CHECK_INTERVAL_SECS;
        }
        if self.monitor.activity_window_secs == 0 {
            self.monitor.activity_window_secs = DEFAULT_ACTIVITY_WINDOW_SECS;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.json")).unwrap();

        assert_eq!(config.monitor.check_interval_secs, 1);
        assert_eq!(config.monitor.activity_window_secs, 300);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"monitor": {"activity_window_secs": 600}}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.monitor.activity_window_secs, 600);
        assert_eq!(config.monitor.check_interval_secs, 1);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn zero_intervals_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"monitor": {"check_interval_secs": 0, "activity_window_secs": 0}}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.monitor.check_interval_secs, 1);
        assert_eq!(config.monitor.activity_window_secs, 300);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.monitor.activity_window_secs = 120;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.monitor.activity_window_secs, 120);
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let mut config = Config::default();
        config.logging.level = "chatty".to_string();
        assert_eq!(config.log_level(), log::LevelFilter::Info);

        config.logging.level = "debug".to_string();
        assert_eq!(config.log_level(), log::LevelFilter::Debug);
    }
}
