use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::model::Coordinate;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 1800;
pub const DEFAULT_HOURS_AHEAD: u32 = 6;

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_hours_ahead() -> u32 {
    DEFAULT_HOURS_AHEAD
}

fn default_language() -> String {
    "en".to_string()
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// latitude = -23.5505
/// longitude = -46.6333
/// serial_port = "/dev/ttyUSB0"
/// poll_interval_secs = 1800
/// hours_ahead = 6
/// language = "en"
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenWeatherMap API credential.
    pub api_key: String,

    pub latitude: f64,
    pub longitude: f64,

    /// Serial device of the irrigation controller, e.g. "/dev/ttyUSB0" or
    /// "COM3". Absent means simulation mode: commands are only logged.
    pub serial_port: Option<String>,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_hours_ahead")]
    pub hours_ahead: u32,

    /// Language for provider condition descriptions.
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            serial_port: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            hours_ahead: DEFAULT_HOURS_AHEAD,
            language: default_language(),
        }
    }
}

// Keep the credential out of Debug output.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"[REDACTED]")
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .field("serial_port", &self.serial_port)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("hours_ahead", &self.hours_ahead)
            .field("language", &self.language)
            .finish()
    }
}

impl Config {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Fail early when the monitor cannot run with this configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.has_api_key() {
            return Err(anyhow!(
                "No API key configured.\n\
                 Hint: run `rainguard configure` and enter your OpenWeatherMap key."
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(anyhow!("Latitude {} is outside -90..=90", self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(anyhow!("Longitude {} is outside -180..=180", self.longitude));
        }
        if self.poll_interval_secs == 0 {
            return Err(anyhow!("poll_interval_secs must be greater than zero"));
        }
        Ok(())
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "rainguard", "rainguard-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_optional_fields() {
        let cfg: Config = toml::from_str(
            r#"
            api_key = "KEY"
            latitude = -23.5505
            longitude = -46.6333
            "#,
        )
        .expect("minimal config must parse");

        assert_eq!(cfg.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
        assert_eq!(cfg.hours_ahead, DEFAULT_HOURS_AHEAD);
        assert_eq!(cfg.language, "en");
        assert!(cfg.serial_port.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_api_key() {
        let cfg = Config::default();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn validate_rejects_out_of_range_coordinates() {
        let cfg = Config { api_key: "KEY".into(), latitude: 123.0, ..Config::default() };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("Latitude"));

        let cfg = Config { api_key: "KEY".into(), longitude: -200.0, ..Config::default() };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("Longitude"));
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let cfg = Config {
            api_key: "KEY".into(),
            poll_interval_secs: 0,
            ..Config::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let cfg = Config { api_key: "SECRET".into(), ..Config::default() };
        let printed = format!("{cfg:?}");
        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains("SECRET"));
    }
}
