use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    num::NonZeroU32,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    error::{Error, Result},
    model::is_zip,
    scheduler::LocationSchedule,
};

/// Environment variable that takes precedence over `api_key` in the file.
pub const API_KEY_ENV: &str = "WEATHER_TRACKER_API_KEY";

pub const DEFAULT_ENDPOINT: &str = "http://api.openweathermap.org/data/2.5/weather";

/// Tracker configuration, loaded once at startup and only borrowed after.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// duration_minutes = 60
///
/// [locations]
/// "37931" = 15
/// "10001" = 30
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenWeatherMap application id.
    #[serde(default)]
    pub api_key: String,

    /// Directory holding `<zip>.txt` files and `weatherlog.txt`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Last tick index of a run; a run performs `duration_minutes + 1` ticks.
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,

    /// Sleep between ticks.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,

    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Country code appended to every zip in the request.
    #[serde(default = "default_country")]
    pub country: String,

    /// zip code -> retrieval interval in minutes.
    #[serde(default)]
    pub locations: LocationSchedule,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_duration_minutes() -> u32 {
    60
}

fn default_tick_seconds() -> u64 {
    60
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_country() -> String {
    "US".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            data_dir: default_data_dir(),
            duration_minutes: default_duration_minutes(),
            tick_seconds: default_tick_seconds(),
            request_timeout_seconds: default_request_timeout_seconds(),
            endpoint: default_endpoint(),
            country: default_country(),
            locations: LocationSchedule::default(),
        }
    }
}

impl Config {
    /// Load from the platform config path. See [`Config::load_from`].
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_file_path()?)
    }

    /// Load and validate a config file, applying [`API_KEY_ENV`] on top.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigMissing(format!(
                "no config file at {}.\n\
                 Hint: run `weather-tracker configure` and `weather-tracker track <zip> <minutes>` first.",
                path.display()
            )));
        }

        let mut cfg = Self::read(path)?;
        cfg.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
        cfg.validate()?;

        Ok(cfg)
    }

    /// Read a config file for editing: no env override, no validation, and
    /// an empty default when the file does not exist yet.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::read(path)
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::ConfigInvalid(format!("failed to read {}: {e}", path.display()))
        })?;

        Self::from_toml_str(&contents)
            .map_err(|e| Error::ConfigInvalid(format!("{}: {e}", path.display())))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::ConfigInvalid(e.to_string()))
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let toml = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigInvalid(format!("failed to serialize config: {e}")))?;

        fs::write(path, toml).map_err(|e| Error::io(path, e))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-tracker", "weather-tracker").ok_or_else(|| {
            Error::ConfigMissing("could not determine platform config directory".into())
        })?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// A non-empty override replaces the key from the file.
    pub fn apply_api_key_override(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = key;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::ConfigMissing(format!(
                "api_key is not set (set it in the config file or via {API_KEY_ENV})"
            )));
        }

        if self.locations.is_empty() {
            return Err(Error::ConfigMissing("no locations configured".into()));
        }

        if self.tick_seconds == 0 && self.duration_minutes > 0 {
            tracing::warn!("tick_seconds is 0, ticks will run back to back");
        }

        // Malformed zips are left in place; the fetcher rejects them each tick.
        for zip in self.locations.zips().filter(|zip| !is_zip(zip)) {
            tracing::warn!(zip, "location is not a 5 digit zip code");
        }

        Ok(())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = api_key;
    }

    /// Add a location or replace its interval.
    pub fn track(&mut self, zip: &str, every_minutes: NonZeroU32) -> Option<NonZeroU32> {
        self.locations.insert(zip, every_minutes)
    }

    /// Returns true if the location was present.
    pub fn untrack(&mut self, zip: &str) -> bool {
        self.locations.remove(zip).is_some()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nz(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).expect("non-zero")
    }

    #[test]
    fn parses_full_file_with_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            api_key = "KEY"

            [locations]
            "37931" = 15
            "10001" = 30
            "#,
        )
        .expect("config should parse");

        assert_eq!(cfg.api_key, "KEY");
        assert_eq!(cfg.data_dir, PathBuf::from("data"));
        assert_eq!(cfg.duration_minutes, 60);
        assert_eq!(cfg.tick_interval(), Duration::from_secs(60));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.country, "US");
        assert_eq!(cfg.locations.len(), 2);
        assert_eq!(cfg.locations.interval("37931"), Some(nz(15)));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = Config::from_toml_str(
            r#"
            api_key = "KEY"
            [locations]
            "37931" = 0
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, Error::ConfigInvalid(_)));
    }

    #[test]
    fn validate_requires_api_key_and_locations() {
        let mut cfg = Config::default();
        assert!(matches!(cfg.validate(), Err(Error::ConfigMissing(ref m)) if m.contains("api_key")));

        cfg.set_api_key("KEY".into());
        assert!(matches!(cfg.validate(), Err(Error::ConfigMissing(ref m)) if m.contains("locations")));

        cfg.track("37931", nz(10));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn api_key_override_ignores_blank_values() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        cfg.apply_api_key_override(Some("  ".into()));
        assert_eq!(cfg.api_key, "FILE_KEY");

        cfg.apply_api_key_override(None);
        assert_eq!(cfg.api_key, "FILE_KEY");

        cfg.apply_api_key_override(Some("ENV_KEY".into()));
        assert_eq!(cfg.api_key, "ENV_KEY");
    }

    #[test]
    fn track_and_untrack() {
        let mut cfg = Config::default();

        assert_eq!(cfg.track("37931", nz(10)), None);
        assert_eq!(cfg.track("37931", nz(20)), Some(nz(10)));
        assert!(cfg.untrack("37931"));
        assert!(!cfg.untrack("37931"));
    }

    #[test]
    fn missing_file_is_config_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Config::load_from(dir.path().join("nope.toml")).unwrap_err();

        assert!(matches!(err, Error::ConfigMissing(_)));
    }

    #[test]
    fn save_then_load_preserves_locations() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.track("37931", nz(15));
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_or_default(&path).expect("load");
        assert_eq!(loaded.api_key, "KEY");
        assert_eq!(loaded.locations.interval("37931"), Some(nz(15)));
    }

    #[test]
    fn load_or_default_returns_empty_config_for_first_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_or_default(dir.path().join("config.toml")).expect("default");

        assert!(cfg.api_key.is_empty());
        assert!(cfg.locations.is_empty());
    }
}
