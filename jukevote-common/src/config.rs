//! Engine configuration loading
//!
//! Resolution priority follows the usual ladder: explicit path (CLI) >
//! `JUKEVOTE_CONFIG` environment variable > platform config directory.
//! A missing or unreadable file logs a warning and falls back to compiled
//! defaults; it never prevents startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

/// Environment variable naming a config file location
pub const CONFIG_ENV_VAR: &str = "JUKEVOTE_CONFIG";

/// Engine-wide tunables (per-session policy lives in `VotingSettings`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// HTTP/WebSocket listen port
    pub port: u16,
    /// Seconds between priority resort sweeps
    pub resort_interval_secs: u64,
    /// Seconds between metrics aggregation sweeps
    pub metrics_interval_secs: u64,
    /// Entries returned by `get_playlist`
    pub playlist_limit: usize,
    /// Pending entries in the operator "upcoming" view
    pub upcoming_limit: usize,
    /// DJ notification ring capacity per session
    pub notification_cap: usize,
    /// Wallet balance for listeners that join without one
    pub default_wallet_balance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            port: 5750,
            resort_interval_secs: 30,
            metrics_interval_secs: 60,
            playlist_limit: 20,
            upcoming_limit: 10,
            notification_cap: 50,
            default_wallet_balance: 50.0,
        }
    }
}

impl EngineConfig {
    /// Load configuration, falling back to defaults on any problem
    pub fn load(explicit: Option<&Path>) -> Self {
        let Some(path) = Self::resolve_path(explicit) else {
            return Self::default();
        };
        if !path.exists() {
            warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            );
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config {}: {} (using compiled defaults)",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Parse and validate a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Config path priority: explicit > env var > platform config dir
    fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|d| d.join("jukevote").join("config.toml"))
    }

    fn validate(&self) -> Result<()> {
        if self.resort_interval_secs == 0 || self.metrics_interval_secs == 0 {
            return Err(Error::Config(
                "reconciler intervals must be at least 1 second".to_string(),
            ));
        }
        if self.playlist_limit == 0 || self.upcoming_limit == 0 {
            return Err(Error::Config(
                "playlist and upcoming limits must be at least 1".to_string(),
            ));
        }
        if self.notification_cap == 0 {
            return Err(Error::Config(
                "notification cap must be at least 1".to_string(),
            ));
        }
        if self.default_wallet_balance < 0.0 {
            return Err(Error::Config(
                "default wallet balance must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.port, 5750);
        assert_eq!(config.resort_interval_secs, 30);
        assert_eq!(config.notification_cap, 50);
        assert_eq!(config.default_wallet_balance, 50.0);
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_keys() {
        let config: EngineConfig = toml::from_str("port = 9000").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.playlist_limit, 20);
        assert_eq!(config.upcoming_limit, 10);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config: EngineConfig = toml::from_str("resort_interval_secs = 0").unwrap();
        assert!(config.validate().is_err());
    }
}
