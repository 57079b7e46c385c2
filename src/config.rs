//! Application configuration.
//!
//! Layered: built-in defaults, then an optional config file, then
//! `MAILNAV_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use cache_coordinator::CoordinatorPolicy;
use practice_cache::CachePolicy;
use practice_scraper::DetailScrapeConfig;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Admin-system origin, e.g. `https://admin.example`.
    pub base_url: String,
    /// Where the persisted cache mirror lives. Defaults to the platform
    /// data directory when unset.
    pub cache_file: Option<PathBuf>,
    pub refresh_interval_secs: u64,
    pub wait_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub expiry_hours: u64,
    pub refresh_after_hours: u64,
    pub treat_name_echo_as_invalid: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "https://admin.example".to_string(),
            cache_file: None,
            refresh_interval_secs: 6 * 60 * 60,
            wait_timeout_ms: 18_000,
            poll_interval_ms: 600,
            expiry_hours: 24,
            refresh_after_hours: 12,
            treat_name_echo_as_invalid: true,
        }
    }
}

impl AppConfig {
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let defaults = AppConfig::default();
        let mut builder = config::Config::builder()
            .set_default("base_url", defaults.base_url.as_str())?
            .set_default("refresh_interval_secs", defaults.refresh_interval_secs)?
            .set_default("wait_timeout_ms", defaults.wait_timeout_ms)?
            .set_default("poll_interval_ms", defaults.poll_interval_ms)?
            .set_default("expiry_hours", defaults.expiry_hours)?
            .set_default("refresh_after_hours", defaults.refresh_after_hours)?
            .set_default(
                "treat_name_echo_as_invalid",
                defaults.treat_name_echo_as_invalid,
            )?;
        if let Some(path) = config_file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(config::Environment::with_prefix("MAILNAV"))
            .build()
            .context("failed to assemble configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    pub fn cache_file_or_default(&self) -> Result<PathBuf> {
        if let Some(path) = &self.cache_file {
            return Ok(path.clone());
        }
        let mut path = dirs::data_dir().context("no platform data directory")?;
        path.push("mailnav");
        path.push("practice-cache.json");
        Ok(path)
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            expiry_ms: self.expiry_hours * 60 * 60 * 1000,
            refresh_after_ms: self.refresh_after_hours * 60 * 60 * 1000,
        }
    }

    pub fn coordinator_policy(&self) -> CoordinatorPolicy {
        let mut policy = CoordinatorPolicy {
            base_url: self.base_url.clone(),
            refresh_interval_secs: self.refresh_interval_secs,
            detail: DetailScrapeConfig {
                treat_name_echo_as_invalid: self.treat_name_echo_as_invalid,
            },
            ..CoordinatorPolicy::default()
        };
        policy.wait.wait_timeout_ms = self.wait_timeout_ms;
        policy.wait.poll_interval_ms = self.poll_interval_ms;
        policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn defaults_map_onto_policies() {
        let config = AppConfig::default();
        let cache = config.cache_policy();
        assert_eq!(cache.expiry_ms, 24 * 60 * 60 * 1000);
        assert_eq!(cache.refresh_after_ms, 12 * 60 * 60 * 1000);
        let coordinator = config.coordinator_policy();
        assert_eq!(coordinator.wait.wait_timeout_ms, 18_000);
        assert!(coordinator.detail.treat_name_echo_as_invalid);
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("tempfile");
        write!(
            file,
            r#"{{"base_url": "https://admin.test", "expiry_hours": 48}}"#
        )
        .expect("write config");

        let config = AppConfig::load(Some(file.path())).expect("load");
        assert_eq!(config.base_url, "https://admin.test");
        assert_eq!(config.expiry_hours, 48);
        assert_eq!(config.refresh_after_hours, 12, "untouched keys keep defaults");
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/mailnav.json")));
        assert!(result.is_err());
    }
}
