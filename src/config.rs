use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{RecruitError, Result};
use crate::utils::normalize_name;

pub const DEFAULT_API_URL: &str = "https://www.nationstates.net/cgi-bin/api.cgi";

/// Hard ceiling published by the API: 50 requests per 30 seconds.
pub const MAX_REQUEST_RATE: u32 = 50;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub user_agent: String,
    pub region: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Requests allowed per rolling 30 second window
    #[serde(default = "default_request_rate")]
    pub request_rate: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_rate() -> u32 {
    30
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_concurrency() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_rate: default_request_rate(),
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus `M0USE_*` environment
    /// variables (nested keys use `__`, e.g. `M0USE_API__REQUEST_RATE`).
    pub fn load(path: &str) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::from(Path::new(path)).required(false))
            .add_source(
                config::Environment::with_prefix("M0USE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and ranges, normalizing names in place.
    pub fn validate(&mut self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            return Err(RecruitError::Config("user_agent not set".to_string()));
        }

        if self.region.trim().is_empty() {
            return Err(RecruitError::Config("region not set".to_string()));
        }
        self.region = normalize_name(&self.region);

        if !(1..=MAX_REQUEST_RATE).contains(&self.api.request_rate) {
            return Err(RecruitError::Config(format!(
                "api.request_rate must be between 1 and {}, got {}",
                MAX_REQUEST_RATE, self.api.request_rate
            )));
        }

        if self.api.concurrency == 0 || self.api.concurrency > self.api.request_rate as usize {
            return Err(RecruitError::Config(format!(
                "api.concurrency must be between 1 and api.request_rate ({}), got {}",
                self.api.request_rate, self.api.concurrency
            )));
        }

        self.api.base_url = self.api.base_url.trim_end_matches('/').to_string();

        self.log.level = self.log.level.to_lowercase();
        if !["debug", "info", "warn", "error"].contains(&self.log.level.as_str()) {
            self.log.level = default_log_level();
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base_config() -> Config {
        Config {
            user_agent: "m0use test suite".to_string(),
            region: "The Europeian Union".to_string(),
            api: ApiConfig::default(),
            log: LogConfig::default(),
        }
    }

    #[test]
    fn load_reads_toml_file_and_applies_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "user_agent = \"Testlandia\"\nregion = \"Lazarus\"\n\n[api]\nrequest_rate = 40\n\n[log]\nlevel = \"DEBUG\""
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.user_agent, "Testlandia");
        assert_eq!(config.region, "lazarus");
        assert_eq!(config.api.request_rate, 40);
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.api.concurrency, 1);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn validate_normalizes_region() {
        let mut config = base_config();
        config.validate().unwrap();
        assert_eq!(config.region, "the_europeian_union");
    }

    #[test]
    fn validate_rejects_missing_user_agent() {
        let mut config = base_config();
        config.user_agent = "  ".to_string();
        assert!(matches!(config.validate(), Err(RecruitError::Config(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_rate() {
        let mut config = base_config();
        config.api.request_rate = 0;
        assert!(config.validate().is_err());

        config.api.request_rate = MAX_REQUEST_RATE + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_more_workers_than_requests_per_window() {
        let mut config = base_config();
        config.api.request_rate = 10;
        config.api.concurrency = 10;
        config.validate().unwrap();

        config.api.concurrency = 11;
        assert!(matches!(config.validate(), Err(RecruitError::Config(_))));
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let mut config = base_config();
        config.log.level = "verbose".to_string();
        config.validate().unwrap();
        assert_eq!(config.log.level, "info");
    }
}
