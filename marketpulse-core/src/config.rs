use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::Path;
use url::Url;

use crate::error::ConfigError;

/// Endpoint of the keyword search engine. Absence is startup-fatal.
pub const SEARCH_URL_VAR: &str = "MARKETPULSE_SEARCH_URL";
/// Endpoint of the stock price provider. Optional.
pub const PRICE_URL_VAR: &str = "MARKETPULSE_PRICE_URL";
/// Optional path to a TOML configuration file overriding the environment.
pub const CONFIG_FILE_VAR: &str = "MARKETPULSE_CONFIG";
/// Worker cap for the comment fan-out. Optional.
pub const FANOUT_WORKERS_VAR: &str = "MARKETPULSE_FANOUT_WORKERS";

pub const DEFAULT_PRICE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_TOP_K: usize = 100;
/// Per-post cap on fetched comments during fan-out.
pub const COMMENT_FETCH_CAP: usize = 100;

fn default_price_url() -> String {
    DEFAULT_PRICE_URL.to_string()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub search_url: String,

    #[serde(default = "default_price_url")]
    pub price_url: String,

    /// Explicit fan-out worker cap. When unset, the host's available
    /// parallelism is used.
    #[serde(default)]
    pub fanout_workers: Option<usize>,

    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl AppConfig {
    /// Load configuration from `MARKETPULSE_CONFIG` (a TOML file) when set,
    /// otherwise from individual environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_FILE_VAR) {
            Ok(path) => Self::from_file(Path::new(&path)),
            Err(_) => Self::from_env(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let search_url =
            std::env::var(SEARCH_URL_VAR).map_err(|_| ConfigError::MissingEnvironmentVariable {
                var_name: SEARCH_URL_VAR.to_string(),
            })?;

        let price_url = std::env::var(PRICE_URL_VAR).unwrap_or_else(|_| default_price_url());

        let fanout_workers = match std::env::var(FANOUT_WORKERS_VAR) {
            Ok(raw) => Some(raw.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                field: FANOUT_WORKERS_VAR.to_string(),
                value: raw.clone(),
            })?),
            Err(_) => None,
        };

        let config = Self {
            search_url,
            price_url,
            fanout_workers,
            top_k: DEFAULT_TOP_K,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.search_url).map_err(|_| ConfigError::InvalidValue {
            field: "search_url".to_string(),
            value: self.search_url.clone(),
        })?;
        Url::parse(&self.price_url).map_err(|_| ConfigError::InvalidValue {
            field: "price_url".to_string(),
            value: self.price_url.clone(),
        })?;
        if self.fanout_workers == Some(0) {
            return Err(ConfigError::ValidationFailed {
                reason: "fanout_workers must be at least 1".to_string(),
            });
        }
        if self.top_k == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "top_k must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Effective fan-out worker count: the configured cap, or the host's
    /// available parallelism.
    pub fn fanout_workers(&self) -> usize {
        self.fanout_workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(4)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            search_url: "http://localhost:7700".to_string(),
            price_url: DEFAULT_PRICE_URL.to_string(),
            fanout_workers: None,
            top_k: DEFAULT_TOP_K,
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = valid_config();
        config.search_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = valid_config();
        config.fanout_workers = Some(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn test_from_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            search_url = "http://localhost:7700"
            fanout_workers = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.price_url, DEFAULT_PRICE_URL);
        assert_eq!(config.fanout_workers, Some(8));
        assert_eq!(config.top_k, DEFAULT_TOP_K);
        assert_eq!(config.fanout_workers(), 8);
    }

    #[test]
    fn test_missing_search_url_env() {
        std::env::remove_var(SEARCH_URL_VAR);
        assert!(matches!(
            AppConfig::from_env(),
            Err(ConfigError::MissingEnvironmentVariable { .. })
        ));
    }
}
