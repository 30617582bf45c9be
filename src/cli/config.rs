//! Configuration management for sdgprogress
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.sdgprogress/config.toml

use crate::cache::SeriesCache;
use crate::catalog::{countries::preset_members, IndicatorCatalog};
use crate::errors::{MonitorError, Result};
use crate::fetch::{un_sdg, RetryManager, SourceRouter, UnSdgClient, WorldBankClient};
use crate::types::{CountryCode, DataSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Earliest accepted baseline policy year
const MIN_BASELINE_YEAR: i32 = 1960;

/// Latest accepted baseline policy year
const MAX_BASELINE_YEAR: i32 = 2100;

/// Complete configuration for sdgprogress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub un_sdg: UnSdgConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub progress: ProgressConfig,
    pub selection: SelectionConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

/// Remote API connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub per_page: u32,
    pub max_pages: u32,
}

/// UN SDG Global Database endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnSdgConfig {
    pub api_url: String,
    pub sdmx_url: String,
    pub countries_url: String,
    pub timeout_secs: u64,
}

/// Retry policy for transient failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

/// Series cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

/// Evaluation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub baseline_year: i32,
    pub max_parallel_fetches: usize,
}

/// Default country selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub focus_country: String,
    pub preset: Option<String>,
}

/// Indicator catalogue source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalogue TOML file; the built-in seed is used when unset
    pub path: Option<String>,
}

/// Log output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: crate::fetch::client::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            per_page: 20_000,
            max_pages: 50,
        }
    }
}

impl Default for UnSdgConfig {
    fn default() -> Self {
        Self {
            api_url: un_sdg::DEFAULT_API_URL.to_string(),
            sdmx_url: un_sdg::DEFAULT_SDMX_URL.to_string(),
            countries_url: un_sdg::DEFAULT_COUNTRIES_URL.to_string(),
            timeout_secs: 40,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 600,
            max_delay_ms: 5_000,
            jitter: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 3600 }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            baseline_year: 2015,
            max_parallel_fetches: 4,
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            focus_country: "IND".to_string(),
            preset: Some("SAARC".to_string()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(config_path) => Self::load_from_file(config_path),
            None => Self::load_default(),
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MonitorError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config = Self::from_toml(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration without validating it
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| MonitorError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// `~/.sdgprogress/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".sdgprogress").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(MonitorError::ConfigError("base_url must not be empty".to_string()));
        }

        if self.api.timeout_secs == 0 {
            return Err(MonitorError::ConfigError(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        let un = &self.un_sdg;
        if [&un.api_url, &un.sdmx_url, &un.countries_url]
            .iter()
            .any(|url| url.trim().is_empty())
        {
            return Err(MonitorError::ConfigError("un_sdg URLs must not be empty".to_string()));
        }

        if un.timeout_secs == 0 {
            return Err(MonitorError::ConfigError(
                "un_sdg timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.api.per_page == 0 || self.api.max_pages == 0 {
            return Err(MonitorError::ConfigError(
                "per_page and max_pages must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(MonitorError::ConfigError(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(MonitorError::ConfigError(
                "base_delay_ms must not exceed max_delay_ms".to_string(),
            ));
        }

        if self.cache.ttl_secs == 0 {
            return Err(MonitorError::ConfigError("ttl_secs must be greater than 0".to_string()));
        }

        if !(MIN_BASELINE_YEAR..=MAX_BASELINE_YEAR).contains(&self.progress.baseline_year) {
            return Err(MonitorError::ConfigError(format!(
                "baseline_year must be between {} and {}",
                MIN_BASELINE_YEAR, MAX_BASELINE_YEAR
            )));
        }

        if self.progress.max_parallel_fetches == 0 {
            return Err(MonitorError::ConfigError(
                "max_parallel_fetches must be at least 1".to_string(),
            ));
        }

        CountryCode::new(&self.selection.focus_country)?;
        if let Some(preset) = &self.selection.preset {
            preset_members(preset)?;
        }

        match self.logging.level.to_ascii_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(MonitorError::ConfigError(format!(
                    "Invalid log level: {}",
                    self.logging.level
                )))
            }
        }

        Ok(())
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| MonitorError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Focus country as a validated code
    pub fn focus_country(&self) -> Result<CountryCode> {
        CountryCode::new(&self.selection.focus_country)
    }

    /// Retry policy from the `[retry]` section
    pub fn retry_manager(&self) -> RetryManager {
        RetryManager::with_config(self.retry.max_attempts, self.retry.base_delay_ms)
            .with_max_delay(self.retry.max_delay_ms)
            .with_jitter(self.retry.jitter)
    }

    /// HTTP client from the `[api]` and `[retry]` sections
    pub fn client(&self) -> Result<WorldBankClient> {
        let client = WorldBankClient::with_config(
            &self.api.base_url,
            Duration::from_secs(self.api.timeout_secs),
            self.retry_manager(),
        )?;
        Ok(client.with_paging(self.api.per_page, self.api.max_pages))
    }

    /// UN SDG client from the `[un_sdg]` and `[retry]` sections
    pub fn un_client(&self) -> Result<UnSdgClient> {
        let client = UnSdgClient::with_config(
            &self.un_sdg.api_url,
            Duration::from_secs(self.un_sdg.timeout_secs),
            self.retry_manager(),
        )?;
        Ok(client
            .with_sdmx_url(&self.un_sdg.sdmx_url)
            .with_countries_url(&self.un_sdg.countries_url))
    }

    /// Series source routing each indicator to its API
    pub fn source(&self) -> Result<SourceRouter> {
        Ok(SourceRouter::new()
            .route(DataSource::WorldBank, Arc::new(self.client()?))
            .route(DataSource::UnSdg, Arc::new(self.un_client()?)))
    }

    /// Shared cache with the configured TTL
    pub fn cache(&self) -> Arc<SeriesCache> {
        Arc::new(SeriesCache::with_clock(
            Duration::from_secs(self.cache.ttl_secs),
            Arc::new(crate::cache::SystemClock),
        ))
    }

    /// Catalogue from the configured file, or the built-in seed
    pub fn catalog(&self) -> Result<IndicatorCatalog> {
        let path = self.catalog.path.as_deref().map(Self::expand_path);
        IndicatorCatalog::load_or_builtin(path.as_deref())
    }
}
