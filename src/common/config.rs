//! Configuration for swfs-client

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Master base URL
    #[serde(default = "default_master_url")]
    pub master_url: String,

    /// Maximum payload accepted on upload (bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Lifetime of a cached volume location
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Period of the background sweep over expired locations
    #[serde(default = "default_cache_sweep_interval")]
    pub cache_sweep_interval_secs: u64,

    /// Per-request timeout of the HTTP transport
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_master_url() -> String {
    "http://localhost:9333".to_string()
}
fn default_max_file_size() -> u64 {
    256 * 1024 * 1024
}
fn default_cache_ttl() -> u64 {
    5 * 60
}
fn default_cache_sweep_interval() -> u64 {
    10 * 60
}
fn default_request_timeout() -> u64 {
    5 * 60
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            master_url: default_master_url(),
            max_file_size: default_max_file_size(),
            cache_ttl_secs: default_cache_ttl(),
            cache_sweep_interval_secs: default_cache_sweep_interval(),
            request_timeout_secs: default_request_timeout(),
            log_level: default_log_level(),
        }
    }
}

impl ClientConfig {
    pub fn new(master_url: impl Into<String>) -> Self {
        Self {
            master_url: master_url.into(),
            ..Default::default()
        }
    }

    /// Load from an optional TOML file, then `SWFS_*` environment variables
    /// (e.g. `SWFS_MASTER_URL`, `SWFS_MAX_FILE_SIZE`).
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let config: Self = builder
            .add_source(config::Environment::with_prefix("SWFS").try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        url::Url::parse(&self.master_url).map_err(|e| {
            crate::Error::InvalidConfig(format!("master_url {:?}: {}", self.master_url, e))
        })?;
        if self.max_file_size == 0 {
            return Err(crate::Error::InvalidConfig(
                "max_file_size must be positive".into(),
            ));
        }
        if self.cache_ttl_secs == 0 || self.cache_sweep_interval_secs == 0 {
            return Err(crate::Error::InvalidConfig(
                "cache ttl and sweep interval must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn cache(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_secs(self.cache_ttl_secs),
            sweep_interval: Duration::from_secs(self.cache_sweep_interval_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Expiry settings of the volume location cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Time after which an entry is no longer returned
    pub ttl: Duration,
    /// How often expired entries are dropped in the background
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(default_cache_ttl()),
            sweep_interval: Duration::from_secs(default_cache_sweep_interval()),
        }
    }
}
