use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::actors::retention::{
    DEFAULT_RETENTION_MINUTES, DEFAULT_SWEEP_INTERVAL_MINUTES, RetentionSettings,
};
use crate::liveness::{DEFAULT_STALE_THRESHOLD_SECS, LivenessSettings};
use crate::storage::{MemoryBackend, StorageBackend, StorageError};
use crate::store::StoreSettings;

/// Storage backend configuration
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    #[serde(rename = "none")]
    None,

    /// SQLite database (default for most deployments)
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

impl StorageConfig {
    /// Open the configured backend
    pub async fn open(&self) -> anyhow::Result<Arc<dyn StorageBackend>> {
        match self {
            StorageConfig::None => {
                debug!("using in-memory storage");
                Ok(Arc::new(MemoryBackend::new()))
            }
            StorageConfig::Sqlite { path } if path.as_os_str().is_empty() => Err(
                StorageError::InvalidConfig("sqlite storage needs a non-empty path".to_string())
                    .into(),
            ),
            #[cfg(feature = "storage-sqlite")]
            StorageConfig::Sqlite { path } => {
                debug!("using sqlite storage at {}", path.display());
                let backend = crate::storage::sqlite::SqliteBackend::new(path).await?;
                Ok(Arc::new(backend))
            }
            #[cfg(not(feature = "storage-sqlite"))]
            StorageConfig::Sqlite { .. } => Err(StorageError::InvalidConfig(
                "sqlite storage requested but the storage-sqlite feature is disabled".to_string(),
            )
            .into()),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./components.db")
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_stale_threshold_secs() -> i64 {
    DEFAULT_STALE_THRESHOLD_SECS
}

fn default_retention_minutes() -> i64 {
    DEFAULT_RETENTION_MINUTES
}

fn default_sweep_interval_minutes() -> u64 {
    DEFAULT_SWEEP_INTERVAL_MINUTES
}

fn default_header_sample_size() -> usize {
    100
}

fn default_max_page_size() -> usize {
    1000
}

/// Hub configuration
///
/// Every field has a default, so an empty object is a valid config.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Config {
    /// API listen address
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    #[serde(default = "default_true")]
    pub enable_cors: bool,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub storage: StorageConfig,

    /// TTL for components that do not carry their own
    #[serde(default = "default_stale_threshold_secs")]
    pub stale_threshold_secs: i64,

    /// Components not written for this long are deleted; `<= 0` disables
    #[serde(default = "default_retention_minutes")]
    pub retention_minutes: i64,

    #[serde(default = "default_sweep_interval_minutes")]
    pub sweep_interval_minutes: u64,

    /// Reject reports without `Id` or `Name`
    #[serde(default)]
    pub require_natural_key: bool,

    #[serde(default = "default_header_sample_size")]
    pub header_sample_size: usize,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            enable_cors: true,
            request_timeout_secs: default_request_timeout_secs(),
            storage: StorageConfig::default(),
            stale_threshold_secs: default_stale_threshold_secs(),
            retention_minutes: default_retention_minutes(),
            sweep_interval_minutes: default_sweep_interval_minutes(),
            require_natural_key: false,
            header_sample_size: default_header_sample_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl Config {
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            liveness: LivenessSettings::from_secs(self.stale_threshold_secs),
            require_natural_key: self.require_natural_key,
            header_sample_size: self.header_sample_size.max(1),
            max_page_size: self.max_page_size.max(1),
        }
    }

    pub fn retention_settings(&self) -> RetentionSettings {
        RetentionSettings {
            threshold_minutes: self.retention_minutes,
            interval: Duration::from_secs(self.sweep_interval_minutes.max(1) * 60),
        }
    }
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
