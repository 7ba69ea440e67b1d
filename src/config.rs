//! Service configuration
//!
//! One JSON file, e.g.:
//!
//! ```json
//! {
//!   "mapping_path": "mapping.json",
//!   "database_path": "orders.db",
//!   "default_limit": 10,
//!   "max_limit": 1000,
//!   "pagination": { "ttl_secs": 3600, "sweep_interval_secs": 60 },
//!   "http": { "port": 8080 }
//! }
//! ```
//!
//! Relative paths resolve against the config file's directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_server::HttpServerConfig;
use crate::pagination::PaginationConfig;
use crate::plan::QueryLimits;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON in '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Mapping registry file (required)
    pub mapping_path: PathBuf,

    /// SQLite database file; ":memory:" for a private in-memory database
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Limit applied when a plan has none (default: 10)
    #[serde(default = "default_limit")]
    pub default_limit: u64,

    /// Global limit ceiling (default: 1000)
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,

    #[serde(default)]
    pub pagination: PaginationConfig,

    #[serde(default)]
    pub http: HttpServerConfig,

    /// Directory relative paths resolve against; set by `load`
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

fn default_database_path() -> PathBuf {
    PathBuf::from(":memory:")
}

fn default_limit() -> u64 {
    10
}

fn default_max_limit() -> u64 {
    1000
}

impl ServiceConfig {
    pub fn new(mapping_path: impl Into<PathBuf>) -> Self {
        Self {
            mapping_path: mapping_path.into(),
            database_path: default_database_path(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            pagination: PaginationConfig::default(),
            http: HttpServerConfig::default(),
            base_dir: None,
        }
    }

    /// Load and validate configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut config: ServiceConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.base_dir = path.parent().map(Path::to_path_buf);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.mapping_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("mapping_path must not be empty".into()));
        }
        if self.default_limit == 0 {
            return Err(ConfigError::Invalid("default_limit must be > 0".into()));
        }
        if self.default_limit > self.max_limit {
            return Err(ConfigError::Invalid(format!(
                "default_limit ({}) exceeds max_limit ({})",
                self.default_limit, self.max_limit
            )));
        }
        if self.pagination.ttl_secs == 0 {
            return Err(ConfigError::Invalid("pagination.ttl_secs must be > 0".into()));
        }
        if self.pagination.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "pagination.sweep_interval_secs must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub fn limits(&self) -> QueryLimits {
        QueryLimits {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
        }
    }

    pub fn mapping_file(&self) -> PathBuf {
        self.resolve(&self.mapping_path)
    }

    pub fn database_file(&self) -> PathBuf {
        if self.database_path.as_os_str() == ":memory:" {
            return self.database_path.clone();
        }
        self.resolve(&self.database_path)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
