//! Pagination Store Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Upper bound applied to `ttl_secs` (one hundred years)
const MAX_TTL_SECS: i64 = 100 * 365 * 24 * 60 * 60;

/// Token lifetime, sweep cadence and token prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Seconds a token stays resolvable after issue (default: 3600)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Seconds between background sweeps (default: 60)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Prefix on every issued token (default: "qt_")
    #[serde(default = "default_token_prefix")]
    pub token_prefix: String,
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_token_prefix() -> String {
    "qt_".to_string()
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            token_prefix: default_token_prefix(),
        }
    }
}

impl PaginationConfig {
    pub fn with_ttl_secs(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            ..Default::default()
        }
    }

    pub fn ttl(&self) -> chrono::Duration {
        let secs = i64::try_from(self.ttl_secs).unwrap_or(MAX_TTL_SECS);
        chrono::Duration::seconds(secs.min(MAX_TTL_SECS))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
