use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::ConfigError;

//NOTE: moka panics when the idle timeout exceeds 1000 years.
pub const MAX_SESSION_IDLE_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Runtime settings for the ledger. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// JSON document holding the `accounts` and `transactions` records.
    pub data_file: PathBuf,
    /// Largest amount a single transfer may move.
    pub transfer_limit: Decimal,
    pub session_idle_timeout_secs: u64,
    pub session_capacity: u64,
    /// Number of entries shown on the dashboard.
    pub recent_limit: usize,
    pub log_level: String
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("omsin-ledger.json"),
            transfer_limit: Decimal::new(10_000, 0),
            session_idle_timeout_secs: 15 * 60,
            session_capacity: 1_024,
            recent_limit: 5,
            log_level: "warn".to_string()
        }
    }
}

impl LedgerConfig {
    /// Reads the config at `path`, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source
        })?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transfer_limit <= Decimal::ZERO {
            return Err(ConfigError::Invalid {
                field: "transfer_limit",
                reason: format!("must be positive, got {}", self.transfer_limit)
            });
        }

        if self.session_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "session_capacity",
                reason: "must be at least 1".to_string()
            });
        }

        if self.session_idle_timeout_secs == 0 || self.session_idle_timeout_secs > MAX_SESSION_IDLE_TIMEOUT_SECS {
            return Err(ConfigError::Invalid {
                field: "session_idle_timeout_secs",
                reason: format!("must be between 1 and {MAX_SESSION_IDLE_TIMEOUT_SECS}, got {}", self.session_idle_timeout_secs)
            });
        }

        Ok(())
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_timeout_secs)
    }
}
