use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config [{path}]: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error
    },
    #[error("Could not parse config [{path}]: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error
    },
    #[error("Invalid config value for [{field}]: {reason}")]
    Invalid {
        field: &'static str,
        reason: String
    }
}
