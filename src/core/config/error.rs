use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for environment variable {key}: {value:?}")]
    InvalidEnv { key: String, value: String },

    #[error("Invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
