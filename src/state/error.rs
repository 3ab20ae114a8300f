use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::errors::ApiError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to initialize HTTP client: {0}")]
    HttpClient(#[source] ApiError),
}
