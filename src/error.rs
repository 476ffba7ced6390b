use crate::cache::CacheError;
use crate::config::{LoadError, ValidationError};
use thiserror::Error;

/// Top-level error type for the layercfg library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration load error: {0}")]
    Load(#[from] LoadError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("configuration cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("configuration already initialized with a different mapping")]
    ConfigurationMismatch,

    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] serde_json::Error),
}
