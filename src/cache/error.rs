use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
    #[error("cache directory '{path}' could not be created: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write cache file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read cache file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cache file does not exist: {0}")]
    Missing(PathBuf),

    #[error("invalid cache data in '{path}': {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to encode cache payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("could not determine working directory: {0}")]
    WorkingDir(#[source] std::io::Error),
}
