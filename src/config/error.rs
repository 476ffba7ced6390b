use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("config directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("failed to read '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML config file '{path}': {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to parse JSON config file '{path}': {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("config file '{path}' must define a mapping, found {found}")]
    NotAMapping { path: PathBuf, found: &'static str },

    #[error("config file '{path}' has unsupported extension (allowed: {allowed})")]
    UnsupportedExtension { path: PathBuf, allowed: String },

    #[error("config file '{path}' is outside the trusted root '{root}'")]
    OutsideTrustedRoot { path: PathBuf, root: PathBuf },
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("config key '{key}' at '{parent}' cannot contain dots")]
    DottedKey { key: String, parent: String },

    #[error("empty config key at '{parent}'")]
    EmptyKey { parent: String },

    #[error("config value at '{path}' is not a finite number")]
    NonFiniteFloat { path: String },

    #[error("invalid environment variable key '{0}': expected A-Z and '_' only")]
    InvalidEnvKey(String),
}
