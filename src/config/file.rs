//! Single-file configuration loading.

use std::path::{Path, PathBuf};

use crate::value::{table_from_toml, Table, Value};

use super::LoadError;

/// Formats a configuration file can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    pub const EXTENSIONS: [&'static str; 2] = ["toml", "json"];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Loads one configuration file into a table.
///
/// The format is chosen from the file extension. A JSON file whose top-level
/// value is not an object fails with [`LoadError::NotAMapping`].
pub fn load_file(path: &Path) -> Result<Table, LoadError> {
    let format = Format::from_path(path).ok_or_else(|| LoadError::UnsupportedExtension {
        path: path.to_path_buf(),
        allowed: Format::EXTENSIONS.join(", "),
    })?;

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(LoadError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    tracing::debug!(path = %path.display(), ?format, "loading config file");
    parse(&contents, format, path)
}

fn parse(contents: &str, format: Format, path: &Path) -> Result<Table, LoadError> {
    match format {
        Format::Toml => {
            let table: toml::Table = toml::from_str(contents).map_err(|e| LoadError::TomlParse {
                path: path.to_path_buf(),
                source: e,
            })?;
            Ok(table_from_toml(table))
        }
        Format::Json => {
            let json: serde_json::Value =
                serde_json::from_str(contents).map_err(|e| LoadError::JsonParse {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            match Value::from(json) {
                Value::Table(table) => Ok(table),
                other => Err(LoadError::NotAMapping {
                    path: path.to_path_buf(),
                    found: other.type_name(),
                }),
            }
        }
    }
}

/// A loader that only reads files below a trusted root directory with a
/// whitelisted extension.
///
/// Paths are canonicalized before the root check, so `..` components and
/// symlinks pointing outside the root are rejected.
#[derive(Debug, Clone)]
pub struct TrustedLoader {
    root: PathBuf,
    extensions: Vec<String>,
}

impl TrustedLoader {
    /// Creates a loader rooted at `root`, accepting every supported format.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::with_extensions(root, Format::EXTENSIONS)
    }

    /// Creates a loader rooted at `root` that accepts only `extensions`.
    ///
    /// An empty whitelist rejects every file.
    pub fn with_extensions<I, S>(root: impl AsRef<Path>, extensions: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let root = canonicalize(root.as_ref(), true)?;
        Ok(Self {
            root,
            extensions: extensions.into_iter().map(Into::into).collect(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<Table, LoadError> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !self.extensions.iter().any(|allowed| allowed == ext) {
            return Err(LoadError::UnsupportedExtension {
                path: path.to_path_buf(),
                allowed: self.extensions.join(", "),
            });
        }

        let real = canonicalize(path, false)?;
        if !real.starts_with(&self.root) {
            return Err(LoadError::OutsideTrustedRoot {
                path: path.to_path_buf(),
                root: self.root.clone(),
            });
        }

        load_file(&real)
    }
}

fn canonicalize(path: &Path, is_dir: bool) -> Result<PathBuf, LoadError> {
    path.canonicalize().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound if is_dir => LoadError::DirectoryNotFound(path.to_path_buf()),
        std::io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
        _ => LoadError::ReadError {
            path: path.to_path_buf(),
            source: e,
        },
    })
}
