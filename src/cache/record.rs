use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::directory::config_files;
use crate::env::Environment;
use crate::value::Table;

use super::CacheError;

const RECORD_PREFIX: &str = "config_cache_";
const RECORD_EXTENSION: &str = ".json";

/// On-disk cache of a fully merged configuration, one record per environment.
///
/// Records live at `<dir>/config_cache_<env>.json`. The record file's
/// modification time is compared against the source files to decide
/// freshness.
#[derive(Debug, Clone)]
pub struct ConfigCache {
    dir: PathBuf,
    environment: Environment,
}

impl ConfigCache {
    pub fn new(dir: impl AsRef<Path>, environment: Environment) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            environment,
        }
    }

    /// Uses `<cwd>/cache` as the cache directory.
    pub fn in_working_dir(environment: Environment) -> Result<Self, CacheError> {
        let cwd = std::env::current_dir().map_err(CacheError::WorkingDir)?;
        Ok(Self::new(cwd.join("cache"), environment))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn record_path(&self) -> PathBuf {
        self.dir.join(format!(
            "{RECORD_PREFIX}{}{RECORD_EXTENSION}",
            self.environment.name()
        ))
    }

    /// Returns true when the record for the current environment exists and no
    /// config file in `source_dir` (or its environment subdirectory) is newer.
    ///
    /// Always false in development.
    pub fn is_fresh(&self, source_dir: impl AsRef<Path>) -> bool {
        if self.environment.is_development() {
            return false;
        }

        let Some(cached_at) = modified(&self.record_path()) else {
            return false;
        };

        let source_dir = source_dir.as_ref();
        let env_dir = source_dir.join(self.environment.name());
        let mut sources = match config_files(source_dir) {
            Ok(files) => files,
            Err(_) => return false,
        };
        if env_dir.is_dir() {
            match config_files(&env_dir) {
                Ok(files) => sources.extend(files),
                Err(_) => return false,
            }
        }

        sources.iter().all(|file| match modified(file) {
            Some(changed_at) => changed_at <= cached_at,
            None => false,
        })
    }

    /// Writes `table` as the record for the current environment.
    pub fn save(&self, table: &Table) -> Result<(), CacheError> {
        self.ensure_dir()?;
        let path = self.record_path();
        let bytes = serde_json::to_vec_pretty(table).map_err(CacheError::Encode)?;
        fs::write(&path, bytes).map_err(|e| CacheError::Write {
            path: path.clone(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), "saved configuration cache");
        Ok(())
    }

    /// Reads the record for the current environment.
    pub fn load(&self) -> Result<Table, CacheError> {
        let path = self.record_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::Missing(path));
            }
            Err(e) => return Err(CacheError::Read { path, source: e }),
        };
        serde_json::from_slice(&bytes).map_err(|e| CacheError::Malformed { path, source: e })
    }

    /// Removes the records of every environment.
    pub fn clear(&self) -> Result<(), CacheError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(CacheError::Read {
                    path: self.dir.clone(),
                    source: e,
                });
            }
        };

        for entry in entries {
            let path = entry
                .map_err(|e| CacheError::Read {
                    path: self.dir.clone(),
                    source: e,
                })?
                .path();
            if is_record(&path) {
                fs::remove_file(&path).map_err(|e| CacheError::Write {
                    path: path.clone(),
                    source: e,
                })?;
            }
        }
        Ok(())
    }

    fn ensure_dir(&self) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).map_err(|e| CacheError::CreateDir {
            path: self.dir.clone(),
            source: e,
        })
    }
}

fn is_record(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with(RECORD_PREFIX) && name.ends_with(RECORD_EXTENSION))
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
