//! Directory scanning and environment override merging.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::env::Environment;
use crate::value::{Table, Value};
use crate::Error;

use super::file::{Format, TrustedLoader};
use super::merge::deep_merge;
use super::validate::validate;
use super::LoadError;

/// Loads every configuration file in a directory into one table keyed by
/// file stem.
///
/// For environment `production` and directory `config/`:
///
/// | file                           | key   | role                       |
/// |--------------------------------|-------|----------------------------|
/// | `config/app.toml`              | `app` | base                       |
/// | `config/app.production.toml`   | `app` | override, applied second   |
/// | `config/app.staging.toml`      | -     | skipped                    |
/// | `config/production/app.toml`   | `app` | override, applied last     |
///
/// Overrides are deep-merged onto the base table. Subdirectories other than
/// the environment's are ignored. Files are read through a [`TrustedLoader`]
/// rooted at the directory, so a symlink resolving outside it fails the load.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    dir: PathBuf,
    environment: Environment,
}

#[derive(Debug, Default)]
struct Layers {
    base: Vec<Table>,
    suffixed: Vec<Table>,
    subdir: Vec<Table>,
}

impl DirectoryLoader {
    pub fn new(dir: impl AsRef<Path>, environment: Environment) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            environment,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The override subdirectory for the current environment.
    pub fn environment_dir(&self) -> PathBuf {
        self.dir.join(self.environment.name())
    }

    /// Loads and merges the directory. Any failure aborts the whole load.
    pub fn load(&self) -> Result<Table, Error> {
        if !self.dir.is_dir() {
            return Err(LoadError::DirectoryNotFound(self.dir.clone()).into());
        }

        let loader = TrustedLoader::new(&self.dir)?;
        let mut layers: BTreeMap<String, Layers> = BTreeMap::new();

        for path in config_files(&self.dir)? {
            let Some(stem) = file_stem(&path) else {
                continue;
            };
            match stem.split_once('.') {
                None => {
                    let table = load_validated(&loader, &path)?;
                    layers.entry(stem.to_string()).or_default().base.push(table);
                }
                Some((name, env)) if env == self.environment.name() => {
                    let table = load_validated(&loader, &path)?;
                    layers.entry(name.to_string()).or_default().suffixed.push(table);
                }
                Some(_) => {
                    tracing::debug!(path = %path.display(), "skipping file for another environment");
                }
            }
        }

        let env_dir = self.environment_dir();
        if env_dir.is_dir() {
            for path in config_files(&env_dir)? {
                let Some(stem) = file_stem(&path) else {
                    continue;
                };
                if stem.contains('.') {
                    tracing::debug!(path = %path.display(), "skipping dotted file in environment directory");
                    continue;
                }
                let table = load_validated(&loader, &path)?;
                layers.entry(stem.to_string()).or_default().subdir.push(table);
            }
        }

        let items = layers
            .into_iter()
            .map(|(key, layers)| {
                let mut merged = Table::new();
                for table in layers.base.into_iter().chain(layers.suffixed).chain(layers.subdir) {
                    deep_merge(&mut merged, table);
                }
                (key, Value::Table(merged))
            })
            .collect();

        tracing::debug!(
            dir = %self.dir.display(),
            environment = %self.environment,
            "loaded configuration directory"
        );
        Ok(items)
    }
}

fn load_validated(loader: &TrustedLoader, path: &Path) -> Result<Table, Error> {
    let table = loader.load(path)?;
    validate(&table)?;
    Ok(table)
}

fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

/// Lists supported configuration files directly inside `dir`, sorted by name.
pub(crate) fn config_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let read_err = |e: std::io::Error| LoadError::ReadError {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() && Format::from_path(&path).is_some() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
