use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::cache::ConfigCache;
use crate::env::Environment;
use crate::value::Table;
use crate::Error;

use super::directory::DirectoryLoader;
use super::env::EnvOverlay;
use super::store::Config;

/// Builder for loading configuration from a directory.
///
/// The pipeline is:
///
/// 1. If a disk cache directory is attached and the record for the build's
///    environment is fresh, the merged table is read from it. A cache that
///    fails to load is treated as a miss.
/// 2. Otherwise the directory is scanned and merged (see [`DirectoryLoader`]),
///    and the result is written back to the cache unless the environment is
///    development. A failed write is logged and ignored.
/// 3. Environment variable overlays registered with
///    [`with_env`](Self::with_env) are applied last, so they never end up in
///    the cache.
///
/// ## Example
///
/// ```no_run
/// use layercfg::{Config, Environment};
///
/// let config = Config::builder()
///     .directory("config")
///     .environment(Environment::from_env())
///     .disk_cache("cache")
///     .with_env("MYAPP", "__")
///     .build()?;
///
/// let host = config.get_or("database.mysql.host", "localhost");
/// # Ok::<(), layercfg::Error>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ConfigBuilder {
    dir: Option<PathBuf>,
    environment: Option<Environment>,
    disk_cache: Option<PathBuf>,
    overlays: Vec<EnvOverlay>,
    lookup_cache: Option<bool>,
}

impl ConfigBuilder {
    /// Sets the directory to load. Without one, the builder starts from an
    /// empty table.
    pub fn directory(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Sets the environment. Defaults to [`Environment::from_env`].
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Caches the merged directory contents under `dir`.
    ///
    /// The record is keyed by the environment the builder resolves, so one
    /// cache directory can be shared between environments.
    pub fn disk_cache(mut self, dir: impl AsRef<Path>) -> Self {
        self.disk_cache = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Overlays environment variables named `<prefix><separator><path>`.
    ///
    /// With `MYAPP__DATABASE__PORT=5432`, `.with_env("MYAPP", "__")` sets
    /// `database.port` to `5432`. Overlays apply in registration order.
    ///
    /// # Panics
    ///
    /// Panics if `separator` is empty.
    pub fn with_env(mut self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.overlays.push(EnvOverlay::new(prefix, separator));
        self
    }

    /// Enables or disables the lookup cache of the built [`Config`].
    pub fn lookup_cache(mut self, enabled: bool) -> Self {
        self.lookup_cache = Some(enabled);
        self
    }

    pub fn build(self) -> Result<Config, Error> {
        let lookup_cache = self.lookup_cache.unwrap_or(true);
        let table = self.build_table()?;
        Ok(Config::with_lookup_cache(table, lookup_cache))
    }

    /// Builds and deserializes the merged configuration into `T`.
    pub fn build_as<T: DeserializeOwned>(self) -> Result<T, Error> {
        self.build()?.deserialize()
    }

    fn build_table(self) -> Result<Table, Error> {
        let environment = self.environment.unwrap_or_else(Environment::from_env);

        let cache = self
            .disk_cache
            .map(|cache_dir| ConfigCache::new(cache_dir, environment.clone()));

        let mut table = match &self.dir {
            Some(dir) => load_directory(dir, &environment, cache.as_ref())?,
            None => Table::new(),
        };

        for overlay in &self.overlays {
            overlay.apply(&mut table);
        }

        Ok(table)
    }
}

fn load_directory(
    dir: &Path,
    environment: &Environment,
    cache: Option<&ConfigCache>,
) -> Result<Table, Error> {
    if let Some(cache) = cache {
        if cache.is_fresh(dir) {
            match cache.load() {
                Ok(table) => {
                    tracing::debug!(path = %cache.record_path().display(), "using cached configuration");
                    return Ok(table);
                }
                Err(e) => tracing::warn!(error = %e, "configuration cache unusable, reloading"),
            }
        }
    }

    let table = DirectoryLoader::new(dir, environment.clone()).load()?;

    if let Some(cache) = cache {
        if !environment.is_development() {
            if let Err(e) = cache.save(&table) {
                tracing::warn!(error = %e, "failed to save configuration cache");
            }
        }
    }

    Ok(table)
}
