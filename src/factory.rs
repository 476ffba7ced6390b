//! Construction entry points for [`Config`].

use std::path::Path;

use crate::cache::{hash_key, FileCache};
use crate::config::{Config, DirectoryLoader, LoadError};
use crate::env::Environment;
use crate::value::Table;
use crate::Error;

/// Creates [`Config`] instances for one environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigFactory {
    environment: Environment,
}

impl ConfigFactory {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Loads a configuration directory, optionally memoized in `cache`.
    ///
    /// The cache key is derived from the directory path and the environment
    /// name, so each environment gets its own entry. Cache read and write
    /// failures are logged and otherwise ignored.
    pub fn from_directory(
        &self,
        dir: impl AsRef<Path>,
        cache: Option<&FileCache>,
    ) -> Result<Config, Error> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(LoadError::DirectoryNotFound(dir.to_path_buf()).into());
        }

        let key = self.cache_key(dir);
        if let Some(cache) = cache {
            match cache.get_json::<Table>(&key) {
                Ok(Some(items)) => {
                    tracing::debug!(dir = %dir.display(), "configuration loaded from blob cache");
                    return Ok(Config::new(items));
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "ignoring unreadable blob cache entry"),
            }
        }

        let items = DirectoryLoader::new(dir, self.environment.clone()).load()?;

        if let Some(cache) = cache {
            if let Err(e) = cache.set_json(&key, &items) {
                tracing::warn!(error = %e, "failed to store configuration in blob cache");
            }
        }

        Ok(Config::new(items))
    }

    pub fn from_table(&self, items: Table) -> Config {
        Config::new(items)
    }

    /// Blob cache key for `dir` in this factory's environment.
    ///
    /// The two parts are NUL-separated, since a NUL byte cannot occur in a
    /// path.
    pub fn cache_key(&self, dir: &Path) -> String {
        hash_key(&format!("{}\0{}", dir.display(), self.environment.name()))
    }
}

/// Holds at most one [`Config`], created from the first initial table it is
/// given.
///
/// Later calls to [`get_or_init`](Self::get_or_init) must pass the same
/// initial table; a different table fails with
/// [`Error::ConfigurationMismatch`]. Mutations made through the returned
/// reference do not affect that comparison.
#[derive(Debug, Default)]
pub struct ConfigRegistry {
    slot: Option<(Table, Config)>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_init(&mut self, items: Table) -> Result<&mut Config, Error> {
        if let Some((initial, _)) = &self.slot {
            if *initial != items {
                return Err(Error::ConfigurationMismatch);
            }
        }

        let (_, config) = self
            .slot
            .get_or_insert_with(|| (items.clone(), Config::new(items)));
        Ok(config)
    }

    pub fn get(&self) -> Option<&Config> {
        self.slot.as_ref().map(|(_, config)| config)
    }

    pub fn is_initialized(&self) -> bool {
        self.slot.is_some()
    }

    /// Drops the held configuration so the next call initializes afresh.
    pub fn reset(&mut self) {
        self.slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app.toml"),
            "url = \"http://example.com\"\ndebug = true\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("app.production.toml"),
            "url = \"https://example.com\"\ndebug = false\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("database.toml"),
            "engine = \"mysql\"\n[mysql]\nhost = \"localhost\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("database.production.toml"),
            "[mysql]\nhost = \"prod-db\"\n",
        )
        .unwrap();
        dir
    }

    fn items(pairs: &[(&str, &str)]) -> Table {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    #[test]
    fn test_from_directory() {
        let dir = fixture();
        let config = ConfigFactory::new(Environment::new("development"))
            .from_directory(dir.path(), None)
            .unwrap();

        assert_eq!(config.get("app.url"), Some(Value::from("http://example.com")));
        assert_eq!(config.get("database.engine"), Some(Value::from("mysql")));
        assert_eq!(config.get("database.mysql.host"), Some(Value::from("localhost")));
    }

    #[test]
    fn test_from_directory_with_environment() {
        let dir = fixture();
        let config = ConfigFactory::new(Environment::new("production"))
            .from_directory(dir.path(), None)
            .unwrap();

        assert_eq!(config.get("app.url"), Some(Value::from("https://example.com")));
        assert_eq!(config.get("database.engine"), Some(Value::from("mysql")));
        assert_eq!(config.get("database.mysql.host"), Some(Value::from("prod-db")));
    }

    #[test]
    fn test_from_directory_with_blob_cache() {
        let dir = fixture();
        let cache_dir = TempDir::new().unwrap();
        let cache = FileCache::new(cache_dir.path()).unwrap();
        let factory = ConfigFactory::new(Environment::new("development"));

        let config = factory.from_directory(dir.path(), Some(&cache)).unwrap();
        assert_eq!(config.get("app.url"), Some(Value::from("http://example.com")));
        assert!(cache.has(&factory.cache_key(dir.path())));

        // Served from the cache even after the source disappears.
        fs::remove_file(dir.path().join("app.toml")).unwrap();
        let cached = factory.from_directory(dir.path(), Some(&cache)).unwrap();
        assert_eq!(cached.get("app.url"), Some(Value::from("http://example.com")));
    }

    #[test]
    fn test_cache_key_depends_on_environment() {
        let dir = Path::new("/srv/config");
        let dev = ConfigFactory::new(Environment::new("development"));
        let prod = ConfigFactory::new(Environment::new("production"));
        assert_ne!(dev.cache_key(dir), prod.cache_key(dir));
    }

    #[test]
    fn test_cache_key_separates_directory_from_environment() {
        let short = ConfigFactory::new(Environment::new("igprod"));
        let long = ConfigFactory::new(Environment::new("prod"));
        assert_ne!(
            short.cache_key(Path::new("/srv/conf")),
            long.cache_key(Path::new("/srv/config"))
        );
    }

    #[test]
    fn test_blob_cache_entries_do_not_collide_across_directories() {
        let root = TempDir::new().unwrap();
        let conf = root.path().join("conf");
        let config = root.path().join("config");
        fs::create_dir(&conf).unwrap();
        fs::create_dir(&config).unwrap();
        fs::write(conf.join("app.toml"), "name = \"conf\"\n").unwrap();
        fs::write(config.join("app.toml"), "name = \"config\"\n").unwrap();

        let cache_dir = TempDir::new().unwrap();
        let cache = FileCache::new(cache_dir.path()).unwrap();
        ConfigFactory::new(Environment::new("igprod"))
            .from_directory(&conf, Some(&cache))
            .unwrap();

        let loaded = ConfigFactory::new(Environment::new("prod"))
            .from_directory(&config, Some(&cache))
            .unwrap();
        assert_eq!(loaded.get("app.name"), Some(Value::from("config")));
    }

    #[test]
    fn test_corrupt_blob_cache_entry_is_ignored() {
        let dir = fixture();
        let cache_dir = TempDir::new().unwrap();
        let cache = FileCache::new(cache_dir.path()).unwrap();
        let factory = ConfigFactory::new(Environment::new("production"));
        cache
            .set(&factory.cache_key(dir.path()), b"corrupt")
            .unwrap();

        let config = factory.from_directory(dir.path(), Some(&cache)).unwrap();
        assert_eq!(config.get("database.mysql.host"), Some(Value::from("prod-db")));
    }

    #[test]
    fn test_from_directory_with_invalid_path() {
        let result = ConfigFactory::default().from_directory("/invalid/path", None);
        assert!(matches!(
            result,
            Err(Error::Load(LoadError::DirectoryNotFound(_)))
        ));
    }

    #[test]
    fn test_from_table() {
        let config = ConfigFactory::default().from_table(items(&[("name", "demo")]));
        assert_eq!(config.get("name"), Some(Value::from("demo")));
    }

    #[test]
    fn test_registry_returns_same_instance() {
        let mut registry = ConfigRegistry::new();
        let first: *const Config = registry.get_or_init(items(&[("a", "1")])).unwrap();
        let second: *const Config = registry.get_or_init(items(&[("a", "1")])).unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_registry_rejects_different_mapping() {
        let mut registry = ConfigRegistry::new();
        registry.get_or_init(items(&[("a", "1")])).unwrap();

        let result = registry.get_or_init(items(&[("a", "2")]));
        assert!(matches!(result, Err(Error::ConfigurationMismatch)));
    }

    #[test]
    fn test_registry_compares_initial_mapping_not_mutated_state() {
        let mut registry = ConfigRegistry::new();
        registry
            .get_or_init(items(&[("a", "1")]))
            .unwrap()
            .set("a", "changed");

        let config = registry.get_or_init(items(&[("a", "1")])).unwrap();
        assert_eq!(config.get("a"), Some(Value::from("changed")));
    }

    #[test]
    fn test_registry_reset() {
        let mut registry = ConfigRegistry::new();
        registry.get_or_init(items(&[("a", "1")])).unwrap();
        assert!(registry.is_initialized());

        registry.reset();
        assert!(registry.get().is_none());
        assert!(registry.get_or_init(items(&[("a", "2")])).is_ok());
    }
}
