use serde::de::DeserializeOwned;

use crate::value::{Table, Value};
use crate::Error;

use super::builder::ConfigBuilder;
use super::lookup::LookupCache;

/// Loaded configuration addressable by dot-notation paths.
///
/// `config.get("database.mysql.host")` walks `database` → `mysql` → `host`.
/// Resolved paths are memoized in a lookup cache, which is kept consistent
/// across [`set`](Self::set), [`delete`](Self::delete) and
/// [`clear`](Self::clear).
///
/// `Config` implements neither `Clone` nor `Serialize`; share it by reference.
/// Mutations are in-memory only.
///
/// ## Presence and null
///
/// [`has`](Self::has) reports whether a key is present, so a key explicitly
/// set to [`Value::Null`] counts as present. [`is_null`](Self::is_null) is
/// true only for such a stored null.
///
/// ```
/// use layercfg::{Config, Table, Value};
///
/// let mut config = Config::new(Table::new());
/// config.set("app.debug", true);
/// config.set("app.token", Value::Null);
///
/// assert_eq!(config.get("app.debug"), Some(Value::Bool(true)));
/// assert!(config.has("app.token"));
/// assert!(config.is_null("app.token"));
/// assert!(!config.has("app.missing"));
/// ```
#[derive(Debug)]
pub struct Config {
    items: Table,
    cache: LookupCache,
}

impl Config {
    /// Creates a configuration over `items` with the lookup cache enabled.
    pub fn new(items: Table) -> Self {
        Self::with_lookup_cache(items, true)
    }

    pub fn with_lookup_cache(items: Table, enabled: bool) -> Self {
        Self {
            items,
            cache: LookupCache::new(enabled),
        }
    }

    /// Creates a builder that loads configuration from a directory.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Returns the value at `path`, or `None` if any segment is missing or an
    /// intermediate value is not a table.
    pub fn get(&self, path: &str) -> Option<Value> {
        if let Some(hit) = self.cache.get(path) {
            return Some(hit);
        }

        let value = self.lookup(path)?;
        self.cache.insert(path, value);
        Some(value.clone())
    }

    pub fn get_or(&self, path: &str, default: impl Into<Value>) -> Value {
        self.get(path).unwrap_or_else(|| default.into())
    }

    /// Deserializes the value at `path` into `T`.
    ///
    /// Returns `Ok(None)` when the path does not resolve.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, Error> {
        self.lookup(path).map(deserialize_value::<T>).transpose()
    }

    /// Deserializes the whole configuration into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let json = serde_json::to_value(&self.items)?;
        Ok(serde_json::from_value(json)?)
    }

    /// Stores `value` at `path`, creating intermediate tables as needed.
    ///
    /// A non-table value sitting on the way is replaced by an empty table.
    /// An empty path is ignored.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        if path.is_empty() {
            tracing::debug!("ignoring set with empty path");
            return;
        }

        let mut segments: Vec<&str> = path.split('.').collect();
        let last = segments.pop().unwrap_or(path);

        let mut current = &mut self.items;
        for segment in segments {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Table(Table::new()));
            if !matches!(entry, Value::Table(_)) {
                *entry = Value::Table(Table::new());
            }
            current = match entry {
                Value::Table(t) => t,
                _ => unreachable!("entry was just replaced with a table"),
            };
        }

        current.insert(last.to_string(), value.into());
        self.cache.invalidate(path);
    }

    /// Removes the value at `path`. A broken parent chain is a no-op.
    pub fn delete(&mut self, path: &str) {
        let mut segments: Vec<&str> = path.split('.').collect();
        let Some(last) = segments.pop() else {
            return;
        };

        let mut current = &mut self.items;
        for segment in segments {
            match current.get_mut(segment) {
                Some(Value::Table(t)) => current = t,
                _ => return,
            }
        }

        if current.remove(last).is_some() {
            self.cache.invalidate(path);
        }
    }

    /// Returns true if `path` resolves to a stored value, including null.
    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.items.clear();
        self.cache.clear();
    }

    pub fn all(&self) -> &Table {
        &self.items
    }

    pub fn into_table(self) -> Table {
        self.items
    }

    pub fn is_string(&self, path: &str) -> bool {
        matches!(self.get(path), Some(Value::String(_)))
    }

    pub fn is_int(&self, path: &str) -> bool {
        matches!(self.get(path), Some(Value::Integer(_)))
    }

    pub fn is_float(&self, path: &str) -> bool {
        matches!(self.get(path), Some(Value::Float(_)))
    }

    pub fn is_bool(&self, path: &str) -> bool {
        matches!(self.get(path), Some(Value::Bool(_)))
    }

    pub fn is_array(&self, path: &str) -> bool {
        matches!(self.get(path), Some(Value::Array(_)))
    }

    pub fn is_table(&self, path: &str) -> bool {
        matches!(self.get(path), Some(Value::Table(_)))
    }

    /// True only when `path` is present and holds null.
    pub fn is_null(&self, path: &str) -> bool {
        matches!(self.get(path), Some(Value::Null))
    }

    fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.items.get(first)?;

        for segment in segments {
            current = current.as_table()?.get(segment)?;
        }

        Some(current)
    }
}

impl From<Table> for Config {
    fn from(items: Table) -> Self {
        Self::new(items)
    }
}

fn deserialize_value<T: DeserializeOwned>(value: &Value) -> Result<T, Error> {
    let json = serde_json::to_value(value)?;
    Ok(serde_json::from_value(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;

    fn sample(cache: bool) -> Config {
        let items: Table = serde_json::from_str(
            r#"{
                "app": {"url": "http://example.com", "debug": true, "timezone": "Europe/Paris"},
                "database": {"engine": "mysql", "mysql": {"host": "localhost", "dbname": "testdb"}}
            }"#,
        )
        .unwrap();
        Config::with_lookup_cache(items, cache)
    }

    #[test]
    fn test_get_nested() {
        let config = sample(true);
        assert_eq!(config.get("app.url"), Some(Value::from("http://example.com")));
        assert_eq!(config.get("database.engine"), Some(Value::from("mysql")));
        assert_eq!(config.get("database.mysql.host"), Some(Value::from("localhost")));
    }

    #[test]
    fn test_get_with_default() {
        let config = sample(true);
        assert_eq!(config.get("app.nonexistent"), None);
        assert_eq!(config.get_or("app.nonexistent", "default"), Value::from("default"));
    }

    #[test]
    fn test_get_through_scalar_short_circuits() {
        let config = sample(true);
        assert_eq!(config.get("app.url.scheme"), None);
    }

    #[test]
    fn test_empty_path_never_matches() {
        let mut config = sample(true);
        assert_eq!(config.get(""), None);
        config.set("", 1);
        assert!(!config.has(""));
    }

    #[test]
    fn test_set_nested_creates_tables() {
        let mut config = sample(true);
        config.set("database.redis.host", "localhost");
        assert_eq!(config.get("database.redis.host"), Some(Value::from("localhost")));
        assert!(config.is_table("database.redis"));
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut config = sample(true);
        config.set("app.url.scheme", "https");
        assert_eq!(config.get("app.url.scheme"), Some(Value::from("https")));
        assert!(config.is_table("app.url"));
    }

    #[test]
    fn test_set_invalidates_cached_ancestor() {
        let mut config = sample(true);
        let before = config.get("database.mysql").unwrap();
        assert_eq!(before.as_table().unwrap().len(), 2);

        config.set("database.mysql.port", 3306);
        let after = config.get("database.mysql").unwrap();
        assert_eq!(after.as_table().unwrap()["port"], Value::Integer(3306));
    }

    #[test]
    fn test_set_invalidates_cached_descendant() {
        let mut config = sample(true);
        assert!(config.has("database.mysql.host"));

        config.set("database.mysql", "dsn://db");
        assert_eq!(config.get("database.mysql.host"), None);
    }

    #[test]
    fn test_delete() {
        let mut config = sample(true);
        assert!(config.has("app.url"));
        config.delete("app.url");
        assert!(!config.has("app.url"));
    }

    #[test]
    fn test_delete_nested_table_removes_descendants() {
        let mut config = sample(true);
        assert!(config.has("database.mysql.host"));
        config.delete("database.mysql");
        assert!(!config.has("database.mysql.host"));
        assert!(config.has("database.engine"));
    }

    #[test]
    fn test_delete_broken_chain_is_noop() {
        let mut config = sample(true);
        config.delete("missing.deeply.nested");
        config.delete("app.url.scheme");
        assert_eq!(config.all(), sample(true).all());
    }

    #[test]
    fn test_clear() {
        let mut config = sample(true);
        assert!(config.has("app.url"));
        config.clear();
        assert!(config.all().is_empty());
        assert!(!config.has("app.url"));
    }

    #[test]
    fn test_has_distinguishes_null_from_absent() {
        let mut config = sample(true);
        config.set("app.null_value", Value::Null);

        assert!(config.has("app.null_value"));
        assert!(config.is_null("app.null_value"));
        assert!(!config.has("app.absent"));
        assert!(!config.is_null("app.absent"));
        assert!(!config.is_null("app.url"));
    }

    #[test]
    fn test_type_predicates() {
        let mut config = sample(true);
        config.set("app.port", 8080);
        config.set("app.ratio", 0.5);
        config.set("app.hosts", vec!["a", "b"]);

        assert!(config.is_string("app.url"));
        assert!(!config.is_string("app.debug"));
        assert!(config.is_int("app.port"));
        assert!(!config.is_int("app.url"));
        assert!(config.is_float("app.ratio"));
        assert!(config.is_bool("app.debug"));
        assert!(!config.is_bool("app.url"));
        assert!(config.is_array("app.hosts"));
        assert!(config.is_table("database.mysql"));
        assert!(!config.is_array("app.url"));
    }

    #[test]
    fn test_get_as_and_deserialize() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Mysql {
            host: String,
            dbname: String,
        }

        #[derive(Debug, Deserialize)]
        struct Whole {
            database: Database,
        }

        #[derive(Debug, Deserialize)]
        struct Database {
            engine: String,
        }

        let config = sample(true);
        let mysql: Mysql = config.get_as("database.mysql").unwrap().unwrap();
        assert_eq!(mysql.host, "localhost");
        assert_eq!(mysql.dbname, "testdb");
        assert!(config.get_as::<Mysql>("database.none").unwrap().is_none());
        assert!(config.get_as::<u16>("app.url").is_err());

        let whole: Whole = config.deserialize().unwrap();
        assert_eq!(whole.database.engine, "mysql");
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,6}"
    }

    fn dot_path() -> impl Strategy<Value = String> {
        prop::collection::vec(segment(), 1..4).prop_map(|segments| segments.join("."))
    }

    proptest! {
        #[test]
        fn prop_set_then_get_round_trips(path in dot_path(), value in any::<i64>(), cache in any::<bool>()) {
            let mut config = sample(cache);
            config.set(&path, value);
            prop_assert_eq!(config.get(&path), Some(Value::Integer(value)));
        }

        #[test]
        fn prop_delete_then_get_is_absent(path in dot_path(), warm in any::<bool>()) {
            let mut config = sample(true);
            config.set(&path, "present");
            if warm {
                let _ = config.get(&path);
            }
            config.delete(&path);
            prop_assert_eq!(config.get(&path), None);
            prop_assert!(!config.has(&path));
        }

        #[test]
        fn prop_cache_is_transparent(ops in prop::collection::vec((dot_path(), any::<bool>()), 1..12)) {
            let mut cached = sample(true);
            let mut uncached = sample(false);
            for (path, delete) in &ops {
                if *delete {
                    cached.delete(path);
                    uncached.delete(path);
                } else {
                    cached.set(path, path.len() as i64);
                    uncached.set(path, path.len() as i64);
                }
                for (seen, _) in &ops {
                    prop_assert_eq!(cached.get(seen), uncached.get(seen));
                }
            }
        }
    }
}
