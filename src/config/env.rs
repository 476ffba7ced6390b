use crate::env::coerce_value;
use crate::value::{Table, Value};

use super::merge::merge_at_path;

/// Overlays prefixed process environment variables onto a configuration table.
///
/// `MYAPP__DATABASE__PORT=5432` with prefix `MYAPP` and separator `__` sets
/// `database.port` to the integer `5432`. Segments are lowercased.
#[derive(Debug, Clone)]
pub struct EnvOverlay {
    prefix: String,
    separator: String,
}

impl EnvOverlay {
    /// # Panics
    ///
    /// Panics if `separator` is empty.
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
        }
    }

    /// Collects `(path, value)` pairs for every matching variable, sorted by
    /// variable name so application order does not depend on the platform.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn entries(&self) -> Vec<(Vec<String>, Value)> {
        self.entries_from(std::env::vars_os().filter_map(|(key, value)| {
            match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (Ok(key), Err(_)) => {
                    tracing::debug!(%key, "skipping environment variable with non-unicode value");
                    None
                }
                (Err(_), _) => None,
            }
        }))
    }

    fn entries_from(&self, vars: impl Iterator<Item = (String, String)>) -> Vec<(Vec<String>, Value)> {
        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);
        let mut vars: Vec<(String, String)> = vars
            .filter(|(key, _)| key.starts_with(&prefix_with_sep))
            .collect();
        vars.sort();

        vars.into_iter()
            .filter_map(|(key, value)| {
                let path_str = &key[prefix_with_sep.len()..];
                if path_str.is_empty() {
                    return None;
                }
                let path: Vec<String> = path_str
                    .split(&self.separator)
                    .map(str::to_lowercase)
                    .collect();
                if path.iter().any(String::is_empty) {
                    return None;
                }
                Some((path, coerce_value(&value)))
            })
            .collect()
    }

    pub fn apply(&self, table: &mut Table) {
        for (path, value) in self.entries() {
            tracing::debug!(path = %path.join("."), "applying environment override");
            merge_at_path(table, &path, value);
        }
    }
}
