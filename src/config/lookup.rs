use std::cell::RefCell;
use std::collections::HashMap;

use crate::value::Value;

/// Memoizes resolved dot paths.
///
/// Only successful lookups are stored. The cache sits behind a `RefCell` so
/// reads can populate it through `&self`.
#[derive(Debug)]
pub struct LookupCache {
    enabled: bool,
    entries: RefCell<HashMap<String, Value>>,
}

impl LookupCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        if !self.enabled {
            return None;
        }
        self.entries.borrow().get(path).cloned()
    }

    pub fn insert(&self, path: &str, value: &Value) {
        if self.enabled {
            self.entries.borrow_mut().insert(path.to_string(), value.clone());
        }
    }

    /// Drops every entry that could observe a change at `path`: the path
    /// itself, its descendants, and its ancestors.
    pub fn invalidate(&mut self, path: &str) {
        self.entries
            .get_mut()
            .retain(|cached, _| !is_related(cached, path));
    }

    pub fn clear(&mut self) {
        self.entries.get_mut().clear();
    }
}

fn is_related(a: &str, b: &str) -> bool {
    a == b || is_descendant(a, b) || is_descendant(b, a)
}

fn is_descendant(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'.'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> LookupCache {
        let cache = LookupCache::new(true);
        for path in ["app", "app.url", "app.url.scheme", "application", "db.host"] {
            cache.insert(path, &Value::Null);
        }
        cache
    }

    #[test]
    fn test_invalidate_removes_related_paths_only() {
        let mut cache = populated();
        cache.invalidate("app.url");

        assert!(cache.get("app").is_none());
        assert!(cache.get("app.url").is_none());
        assert!(cache.get("app.url.scheme").is_none());
        assert!(cache.get("application").is_some());
        assert!(cache.get("db.host").is_some());
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let cache = LookupCache::new(false);
        cache.insert("a", &Value::Integer(1));
        assert!(cache.get("a").is_none());
        assert!(cache.entries.borrow().is_empty());
    }
}
