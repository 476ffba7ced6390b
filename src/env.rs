//! Deployment environment selection and process environment helpers.

use std::fmt;
use std::path::Path;

use crate::config::{LoadError, ValidationError};
use crate::value::Value;

/// Process variable consulted when no environment name is given explicitly.
pub const ENV_VAR: &str = "APP_ENV";

/// Environment used when neither an explicit name nor `APP_ENV` is set.
pub const DEFAULT_ENV: &str = "production";

/// The named deployment mode selecting which override files apply.
///
/// This is a plain value owned by the caller; nothing here is process-global.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Environment {
    name: String,
}

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Resolves the environment from `explicit`, then `APP_ENV`, then
    /// [`DEFAULT_ENV`]. Empty or whitespace-only values count as unset.
    pub fn resolve(explicit: Option<&str>) -> Self {
        let name = explicit
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| env_var_or_none(ENV_VAR))
            .unwrap_or_else(|| DEFAULT_ENV.to_string());
        Self { name }
    }

    /// Resolves the environment from `APP_ENV` with the default fallback.
    pub fn from_env() -> Self {
        Self::resolve(None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn is_development(&self) -> bool {
        self.is("development") || self.is("dev")
    }

    pub fn is_production(&self) -> bool {
        self.is("production") || self.is("prod")
    }

    pub fn is_testing(&self) -> bool {
        self.is("testing") || self.is("test")
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(DEFAULT_ENV)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Reads an environment variable, returning `None` if unset, empty, or
/// whitespace-only. The returned value is trimmed.
pub fn env_var_or_none(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Reads a process environment variable, coercing it to the most specific
/// scalar type.
///
/// `true`/`false` become booleans, `null` becomes [`Value::Null`], numeric
/// literals become integers or floats, and anything else stays a string.
/// Returns `default` when the variable is not set.
///
/// ```
/// use layercfg::{env, Value};
///
/// let port = env("LAYERCFG_DOC_UNSET_PORT", 8080);
/// assert_eq!(port, Value::Integer(8080));
/// ```
pub fn env(key: &str, default: impl Into<Value>) -> Value {
    match std::env::var(key) {
        Ok(raw) => coerce_value(&raw),
        Err(_) => default.into(),
    }
}

/// Reports whether `key` is set in the process environment, even to an empty
/// or non-unicode value.
///
/// Keys are restricted to uppercase ASCII letters and `_`; anything else is
/// rejected with [`ValidationError::InvalidEnvKey`].
pub fn env_exists(key: &str) -> Result<bool, ValidationError> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_uppercase() || b == b'_') {
        return Err(ValidationError::InvalidEnvKey(key.to_string()));
    }
    Ok(std::env::var_os(key).is_some())
}

/// Loads `<dir>/.env` into the process environment.
///
/// Variables already present in the environment are not overwritten.
pub fn load_dotenv(dir: impl AsRef<Path>) -> Result<(), LoadError> {
    let path = dir.as_ref().join(".env");
    match dotenvy::from_path(&path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "loaded .env file");
            Ok(())
        }
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(LoadError::NotFound(path))
        }
        Err(dotenvy::Error::Io(e)) => Err(LoadError::ReadError { path, source: e }),
        Err(e) => Err(LoadError::ReadError {
            path,
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()),
        }),
    }
}

pub(crate) fn coerce_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if s.eq_ignore_ascii_case("null") {
        return Value::Null;
    }

    if looks_like_integer(s) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Integer(i);
        }
    }

    // f64::from_str also accepts "inf" and "NaN", which stay strings here,
    // as do literals like "1e999" that overflow
    if looks_like_number(s) {
        if let Ok(f) = s.parse::<f64>() {
            if f.is_finite() {
                return Value::Float(f);
            }
        }
    }

    Value::String(s.to_string())
}

fn looks_like_integer(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn looks_like_number(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
        && s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}
