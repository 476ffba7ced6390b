use crate::value::{Table, Value};

use super::ValidationError;

/// Checks that every key in `table`, at any depth, is addressable by a dot path.
///
/// Keys must be non-empty and must not contain `.`. Tables nested inside
/// arrays are checked too. Floats must be finite, since NaN and infinities
/// have no JSON form and could not survive the disk cache.
pub fn validate(table: &Table) -> Result<(), ValidationError> {
    validate_table(table, "")
}

fn validate_table(table: &Table, parent: &str) -> Result<(), ValidationError> {
    for (key, value) in table {
        if key.is_empty() {
            return Err(ValidationError::EmptyKey {
                parent: parent.to_string(),
            });
        }
        if key.contains('.') {
            return Err(ValidationError::DottedKey {
                key: key.clone(),
                parent: parent.to_string(),
            });
        }

        let path = if parent.is_empty() {
            key.clone()
        } else {
            format!("{parent}.{key}")
        };
        validate_value(value, &path)?;
    }
    Ok(())
}

fn validate_value(value: &Value, path: &str) -> Result<(), ValidationError> {
    match value {
        Value::Table(t) => validate_table(t, path),
        Value::Array(items) => items.iter().try_for_each(|item| validate_value(item, path)),
        Value::Float(f) if !f.is_finite() => Err(ValidationError::NonFiniteFloat {
            path: path.to_string(),
        }),
        _ => Ok(()),
    }
}
