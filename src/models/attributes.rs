use serde_json::{Map, Value};
use validator::Validate;

use crate::models::item::ItemError;

/// Open attribute storage shared by items and their options.
pub type Attributes = Map<String, Value>;

/// Custom write path for a single attribute name.
pub type Mutator<T> = fn(&mut T, Value) -> Result<(), ItemError>;

/// Custom read path for a single attribute name.
pub type Accessor<T> = fn(&T) -> Value;

/// Dynamic attribute access with per-key interception.
///
/// Implementors expose their raw attribute map and may register a mutator or accessor
/// for specific keys. Every read and write goes through `get`/`set`, which consult the
/// registry first and fall back to the plain map. The `offset_*` methods are aliases for
/// callers that think of an item as an indexable record.
pub trait HasAttributes: Validate + Sized {
    fn attributes(&self) -> &Attributes;

    fn attributes_mut(&mut self) -> &mut Attributes;

    fn mutator(_key: &str) -> Option<Mutator<Self>> {
        None
    }

    fn accessor(_key: &str) -> Option<Accessor<Self>> {
        None
    }

    /// Validate, then assign every pair through `set`.
    fn fill(&mut self, attributes: Attributes) -> Result<&mut Self, ItemError> {
        self.validate()?;

        for (key, value) in attributes {
            self.set(&key, value)?;
        }

        Ok(self)
    }

    fn get(&self, key: &str) -> Result<Value, ItemError> {
        if let Some(accessor) = Self::accessor(key) {
            return Ok(accessor(self));
        }

        self.attributes()
            .get(key)
            .cloned()
            .ok_or_else(|| ItemError::AttributeNotFound {
                key: key.to_string(),
            })
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), ItemError> {
        match Self::mutator(key) {
            Some(mutator) => mutator(self, value),
            None => {
                self.attributes_mut().insert(key.to_string(), value);
                Ok(())
            }
        }
    }

    /// True when `get` would yield a non-null value for the key.
    fn has(&self, key: &str) -> bool {
        if let Some(accessor) = Self::accessor(key) {
            return !accessor(self).is_null();
        }

        self.attributes()
            .get(key)
            .is_some_and(|value| !value.is_null())
    }

    fn unset(&mut self, key: &str) -> Option<Value> {
        self.attributes_mut().shift_remove(key)
    }

    fn offset_exists(&self, key: &str) -> bool {
        self.has(key)
    }

    fn offset_get(&self, key: &str) -> Result<Value, ItemError> {
        self.get(key)
    }

    fn offset_set(&mut self, key: &str, value: Value) -> Result<(), ItemError> {
        self.set(key, value)
    }

    fn offset_unset(&mut self, key: &str) -> Option<Value> {
        self.unset(key)
    }
}

/// Numeric reading of a loosely typed attribute: numbers and numeric strings.
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Key-like reading of an attribute: non-empty strings and numbers.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_accepts_numbers_and_numeric_strings() {
        assert_eq!(numeric(&json!(3)), Some(3.0));
        assert_eq!(numeric(&json!("2.50")), Some(2.5));
        assert_eq!(numeric(&json!("two")), None);
        assert_eq!(numeric(&json!(null)), None);
    }

    #[test]
    fn test_text_rejects_empty_strings() {
        assert_eq!(text(&json!("abc")), Some("abc".to_string()));
        assert_eq!(text(&json!(42)), Some("42".to_string()));
        assert_eq!(text(&json!("")), None);
        assert_eq!(text(&json!(false)), None);
    }
}
