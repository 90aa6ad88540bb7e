//! Owned SQL scalar values and primary keys.

use std::fmt;

use compact_str::{CompactString, ToCompactString};

use crate::error::{PlanError, Result};

/// An owned SQL value, as bound into queries and read back from rows.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default)]
pub enum Value {
    /// NULL value
    #[default]
    Null,
    /// Integer value (i64)
    Integer(i64),
    /// Real value (f64)
    Real(f64),
    /// Text value
    Text(CompactString),
    /// Blob value
    Blob(Vec<u8>),
}

impl Value {
    /// Returns true if this value is NULL.
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the integer value if this is an INTEGER.
    #[inline]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the text value if this is TEXT.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Blob(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Integer(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value.into())
    }
}

impl From<CompactString> for Value {
    fn from(value: CompactString) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<Key> for Value {
    fn from(value: Key) -> Self {
        match value {
            Key::Integer(v) => Value::Integer(v),
            Key::Text(v) => Value::Text(v),
        }
    }
}

/// A primary key. Unlike [`Value`] it is totally ordered and hashable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Integer(i64),
    Text(CompactString),
}

impl Key {
    /// Converts a row cell into a key, returning `None` for NULL.
    pub fn from_value(value: &Value) -> Result<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Integer(v) => Ok(Some(Key::Integer(*v))),
            Value::Text(v) => Ok(Some(Key::Text(v.clone()))),
            other => Err(PlanError::InvalidKey(other.to_string())),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Integer(v) => write!(f, "{v}"),
            Key::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Integer(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Integer(value.into())
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Text(value.to_compact_string())
    }
}

impl TryFrom<Value> for Key {
    type Error = PlanError;

    fn try_from(value: Value) -> Result<Self> {
        Key::from_value(&value)?.ok_or_else(|| PlanError::InvalidKey(Value::Null.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_order_integers_before_text() {
        let mut keys = vec![Key::from("b"), Key::from(2), Key::from("a"), Key::from(1)];
        keys.sort();
        assert_eq!(
            keys,
            vec![Key::from(1), Key::from(2), Key::from("a"), Key::from("b")]
        );
    }

    #[test]
    fn null_cell_is_no_key() {
        assert_eq!(Key::from_value(&Value::Null).unwrap(), None);
        assert_eq!(Key::from_value(&Value::from(7)).unwrap(), Some(Key::from(7)));
    }

    #[test]
    fn real_cell_is_an_invalid_key() {
        let err = Key::from_value(&Value::Real(1.5)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidKey(_)));
        assert!(Key::try_from(Value::Null).is_err());
    }
}
