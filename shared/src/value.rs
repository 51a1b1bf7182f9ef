use std::fmt;

/// Maximum byte length of an element data key.
pub const MAX_DATA_KEY_LEN: usize = 31;

/// Returns whether a string may be used as an element data key: non-empty and
/// at most [`MAX_DATA_KEY_LEN`] bytes.
pub fn is_valid_data_key(key: &str) -> bool {
    !key.is_empty() && key.len() <= MAX_DATA_KEY_LEN
}

/// A dynamically typed value, as stored in element data bags and passed as
/// event arguments. `Element` carries the raw `u64` of an element key so the
/// shared crate does not depend on server-side handle types.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Element(u64),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            Value::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", value),
            Value::String(value) => write!(f, "{}", value),
            Value::Element(raw) => write!(f, "element({})", raw),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_length_limit() {
        assert!(is_valid_data_key("health"));
        assert!(is_valid_data_key(&"k".repeat(MAX_DATA_KEY_LEN)));
        assert!(!is_valid_data_key(&"k".repeat(MAX_DATA_KEY_LEN + 1)));
        assert!(!is_valid_data_key(""));
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::Float(2.5).as_int(), None);
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
    }
}
