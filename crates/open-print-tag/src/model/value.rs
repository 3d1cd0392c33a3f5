//! Generic CBOR values.
//!
//! Fields the schema does not know about (and aux-region vendor fields) are
//! held as `Value`s so they can be re-emitted untouched.

/// Any CBOR data item a region may carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Non-negative integer (major type 0).
    Unsigned(u64),
    /// Negative integer (major type 1).
    ///
    /// Non-negative numbers written through this variant encode as unsigned
    /// and decode back as [`Value::Unsigned`]; use [`Value::from`] with an
    /// `i64` to get the normalized form.
    Signed(i64),
    /// IEEE 754 float of any width.
    Float(f64),
    Bool(bool),
    Null,
    /// UTF-8 text string.
    Text(String),
    /// Opaque byte string.
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    /// Map entries in wire order.
    Map(Vec<(Value, Value)>),
    /// Semantic tag applied to a nested item.
    Tagged(u64, Box<Value>),
}

impl Value {
    /// Returns the value as an `i64` if it is an integer in range.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Unsigned(n) => i64::try_from(*n).ok(),
            Value::Signed(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as a `u64` if it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Unsigned(n) => Some(*n),
            Value::Signed(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Returns the value as an `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Unsigned(n) => Some(*n as f64),
            Value::Signed(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Unsigned(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        match u64::try_from(n) {
            Ok(u) => Value::Unsigned(u),
            Err(_) => Value::Signed(n),
        }
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_normalization() {
        assert_eq!(Value::from(5i64), Value::Unsigned(5));
        assert_eq!(Value::from(-5i64), Value::Signed(-5));
        assert_eq!(Value::from(0i64), Value::Unsigned(0));
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(Value::Unsigned(u64::MAX).as_i64(), None);
        assert_eq!(Value::Signed(-1).as_u64(), None);
        assert_eq!(Value::Signed(-1).as_i64(), Some(-1));
        assert_eq!(Value::Unsigned(3).as_f64(), Some(3.0));
        assert_eq!(Value::Text("x".into()).as_f64(), None);
    }
}
