//! Runtime value types

use crate::client::Xyz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Value {
    Number(f64),
    String(String),
    Key(String),
    Xyz(Xyz),
    Bool(bool),
}

impl Value {
    /// Check if value is truthy (for conditionals)
    ///
    /// Only booleans and numbers have a truth value; `None` for the rest.
    pub fn truthiness(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => Some(*n != 0.0),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Key(_) => "key",
            Value::Xyz(_) => "xyz",
            Value::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) | Value::Key(s) => write!(f, "{}", s),
            Value::Xyz(p) => write!(f, "{}", p),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert_eq!(Value::Bool(false).truthiness(), Some(false));
        assert_eq!(Value::Number(0.0).truthiness(), Some(false));
        assert_eq!(Value::Number(-2.0).truthiness(), Some(true));
        assert_eq!(Value::String("x".into()).truthiness(), None);
    }
}
