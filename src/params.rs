//! Bind-parameter values and their flattening into positional span attributes.

use std::collections::HashMap;
use std::fmt;

/// A single scalar bind value.
///
/// Values are opaque to the classifier; they exist only to be attached to a
/// span as `?_N` attributes when parameter logging is enabled.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => write!(f, "NULL"),
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// One bound argument of a statement: either a single scalar, or an ordered
/// list of scalars standing in for an expanded `IN (...)` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Scalar(ParamValue),
    List(Vec<ParamValue>),
}

impl From<ParamValue> for BindValue {
    fn from(v: ParamValue) -> Self {
        BindValue::Scalar(v)
    }
}

impl From<Vec<ParamValue>> for BindValue {
    fn from(v: Vec<ParamValue>) -> Self {
        BindValue::List(v)
    }
}

impl From<bool> for BindValue {
    fn from(v: bool) -> Self {
        BindValue::Scalar(v.into())
    }
}

impl From<i32> for BindValue {
    fn from(v: i32) -> Self {
        BindValue::Scalar(v.into())
    }
}

impl From<i64> for BindValue {
    fn from(v: i64) -> Self {
        BindValue::Scalar(v.into())
    }
}

impl From<u32> for BindValue {
    fn from(v: u32) -> Self {
        BindValue::Scalar(v.into())
    }
}

impl From<f64> for BindValue {
    fn from(v: f64) -> Self {
        BindValue::Scalar(v.into())
    }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        BindValue::Scalar(v.into())
    }
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        BindValue::Scalar(v.into())
    }
}

/// Flatten bound arguments into a `?_N` keyed map.
///
/// Keys are assigned in traversal order: a scalar consumes one key, a list
/// consumes one key per element. A statement bound as `(42, [1, 2], "x")`
/// therefore produces `?_0`, `?_1`, `?_2`, `?_3`.
pub fn flatten(params: &[BindValue]) -> HashMap<String, ParamValue> {
    let mut out = HashMap::with_capacity(params.len());
    let mut i = 0usize;
    for param in params {
        match param {
            BindValue::Scalar(value) => {
                out.insert(format!("?_{}", i), value.clone());
                i += 1;
            }
            BindValue::List(values) => {
                for value in values {
                    out.insert(format!("?_{}", i), value.clone());
                    i += 1;
                }
            }
        }
    }
    out
}
