//! Flexible predicates embedded in expected documents
//!
//! A matcher stands in for an exact value inside an expected document:
//! "any list of 3 elements", "any of these values", "just be present".
//! The comparator dispatches on the variant tag and uses `describe()`
//! for the expectation side of a diff.

use serde_json::Value;

use crate::pointer::kind_name;

/// JSON value kind, used by [`Matcher::TypeOf`] and the wrong-type
/// substitution table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    /// Kind of a concrete value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "sequence",
            Self::Object => "mapping",
        }
    }
}

impl std::fmt::Display for JsonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate over an actual JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    /// Deep value equality; numbers compared by value, not representation
    ExactValue(Value),
    /// Any sequence of exactly this many elements, content unconstrained
    AnyListOf(usize),
    /// Equal to at least one of the candidates
    AnyOf(Vec<Value>),
    /// Anything at all, as long as the node resolves
    Present,
    /// Any value of the given kind
    TypeOf(JsonKind),
}

impl Matcher {
    /// Evaluate the predicate against an actual value.
    #[must_use]
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Self::ExactValue(expected) => values_equal(expected, actual),
            Self::AnyListOf(size) => actual.as_array().is_some_and(|items| items.len() == *size),
            Self::AnyOf(candidates) => candidates.iter().any(|c| values_equal(c, actual)),
            Self::Present => true,
            Self::TypeOf(kind) => JsonKind::of(actual) == *kind,
        }
    }

    /// Human-readable expectation, used as the expected side of a diff.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::ExactValue(expected) => expected.to_string(),
            Self::AnyListOf(size) => format!("list of size {size}"),
            Self::AnyOf(candidates) => {
                let rendered: Vec<String> = candidates.iter().map(Value::to_string).collect();
                format!("any of [{}]", rendered.join(", "))
            }
            Self::Present => "any present value".to_string(),
            Self::TypeOf(kind) => format!("any {kind}"),
        }
    }

    /// Expectation with the failure detail filled in, e.g.
    /// "expected list of size 3, got size 2".
    #[must_use]
    pub fn explain_mismatch(&self, actual: &Value) -> String {
        match self {
            Self::AnyListOf(size) => match actual.as_array() {
                Some(items) => format!("expected list of size {size}, got size {}", items.len()),
                None => format!("expected list of size {size}, got {}", kind_name(actual)),
            },
            other => format!("expected {}, got {actual}", other.describe()),
        }
    }
}

impl std::fmt::Display for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Deep equality with type-aware scalars: booleans never equal numbers,
/// integers and floats holding the same numeric value are equal.
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &serde_json::Number, y: &serde_json::Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
