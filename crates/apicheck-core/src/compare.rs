//! Structural comparison of actual documents against expected trees
//!
//! An expected document is an [`Expected`] tree whose leaves are either
//! plain values or [`Matcher`] predicates. Comparison is depth-first
//! with a pointer accumulated from the root; the first divergence wins
//! and is returned as a [`Diff`], no aggregation.

use serde_json::Value;

use crate::matcher::{Matcher, values_equal};
use crate::pointer::Pointer;

/// Expected document tree. Objects keep their keys in declaration order
/// so first-failure diffs are deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    /// Plain scalar compared by type-aware equality
    Value(Value),
    /// Flexible predicate leaf
    Matcher(Matcher),
    /// Mapping with exact key-set semantics (strict mode)
    Object(Vec<(String, Expected)>),
    /// Sequence compared element-wise, order matters
    Array(Vec<Expected>),
}

impl Expected {
    /// Build an object node from `(key, node)` pairs, keeping order.
    pub fn object<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Expected)>,
        K: Into<String>,
    {
        Self::Object(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<Value> for Expected {
    /// Lift a plain document: containers decompose into expected
    /// containers (object keys in the map's iteration order), scalars
    /// become exact-equality leaves.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            Value::Array(items) => Self::Array(items.into_iter().map(Into::into).collect()),
            scalar => Self::Value(scalar),
        }
    }
}

impl From<Matcher> for Expected {
    fn from(matcher: Matcher) -> Self {
        Self::Matcher(matcher)
    }
}

/// First point of divergence between expected and actual.
#[derive(Debug, Clone, PartialEq)]
pub struct Diff {
    /// Where the documents diverge
    pub pointer: Pointer,
    /// What was expected there, human-readable
    pub expected: String,
    /// What was actually found (`None` when the node is absent)
    pub actual: Option<Value>,
    /// Precomposed mismatch clause, rendered verbatim when present
    detail: Option<String>,
}

impl Diff {
    fn new(pointer: &Pointer, expected: impl Into<String>, actual: Option<&Value>) -> Self {
        Self {
            pointer: pointer.clone(),
            expected: expected.into(),
            actual: actual.cloned(),
            detail: None,
        }
    }

    fn explained(
        pointer: &Pointer,
        expected: impl Into<String>,
        actual: &Value,
        detail: String,
    ) -> Self {
        Self {
            pointer: pointer.clone(),
            expected: expected.into(),
            actual: Some(actual.clone()),
            detail: Some(detail),
        }
    }
}

impl std::fmt::Display for Diff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let at = if self.pointer.is_root() {
            "document root".to_string()
        } else {
            format!("\"{}\"", self.pointer)
        };
        match (&self.detail, &self.actual) {
            (Some(detail), _) => write!(f, "at {at}: {detail}"),
            (None, Some(actual)) => write!(f, "at {at}: expected {}, got {actual}", self.expected),
            (None, None) => write!(f, "at {at}: expected {}, but node is absent", self.expected),
        }
    }
}

/// Targeted-comparison failures: the addressed field may be missing
/// before any structural comparison happens.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompareError {
    #[error("field \"{0}\" not found in document")]
    FieldNotFound(Pointer),
    #[error("{0}")]
    Mismatch(Diff),
}

/// Strict whole-tree comparison: mappings must have exactly the same
/// key set, sequences the same length.
///
/// # Errors
///
/// Returns the first divergence encountered depth-first.
pub fn equals(expected: &Expected, actual: &Value) -> Result<(), Diff> {
    compare_at(&Pointer::root(), expected, actual)
}

/// Targeted comparison: extracts the actual subtree at `pointer` and
/// compares only that subtree; the rest of the document is ignored.
///
/// # Errors
///
/// Returns [`CompareError::FieldNotFound`] when the pointer does not
/// resolve, or the first divergence within the subtree.
pub fn param_equals(
    pointer: &Pointer,
    expected: &Expected,
    actual: &Value,
) -> Result<(), CompareError> {
    let subtree = pointer
        .get(actual)
        .ok_or_else(|| CompareError::FieldNotFound(pointer.clone()))?;
    compare_at(pointer, expected, subtree).map_err(CompareError::Mismatch)
}

fn compare_at(pointer: &Pointer, expected: &Expected, actual: &Value) -> Result<(), Diff> {
    match expected {
        Expected::Matcher(matcher) => {
            if matcher.matches(actual) {
                Ok(())
            } else {
                Err(Diff::explained(
                    pointer,
                    matcher.describe(),
                    actual,
                    matcher.explain_mismatch(actual),
                ))
            }
        }
        Expected::Value(value) => {
            if values_equal(value, actual) {
                Ok(())
            } else {
                Err(Diff::new(pointer, value.to_string(), Some(actual)))
            }
        }
        Expected::Object(pairs) => compare_object(pointer, pairs, actual),
        Expected::Array(items) => compare_array(pointer, items, actual),
    }
}

fn compare_object(
    pointer: &Pointer,
    pairs: &[(String, Expected)],
    actual: &Value,
) -> Result<(), Diff> {
    let Value::Object(map) = actual else {
        return Err(Diff::new(
            pointer,
            format!("mapping with {} keys", pairs.len()),
            Some(actual),
        ));
    };

    // Expected keys first, in declaration order, for deterministic diffs
    for (key, node) in pairs {
        let child = pointer.append(key.clone());
        match map.get(key) {
            Some(value) => compare_at(&child, node, value)?,
            None => return Err(Diff::new(&child, describe_node(node), None)),
        }
    }

    // Strict mode: unknown actual keys are rejected unconditionally
    for key in map.keys() {
        if !pairs.iter().any(|(k, _)| k == key) {
            return Err(Diff::new(
                &pointer.append(key.clone()),
                "no such key",
                map.get(key),
            ));
        }
    }

    Ok(())
}

fn compare_array(pointer: &Pointer, items: &[Expected], actual: &Value) -> Result<(), Diff> {
    let Value::Array(values) = actual else {
        return Err(Diff::new(
            pointer,
            format!("sequence of {} elements", items.len()),
            Some(actual),
        ));
    };

    if values.len() != items.len() {
        return Err(Diff::new(
            pointer,
            format!(
                "sequence of {} elements, got {}",
                items.len(),
                values.len()
            ),
            Some(actual),
        ));
    }

    for (index, (node, value)) in items.iter().zip(values).enumerate() {
        compare_at(&pointer.append(index.to_string()), node, value)?;
    }

    Ok(())
}

fn describe_node(node: &Expected) -> String {
    match node {
        Expected::Matcher(matcher) => matcher.describe(),
        Expected::Value(value) => value.to_string(),
        Expected::Object(pairs) => format!("mapping with {} keys", pairs.len()),
        Expected::Array(items) => format!("sequence of {} elements", items.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::JsonKind;
    use serde_json::json;

    #[test]
    fn identical_documents_match() {
        let doc = json!({
            "id": 7,
            "name": "Kate",
            "tags": ["vip", "repeat"],
            "nested": {"a": [1, 2.5, true], "b": null}
        });
        assert_eq!(equals(&Expected::from(doc.clone()), &doc), Ok(()));
    }

    #[test]
    fn scalar_mismatch_reports_pointer() {
        let expected = Expected::from(json!({"id": 7, "name": "Kate"}));
        let diff = equals(&expected, &json!({"id": 7, "name": "Karen"})).unwrap_err();
        assert_eq!(diff.pointer.encode(), "/name");
        assert_eq!(diff.actual, Some(json!("Karen")));
    }

    #[test]
    fn numbers_compared_by_value_not_representation() {
        let expected = Expected::from(json!({"price": 111}));
        assert_eq!(equals(&expected, &json!({"price": 111.0})), Ok(()));
    }

    #[test]
    fn bool_is_not_a_number() {
        let expected = Expected::from(json!({"flag": 1}));
        assert!(equals(&expected, &json!({"flag": true})).is_err());
    }

    #[test]
    fn missing_key_is_first_divergence() {
        let expected = Expected::from(json!({"id": 7, "name": "Kate"}));
        let diff = equals(&expected, &json!({"id": 7})).unwrap_err();
        assert_eq!(diff.pointer.encode(), "/name");
        assert_eq!(diff.actual, None);
    }

    #[test]
    fn extra_actual_key_is_rejected() {
        let expected = Expected::from(json!({"id": 7}));
        let diff = equals(&expected, &json!({"id": 7, "debug": true})).unwrap_err();
        assert_eq!(diff.pointer.encode(), "/debug");
        assert_eq!(diff.expected, "no such key");
    }

    #[test]
    fn sequence_length_mismatch() {
        let expected = Expected::from(json!([1, 2, 3]));
        let diff = equals(&expected, &json!([1, 2])).unwrap_err();
        assert!(diff.pointer.is_root());
        assert!(diff.expected.contains("3 elements"));
    }

    #[test]
    fn sequence_order_matters() {
        let expected = Expected::from(json!([1, 2]));
        let diff = equals(&expected, &json!([2, 1])).unwrap_err();
        assert_eq!(diff.pointer.encode(), "/0");
    }

    #[test]
    fn matcher_leaf_delegates() {
        // Scenario: {"message": AnyListOf(3)} vs actual lists
        let expected = Expected::object([("message", Matcher::AnyListOf(3).into())]);

        assert_eq!(equals(&expected, &json!({"message": [1, 2, 3]})), Ok(()));

        let diff = equals(&expected, &json!({"message": [1, 2]})).unwrap_err();
        assert_eq!(diff.pointer.encode(), "/message");
        assert_eq!(diff.expected, "list of size 3");
        assert_eq!(diff.actual, Some(json!([1, 2])));
        assert_eq!(
            Matcher::AnyListOf(3).explain_mismatch(&json!([1, 2])),
            "expected list of size 3, got size 2"
        );
    }

    #[test]
    fn matcher_nested_in_tree() {
        let expected = Expected::object([
            ("id", Matcher::TypeOf(JsonKind::Number).into()),
            (
                "booking",
                Expected::object([("firstname", Matcher::Present.into())]),
            ),
        ]);
        let actual = json!({"id": 5, "booking": {"firstname": "Aki"}});
        assert_eq!(equals(&expected, &actual), Ok(()));
    }

    #[test]
    fn first_divergence_wins_depth_first() {
        let expected = Expected::from(json!({"a": {"x": 1, "y": 2}, "b": 3}));
        let actual = json!({"a": {"x": 9, "y": 9}, "b": 9});
        let diff = equals(&expected, &actual).unwrap_err();
        assert_eq!(diff.pointer.encode(), "/a/x");
    }

    #[test]
    fn param_equals_only_inspects_target_subtree() {
        let expected = Expected::from(json!({"firstname": "Kate"}));
        let ptr = Pointer::parse("/booking").unwrap();

        // Everything outside /booking is free to differ
        let actual = json!({"booking": {"firstname": "Kate"}, "anything": [1, 2, 3]});
        assert_eq!(param_equals(&ptr, &expected, &actual), Ok(()));

        let mutated = json!({"booking": {"firstname": "Kate"}, "anything": "changed"});
        assert_eq!(param_equals(&ptr, &expected, &mutated), Ok(()));
    }

    #[test]
    fn param_equals_missing_field() {
        let ptr = Pointer::parse("/booking/lastname").unwrap();
        let err = param_equals(&ptr, &Expected::from(json!("x")), &json!({"booking": {}}))
            .unwrap_err();
        assert!(matches!(err, CompareError::FieldNotFound(_)));
    }

    #[test]
    fn param_equals_mismatch_carries_subtree_pointer() {
        let ptr = Pointer::parse("/booking").unwrap();
        let expected = Expected::from(json!({"firstname": "Kate"}));
        let actual = json!({"booking": {"firstname": "Karen"}});

        let err = param_equals(&ptr, &expected, &actual).unwrap_err();
        let CompareError::Mismatch(diff) = err else {
            panic!("expected mismatch");
        };
        assert_eq!(diff.pointer.encode(), "/booking/firstname");
    }

    #[test]
    fn diff_display_is_localizable() {
        let expected = Expected::object([("message", Matcher::AnyListOf(3).into())]);
        let diff = equals(&expected, &json!({"message": [1, 2]})).unwrap_err();
        insta::assert_snapshot!(
            diff.to_string(),
            @r#"at "/message": expected list of size 3, got size 2"#
        );
    }

    #[test]
    fn non_matcher_diff_renders_expected_and_actual() {
        let diff = equals(&Expected::from(json!({"id": 7})), &json!({"id": 8})).unwrap_err();
        insta::assert_snapshot!(diff.to_string(), @r#"at "/id": expected 7, got 8"#);
    }
}
