//! Combinatorial payload variants for negative testing
//!
//! Given one reference payload, enumerates its scalar leaf pointers and
//! emits mutated copies per leaf: field omitted, field empty/null, and
//! field replaced with an incompatible type. Each case carries a stable
//! label so parametrized test ids do not shift between runs.

use serde_json::{Value, json};

use crate::matcher::JsonKind;
use crate::pointer::{Pointer, PointerError};

/// Family a variant case belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// Leaf removed from its container
    Omit,
    /// Leaf set to an empty value or explicit null
    EmptyNull,
    /// Leaf replaced with a value of an incompatible type
    WrongType,
}

impl MutationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Omit => "omit",
            Self::EmptyNull => "empty_null",
            Self::WrongType => "wrong_type",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mutated copy of the reference payload, probing a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantCase {
    /// Leaf the mutation targets
    pub pointer: Pointer,
    pub kind: MutationKind,
    /// Independently-owned mutated document
    pub payload: Value,
    /// Stable id, unique within one generation call
    pub label: String,
}

/// Enumerates mutation cases over a reference payload.
///
/// Generation is pure: the reference is never mutated and every case
/// owns its own copy.
#[derive(Debug, Clone)]
pub struct PayloadVariantGenerator<'a> {
    reference: &'a Value,
    skip: Vec<Pointer>,
}

impl<'a> PayloadVariantGenerator<'a> {
    #[must_use]
    pub fn new(reference: &'a Value) -> Self {
        Self {
            reference,
            skip: Vec::new(),
        }
    }

    /// Leaves addressed by these pointers are left untouched by every
    /// family.
    #[must_use]
    pub fn skipping<I>(mut self, pointers: I) -> Self
    where
        I: IntoIterator<Item = Pointer>,
    {
        self.skip.extend(pointers);
        self
    }

    /// Scalar leaf pointers of the reference, in deterministic
    /// declaration order. Containers are traversed, not treated as
    /// leaves; the skip-list is not applied here.
    #[must_use]
    pub fn leaf_pointers(&self) -> Vec<Pointer> {
        let mut leaves = Vec::new();
        collect_leaves(self.reference, &Pointer::root(), &mut leaves);
        leaves
    }

    /// One case per non-skipped leaf with that leaf removed.
    ///
    /// # Errors
    ///
    /// Propagates [`PointerError`] from document surgery; discovered
    /// leaves always resolve, so this only fires on a scalar reference.
    pub fn omit_variants(&self) -> Result<Vec<VariantCase>, PointerError> {
        let mut cases = Vec::new();
        for pointer in self.active_leaves() {
            cases.push(VariantCase {
                payload: pointer.without(self.reference)?,
                label: format!("{}:{}", MutationKind::Omit, pointer),
                kind: MutationKind::Omit,
                pointer,
            });
        }
        Ok(cases)
    }

    /// Per non-skipped leaf: the leaf set to its empty-typed value and
    /// to explicit null. String leaves yield both; for any other kind
    /// the two coincide and a single null case is emitted.
    ///
    /// # Errors
    ///
    /// Propagates [`PointerError`] from document surgery.
    pub fn empty_null_variants(&self) -> Result<Vec<VariantCase>, PointerError> {
        let mut cases = Vec::new();
        for pointer in self.active_leaves() {
            if matches!(pointer.get(self.reference), Some(Value::String(_))) {
                cases.push(self.substitution(
                    &pointer,
                    MutationKind::EmptyNull,
                    "empty",
                    json!(""),
                )?);
            }
            cases.push(self.substitution(
                &pointer,
                MutationKind::EmptyNull,
                "null",
                Value::Null,
            )?);
        }
        Ok(cases)
    }

    /// Per non-skipped leaf: one case per substitute kind from the
    /// fixed incompatibility table (string, number, boolean, list),
    /// excluding the leaf's own kind.
    ///
    /// # Errors
    ///
    /// Propagates [`PointerError`] from document surgery.
    pub fn wrong_type_variants(&self) -> Result<Vec<VariantCase>, PointerError> {
        let mut cases = Vec::new();
        for pointer in self.active_leaves() {
            let own_kind = pointer
                .get(self.reference)
                .map_or(JsonKind::Null, JsonKind::of);

            for (kind, name, substitute) in substitute_table() {
                if kind == own_kind {
                    continue;
                }
                cases.push(self.substitution(
                    &pointer,
                    MutationKind::WrongType,
                    name,
                    substitute,
                )?);
            }
        }
        Ok(cases)
    }

    /// All three families, omit first.
    ///
    /// # Errors
    ///
    /// Propagates [`PointerError`] from document surgery.
    pub fn all_variants(&self) -> Result<Vec<VariantCase>, PointerError> {
        let mut cases = self.omit_variants()?;
        cases.extend(self.empty_null_variants()?);
        cases.extend(self.wrong_type_variants()?);
        Ok(cases)
    }

    fn active_leaves(&self) -> impl Iterator<Item = Pointer> + '_ {
        self.leaf_pointers()
            .into_iter()
            .filter(|ptr| !self.skip.contains(ptr))
    }

    fn substitution(
        &self,
        pointer: &Pointer,
        kind: MutationKind,
        detail: &str,
        value: Value,
    ) -> Result<VariantCase, PointerError> {
        Ok(VariantCase {
            payload: pointer.with_value(self.reference, value)?,
            label: format!("{kind}:{pointer}={detail}"),
            kind,
            pointer: pointer.clone(),
        })
    }
}

/// Fixed wrong-type substitution table: kind, label detail, sample value.
fn substitute_table() -> [(JsonKind, &'static str, Value); 4] {
    [
        (JsonKind::String, "string", json!("unexpected")),
        (JsonKind::Number, "number", json!(42)),
        (JsonKind::Boolean, "boolean", json!(true)),
        (JsonKind::Array, "list", json!([1, 2, 3])),
    ]
}

fn collect_leaves(value: &Value, pointer: &Pointer, leaves: &mut Vec<Pointer>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                collect_leaves(child, &pointer.append(key.clone()), leaves);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect_leaves(child, &pointer.append(index.to_string()), leaves);
            }
        }
        _ => leaves.push(pointer.clone()),
    }
}
