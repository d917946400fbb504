//! RFC 6901 JSON pointers for addressing nodes in nested documents
//!
//! Pointers are used both to extract/compare values and to synthesize
//! mutated payloads: `get` for lookup, `with_value`/`without` for
//! copy-on-write edits that never touch the source document.

use serde_json::Value;

/// Addressing errors. "Not found" is deliberately not an error: `get`
/// returns `None` so callers can distinguish absent from mismatching.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointerError {
    /// Pointer string does not follow RFC 6901 syntax
    #[error("malformed pointer \"{0}\": must be \"\" or start with '/'")]
    Malformed(String),
    /// Pointer is syntactically fine but cannot be applied to the document
    #[error("invalid path \"{pointer}\": {reason}")]
    InvalidPath { pointer: String, reason: String },
}

/// Immutable sequence of reference tokens addressing one node.
///
/// The empty pointer addresses the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pointer {
    tokens: Vec<String>,
}

impl Pointer {
    /// Pointer to the whole document.
    #[must_use]
    pub fn root() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Parse an RFC 6901 pointer string (`""` or `/a/b/0`), unescaping
    /// `~1` to `/` and `~0` to `~` in each token.
    ///
    /// # Errors
    ///
    /// Returns [`PointerError::Malformed`] when a non-empty string does
    /// not start with `/`.
    pub fn parse(raw: &str) -> Result<Self, PointerError> {
        if raw.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = raw.strip_prefix('/') else {
            return Err(PointerError::Malformed(raw.to_string()));
        };
        Ok(Self {
            tokens: rest.split('/').map(unescape_token).collect(),
        })
    }

    /// Build a pointer from decoded tokens.
    pub fn from_tokens<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Encoded RFC 6901 string form. Round-trips through [`Pointer::parse`].
    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            out.push('/');
            out.push_str(&escape_token(token));
        }
        out
    }

    /// Decoded tokens, in order.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Child pointer with one more token. Used by traversal to build
    /// addresses while walking a document.
    #[must_use]
    pub fn append(&self, token: impl Into<String>) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token.into());
        Self { tokens }
    }

    /// Resolve the pointer against a document. A mapping token must
    /// match an existing key; a sequence token must be a non-negative
    /// base-10 integer within bounds. Any mismatch yields `None`.
    #[must_use]
    pub fn get<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        let mut current = document;
        for token in &self.tokens {
            current = match current {
                Value::Object(map) => map.get(token)?,
                Value::Array(items) => items.get(parse_index(token)?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Whether the pointer resolves to any value.
    #[must_use]
    pub fn exists(&self, document: &Value) -> bool {
        self.get(document).is_some()
    }

    /// Structurally new document with the addressed leaf set to `value`.
    /// Containers along the path are copied, never mutated; the final
    /// mapping key may be new, intermediate segments must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`PointerError::InvalidPath`] when an intermediate
    /// segment does not address an existing container.
    pub fn with_value(&self, document: &Value, value: Value) -> Result<Value, PointerError> {
        set_at(document, &self.tokens, value).map_err(|reason| self.invalid(reason))
    }

    /// Structurally new document with the addressed leaf removed: the
    /// key is deleted from a mapping, the element is removed (not
    /// nulled) from a sequence.
    ///
    /// # Errors
    ///
    /// Returns [`PointerError::InvalidPath`] when the path does not
    /// exist, or when the pointer is the root pointer.
    pub fn without(&self, document: &Value) -> Result<Value, PointerError> {
        remove_at(document, &self.tokens).map_err(|reason| self.invalid(reason))
    }

    fn invalid(&self, reason: String) -> PointerError {
        PointerError::InvalidPath {
            pointer: self.encode(),
            reason,
        }
    }
}

impl std::fmt::Display for Pointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl std::str::FromStr for Pointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn unescape_token(token: &str) -> String {
    // ~1 first: decoding ~0 first would turn "~01" into "/"
    token.replace("~1", "/").replace("~0", "~")
}

fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn parse_index(token: &str) -> Option<usize> {
    // RFC 6901: no leading zeros, no sign
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn set_at(document: &Value, tokens: &[String], value: Value) -> Result<Value, String> {
    let Some((token, rest)) = tokens.split_first() else {
        return Ok(value);
    };

    match document {
        Value::Object(map) => {
            let mut copy = map.clone();
            if rest.is_empty() {
                copy.insert(token.clone(), value);
            } else {
                let child = map
                    .get(token)
                    .ok_or_else(|| format!("intermediate key \"{token}\" does not exist"))?;
                copy.insert(token.clone(), set_at(child, rest, value)?);
            }
            Ok(Value::Object(copy))
        }
        Value::Array(items) => {
            let index = parse_index(token)
                .filter(|i| *i < items.len())
                .ok_or_else(|| format!("\"{token}\" is not an index of the sequence"))?;
            let mut copy = items.clone();
            copy[index] = set_at(&items[index], rest, value)?;
            Ok(Value::Array(copy))
        }
        other => Err(format!(
            "segment \"{token}\" addresses a {} instead of a container",
            kind_name(other)
        )),
    }
}

fn remove_at(document: &Value, tokens: &[String]) -> Result<Value, String> {
    let Some((token, rest)) = tokens.split_first() else {
        return Err("cannot remove the whole document".to_string());
    };

    match document {
        Value::Object(map) => {
            let child = map
                .get(token)
                .ok_or_else(|| format!("key \"{token}\" does not exist"))?;
            let mut copy = map.clone();
            if rest.is_empty() {
                copy.remove(token);
            } else {
                copy.insert(token.clone(), remove_at(child, rest)?);
            }
            Ok(Value::Object(copy))
        }
        Value::Array(items) => {
            let index = parse_index(token)
                .filter(|i| *i < items.len())
                .ok_or_else(|| format!("\"{token}\" is not an index of the sequence"))?;
            let mut copy = items.clone();
            if rest.is_empty() {
                copy.remove(index);
            } else {
                copy[index] = remove_at(&items[index], rest)?;
            }
            Ok(Value::Array(copy))
        }
        other => Err(format!(
            "segment \"{token}\" addresses a {} instead of a container",
            kind_name(other)
        )),
    }
}

pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
