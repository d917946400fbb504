//! Named request templates and the schema table they reference
//!
//! A catalog file declares the requests a test suite may send, each
//! with its method, path template, defaults, and expected outcome, plus
//! a `schemas` table that `schema_ref` entries resolve against. The
//! catalog is loaded once and read many times; tests never mutate it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One catalog entry: an immutable request template.
///
/// ```yaml
/// name: GetBookingById
/// method: GET
/// path: /booking/{id}
/// expected:
///   status_code: 200
///   schema_ref: booking
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RequestDefinition {
    pub name: String,
    pub method: String,
    /// Path template with `{placeholder}` segments
    pub path: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub query: HashMap<String, String>,
    /// Default body; a JSON document, or a string for raw text payloads
    #[serde(default)]
    pub body: Option<Value>,
    pub expected: ExpectedResponse,
}

/// Declared outcome of a request, used as the default for assertions.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ExpectedResponse {
    pub status_code: u16,
    /// Headers the response must carry (subset check, not exhaustive)
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Name in the catalog's `schemas` table to validate the body against
    #[serde(default)]
    pub schema_ref: Option<String>,
    /// Canonical response body for strict structural comparison
    #[serde(default)]
    pub json: Option<Value>,
}

/// Serde model of the catalog document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
struct CatalogFile {
    #[serde(default)]
    requests: Vec<RequestDefinition>,
    #[serde(default)]
    schemas: HashMap<String, Value>,
}

/// Generate JSON Schema for the catalog file format.
#[must_use]
pub fn catalog_schema() -> String {
    let schema = schemars::schema_for!(CatalogFile);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("no request named \"{0}\" in the catalog")]
    UnknownRequest(String),
    #[error("no schema named \"{0}\" in the catalog")]
    UnknownSchema(String),
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Read-only `name -> RequestDefinition` lookup plus the schema table.
#[derive(Debug, Clone, Default)]
pub struct RequestCatalog {
    requests: HashMap<String, RequestDefinition>,
    schemas: HashMap<String, Value>,
}

impl RequestCatalog {
    /// Build a catalog from already-parsed definitions, mostly for tests.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] on duplicate request names.
    pub fn from_definitions<I>(definitions: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = RequestDefinition>,
    {
        let mut requests = HashMap::new();
        for definition in definitions {
            let name = definition.name.clone();
            if requests.insert(name.clone(), definition).is_some() {
                return Err(CatalogError::Parse(format!(
                    "duplicate request name \"{name}\""
                )));
            }
        }
        Ok(Self {
            requests,
            schemas: HashMap::new(),
        })
    }

    /// Attach or replace the schema table.
    #[must_use]
    pub fn with_schemas(mut self, schemas: HashMap<String, Value>) -> Self {
        self.schemas = schemas;
        self
    }

    /// Load a catalog from a JSON, YAML, or TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read and
    /// [`CatalogError::Parse`] if it does not parse as a catalog.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Io(path.to_path_buf(), e.to_string()))?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, CatalogError> {
        let file = parse_catalog(path, content)?;
        let schemas = file.schemas.clone();
        Ok(Self::from_definitions(file.requests)?.with_schemas(schemas))
    }

    /// Look up a request template by name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownRequest`] if absent.
    pub fn by_name(&self, name: &str) -> Result<&RequestDefinition, CatalogError> {
        self.requests
            .get(name)
            .ok_or_else(|| CatalogError::UnknownRequest(name.to_string()))
    }

    /// Resolve a `schema_ref` against the schema table.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownSchema`] if absent.
    pub fn schema(&self, reference: &str) -> Result<&Value, CatalogError> {
        self.schemas
            .get(reference)
            .ok_or_else(|| CatalogError::UnknownSchema(reference.to_string()))
    }

    /// Request names, sorted for stable listings.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.requests.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Parse a catalog document from JSON, YAML, or TOML.
///
/// Detection strategy: try extension first (`.yaml`/`.yml`/`.toml`/`.json`),
/// then fall back to content sniffing (leading `{` → JSON, otherwise YAML).
fn parse_catalog(path: &Path, content: &str) -> Result<CatalogFile, CatalogError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "yaml" | "yml" => serde_yml::from_str(content)
            .map_err(|e| CatalogError::Parse(format!("Invalid YAML: {e}"))),
        "toml" => {
            toml::from_str(content).map_err(|e| CatalogError::Parse(format!("Invalid TOML: {e}")))
        }
        "json" => serde_json::from_str(content)
            .map_err(|e| CatalogError::Parse(format!("Invalid JSON: {e}"))),
        _ => {
            // Content sniffing: trimmed first char
            if content.trim_start().starts_with('{') {
                serde_json::from_str(content)
                    .map_err(|e| CatalogError::Parse(format!("Invalid JSON: {e}")))
            } else {
                serde_yml::from_str(content)
                    .map_err(|e| CatalogError::Parse(format!("Invalid YAML: {e}")))
            }
        }
    }
}
