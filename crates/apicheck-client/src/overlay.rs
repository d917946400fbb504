//! Per-test working copies of catalog request templates
//!
//! `by_name` hands each test its own overlay: a deep copy of the
//! template's mutable fields plus the declared expected outcome. The
//! fluent `with_*` calls take and return the overlay by value, so a
//! test owns its overlay exclusively and `perform` consumes it. Merge
//! slots (headers, query, cookies, path params) accumulate across
//! calls; method, body, and expected status replace wholesale.

use std::collections::HashMap;

use apicheck_core::catalog::{ExpectedResponse, RequestCatalog, RequestDefinition};
use serde_json::Value;

use crate::error::CheckError;
use crate::response::{ResponseAssertion, ResponseEnvelope};
use crate::transport::{HttpTransport, Payload, TransportRequest};

/// Look up a catalog template and open a fresh overlay on it.
///
/// # Errors
///
/// Fails on unknown request names and on `schema_ref` entries that
/// resolve to nothing in the catalog's schema table.
pub fn by_name(catalog: &RequestCatalog, name: &str) -> Result<RequestOverlay, CheckError> {
    let definition = catalog.by_name(name)?;
    let schema = match &definition.expected.schema_ref {
        Some(reference) => Some(catalog.schema(reference)?.clone()),
        None => None,
    };
    Ok(RequestOverlay::new(definition.clone(), schema))
}

/// A request template plus accumulated per-test overrides.
#[derive(Debug, Clone)]
pub struct RequestOverlay {
    method: String,
    path: String,
    path_params: HashMap<String, String>,
    headers: HashMap<String, String>,
    query: HashMap<String, String>,
    cookies: HashMap<String, String>,
    body: Option<Payload>,
    expected: ExpectedResponse,
    schema: Option<Value>,
}

impl RequestOverlay {
    /// Open an overlay directly on a definition, resolving no schema.
    /// Tests that build definitions inline use this; suites loading a
    /// catalog go through [`by_name`].
    #[must_use]
    pub fn new(definition: RequestDefinition, schema: Option<Value>) -> Self {
        let body = definition.body.map(|value| match value {
            Value::String(text) => Payload::Text(text),
            other => Payload::Json(other),
        });
        Self {
            method: definition.method,
            path: definition.path,
            path_params: HashMap::new(),
            headers: definition.headers,
            query: definition.query,
            cookies: HashMap::new(),
            body,
            expected: definition.expected,
            schema,
        }
    }

    /// Replace the HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Merge values for the path template's `{placeholder}` segments.
    #[must_use]
    pub fn with_path_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        for (name, value) in params {
            self.path_params.insert(name.into(), value.to_string());
        }
        self
    }

    /// Merge query parameters on top of the template's defaults.
    #[must_use]
    pub fn with_query_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        for (name, value) in params {
            self.query.insert(name.into(), value.to_string());
        }
        self
    }

    /// Merge headers on top of the template's defaults.
    #[must_use]
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.headers.insert(name.into(), value.into());
        }
        self
    }

    /// Merge cookies, rendered into a `Cookie` header at send time.
    #[must_use]
    pub fn with_cookies<I, K, V>(mut self, cookies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in cookies {
            self.cookies.insert(name.into(), value.into());
        }
        self
    }

    /// Replace the body with a JSON document.
    #[must_use]
    pub fn with_json_payload(mut self, payload: Value) -> Self {
        self.body = Some(Payload::Json(payload));
        self
    }

    /// Replace the body with raw text.
    #[must_use]
    pub fn with_text_payload(mut self, payload: impl Into<String>) -> Self {
        self.body = Some(Payload::Text(payload.into()));
        self
    }

    /// Replace the expected status code.
    #[must_use]
    pub fn with_expected_status(mut self, status_code: u16) -> Self {
        self.expected.status_code = status_code;
        self
    }

    /// Send the request and fail fast unless the actual status code
    /// equals the expected one. Consumes the overlay.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckError::MissingPathParam`] before sending,
    /// [`CheckError::Transport`] on exchange failure, and
    /// [`CheckError::UnexpectedStatusCode`] on a status divergence.
    pub fn perform<T: HttpTransport>(self, transport: &T) -> Result<ResponseAssertion, CheckError> {
        let expected_status = self.expected.status_code;
        let assertion = self.perform_unchecked(transport)?;
        let actual = assertion.status_code();
        if actual != expected_status {
            return Err(CheckError::UnexpectedStatusCode {
                expected: expected_status,
                actual,
            });
        }
        Ok(assertion)
    }

    /// Send the request without the status code gate, for tests that
    /// assert on error responses explicitly.
    ///
    /// # Errors
    ///
    /// Same as [`RequestOverlay::perform`], minus the status check.
    pub fn perform_unchecked<T: HttpTransport>(
        self,
        transport: &T,
    ) -> Result<ResponseAssertion, CheckError> {
        if !is_valid_method(&self.method) {
            return Err(CheckError::InvalidMethod {
                method: self.method,
            });
        }
        let path = render_path(&self.path, &self.path_params)?;

        let mut headers = self.headers;
        if !self.cookies.is_empty() {
            headers.insert("Cookie".to_string(), render_cookies(&self.cookies));
        }

        let request = TransportRequest {
            method: self.method,
            path,
            headers,
            query: self.query,
            body: self.body,
        };
        let response = transport.send(&request)?;
        let envelope = ResponseEnvelope::from_transport(response);
        Ok(ResponseAssertion::new(envelope, self.expected, self.schema))
    }
}

fn is_valid_method(method: &str) -> bool {
    !method.is_empty() && method.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Substitute every `{placeholder}` in the template.
fn render_path(template: &str, params: &HashMap<String, String>) -> Result<String, CheckError> {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            // Unterminated brace, keep the tail literally
            rendered.push_str(&rest[start..]);
            return Ok(rendered);
        };
        let name = &after[..end];
        let value = params
            .get(name)
            .ok_or_else(|| CheckError::MissingPathParam {
                template: template.to_string(),
                name: name.to_string(),
            })?;
        rendered.push_str(value);
        rest = &after[end + 1..];
    }
    rendered.push_str(rest);
    Ok(rendered)
}

fn render_cookies(cookies: &HashMap<String, String>) -> String {
    let mut pairs: Vec<String> = cookies.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort_unstable();
    pairs.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn definition() -> RequestDefinition {
        RequestDefinition {
            name: "GetBookingById".to_string(),
            method: "GET".to_string(),
            path: "/booking/{id}".to_string(),
            headers: HashMap::from([("Accept".to_string(), "application/json".to_string())]),
            query: HashMap::new(),
            body: None,
            expected: ExpectedResponse {
                status_code: 200,
                headers: HashMap::new(),
                schema_ref: None,
                json: None,
            },
        }
    }

    #[test]
    fn render_path_substitutes_placeholders() {
        let path = render_path("/booking/{id}", &params(&[("id", "42")])).unwrap();
        assert_eq!(path, "/booking/42");

        let path = render_path(
            "/users/{user}/orders/{order}",
            &params(&[("user", "7"), ("order", "9")]),
        )
        .unwrap();
        assert_eq!(path, "/users/7/orders/9");
    }

    #[test]
    fn render_path_without_placeholders_is_identity() {
        assert_eq!(render_path("/ping", &params(&[])).unwrap(), "/ping");
    }

    #[test]
    fn missing_path_param_is_reported_by_name() {
        let err = render_path("/booking/{id}", &params(&[])).unwrap_err();
        assert!(matches!(
            err,
            CheckError::MissingPathParam { name, .. } if name == "id"
        ));
    }

    #[test]
    fn extra_path_params_are_ignored() {
        let path = render_path("/ping", &params(&[("id", "42")])).unwrap();
        assert_eq!(path, "/ping");
    }

    #[test]
    fn header_overrides_merge_with_defaults() {
        let overlay = RequestOverlay::new(definition(), None)
            .with_headers([("X-Token", "abc")])
            .with_headers([("X-Trace", "t1")]);

        assert_eq!(overlay.headers.len(), 3);
        assert_eq!(overlay.headers.get("Accept").unwrap(), "application/json");
        assert_eq!(overlay.headers.get("X-Token").unwrap(), "abc");
    }

    #[test]
    fn later_header_override_wins_for_same_name() {
        let overlay = RequestOverlay::new(definition(), None)
            .with_headers([("X-Token", "old")])
            .with_headers([("X-Token", "new")]);
        assert_eq!(overlay.headers.get("X-Token").unwrap(), "new");
    }

    #[test]
    fn json_payload_replaces_wholesale() {
        let overlay = RequestOverlay::new(definition(), None)
            .with_json_payload(json!({"a": 1}))
            .with_json_payload(json!({"b": 2}));
        assert_eq!(overlay.body, Some(Payload::Json(json!({"b": 2}))));
    }

    #[test]
    fn string_body_in_definition_becomes_text_payload() {
        let mut def = definition();
        def.body = Some(json!("plain text"));
        let overlay = RequestOverlay::new(def, None);
        assert_eq!(overlay.body, Some(Payload::Text("plain text".to_string())));
    }

    #[test]
    fn path_params_accept_numeric_values() {
        let overlay = RequestOverlay::new(definition(), None).with_path_params([("id", 42)]);
        assert_eq!(overlay.path_params.get("id").unwrap(), "42");
    }

    #[test]
    fn cookies_render_sorted() {
        let rendered = render_cookies(&params(&[("session", "s1"), ("lang", "en")]));
        assert_eq!(rendered, "lang=en; session=s1");
    }

    #[test]
    fn expected_status_replaces() {
        let overlay = RequestOverlay::new(definition(), None).with_expected_status(404);
        assert_eq!(overlay.expected.status_code, 404);
    }
}
