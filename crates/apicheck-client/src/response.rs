//! Response envelope and the fluent assertion surface over it
//!
//! `perform` wraps the raw exchange into a [`ResponseEnvelope`] and
//! returns a [`ResponseAssertion`] carrying the request's declared
//! expectations. Every assertion returns `Result<&Self, CheckError>`,
//! so calls chain with `?` and fail fast at the first divergence.

use std::collections::HashMap;

use apicheck_core::catalog::ExpectedResponse;
use apicheck_core::compare::{self, CompareError, Expected};
use apicheck_core::matcher::Matcher;
use apicheck_core::pointer::Pointer;
use serde_json::Value;

use crate::error::CheckError;
use crate::transport::TransportResponse;

/// One received response: status, headers, body text, and the body
/// parsed as JSON when it is JSON. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
    json: Option<Value>,
}

impl ResponseEnvelope {
    /// Wrap a raw exchange result, parsing the body as JSON if it is.
    #[must_use]
    pub fn from_transport(response: TransportResponse) -> Self {
        let json = serde_json::from_str(&response.body).ok();
        Self {
            status: response.status,
            headers: response.headers,
            body: response.body,
            json,
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }
}

/// Assertion entry point for one response.
#[derive(Debug)]
pub struct ResponseAssertion {
    envelope: ResponseEnvelope,
    expected: ExpectedResponse,
    schema: Option<Value>,
}

impl ResponseAssertion {
    #[must_use]
    pub fn new(envelope: ResponseEnvelope, expected: ExpectedResponse, schema: Option<Value>) -> Self {
        Self {
            envelope,
            expected,
            schema,
        }
    }

    #[must_use]
    pub fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.envelope.status
    }

    /// Compare the status code against an explicit value, or the
    /// catalog-declared expectation when `None`.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckError::UnexpectedStatusCode`].
    pub fn status_code_equals(&self, code: Option<u16>) -> Result<&Self, CheckError> {
        let expected = code.unwrap_or(self.expected.status_code);
        if self.envelope.status != expected {
            return Err(CheckError::UnexpectedStatusCode {
                expected,
                actual: self.envelope.status,
            });
        }
        Ok(self)
    }

    /// Validate the JSON body against the request's resolved schema.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckError::SchemaViolation`] carrying the
    /// validator's detail, and [`CheckError::MissingExpectation`] if
    /// the request declares no `schema_ref`.
    pub fn validates_against_schema(&self) -> Result<&Self, CheckError> {
        let schema = self
            .schema
            .as_ref()
            .ok_or(CheckError::MissingExpectation("schema"))?;
        let body = self.envelope.json().ok_or(CheckError::SchemaViolation {
            detail: "response body is not valid JSON".to_string(),
        })?;

        let validator = jsonschema::validator_for(schema).map_err(|e| {
            CheckError::SchemaViolation {
                detail: e.to_string(),
            }
        })?;
        let errors: Vec<String> = validator
            .iter_errors(body)
            .take(5)
            .map(|e| e.to_string())
            .collect();
        if !errors.is_empty() {
            return Err(CheckError::SchemaViolation {
                detail: errors.join("; "),
            });
        }
        Ok(self)
    }

    /// Assert the body carries no content at all.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckError::UnexpectedBody`].
    pub fn is_empty(&self) -> Result<&Self, CheckError> {
        if !self.envelope.body.is_empty() {
            return Err(CheckError::UnexpectedBody {
                detail: format!("expected empty body, got {} bytes", self.envelope.body.len()),
            });
        }
        Ok(self)
    }

    /// Assert the body carries content.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckError::UnexpectedBody`].
    pub fn is_not_empty(&self) -> Result<&Self, CheckError> {
        if self.envelope.body.is_empty() {
            return Err(CheckError::UnexpectedBody {
                detail: "expected non-empty body".to_string(),
            });
        }
        Ok(self)
    }

    /// Extract an owned value from the JSON body, for chaining into a
    /// later request.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckError::FieldNotFound`] if the pointer does not
    /// resolve or the body is not JSON.
    pub fn get_json_value(&self, pointer: &Pointer) -> Result<Value, CheckError> {
        self.envelope
            .json()
            .and_then(|body| pointer.get(body))
            .cloned()
            .ok_or_else(|| CheckError::FieldNotFound(pointer.clone()))
    }

    /// Assert every pointer resolves in the JSON body.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckError::FieldNotFound`] naming the first absent
    /// pointer.
    pub fn params_present(&self, pointers: &[Pointer]) -> Result<&Self, CheckError> {
        for pointer in pointers {
            self.get_json_value(pointer)?;
        }
        Ok(self)
    }

    /// Assert none of the pointers resolve in the JSON body.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckError::UnexpectedBody`] naming the first
    /// pointer that is unexpectedly present.
    pub fn params_not_present(&self, pointers: &[Pointer]) -> Result<&Self, CheckError> {
        for pointer in pointers {
            if self.envelope.json().is_some_and(|body| pointer.exists(body)) {
                return Err(CheckError::UnexpectedBody {
                    detail: format!("field \"{pointer}\" unexpectedly present"),
                });
            }
        }
        Ok(self)
    }

    /// Header assertions.
    #[must_use]
    pub fn headers(&self) -> HeaderAssertions<'_> {
        HeaderAssertions { assertion: self }
    }

    /// JSON body assertions.
    #[must_use]
    pub fn json(&self) -> JsonAssertions<'_> {
        JsonAssertions { assertion: self }
    }
}

/// Header-level assertions, chained back to the parent assertion.
pub struct HeaderAssertions<'a> {
    assertion: &'a ResponseAssertion,
}

impl<'a> HeaderAssertions<'a> {
    /// Subset comparison of response headers, matcher-aware. With no
    /// explicit expectation, the catalog's declared headers are used as
    /// exact-value matchers. Only the expected names are checked.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckError::HeaderMismatch`] naming the first
    /// missing or diverging header.
    pub fn are_like(
        &self,
        expected: Option<&HashMap<String, Matcher>>,
    ) -> Result<&'a ResponseAssertion, CheckError> {
        let declared: HashMap<String, Matcher>;
        let expected = match expected {
            Some(expected) => expected,
            None => {
                declared = self
                    .assertion
                    .expected
                    .headers
                    .iter()
                    .map(|(name, value)| {
                        (name.clone(), Matcher::ExactValue(Value::String(value.clone())))
                    })
                    .collect();
                &declared
            }
        };

        let mut names: Vec<&String> = expected.keys().collect();
        names.sort_unstable();
        for name in names {
            let matcher = &expected[name];
            match self.assertion.envelope.header(name) {
                None => {
                    return Err(CheckError::HeaderMismatch {
                        name: name.clone(),
                        detail: format!("missing, expected {}", matcher.describe()),
                    });
                }
                Some(actual) => {
                    let actual = Value::String(actual.to_string());
                    if !matcher.matches(&actual) {
                        return Err(CheckError::HeaderMismatch {
                            name: name.clone(),
                            detail: matcher.explain_mismatch(&actual),
                        });
                    }
                }
            }
        }
        Ok(self.assertion)
    }

    /// Assert each named header is present, value unconstrained.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckError::HeaderMismatch`].
    pub fn present(&self, names: &[&str]) -> Result<&'a ResponseAssertion, CheckError> {
        for name in names {
            if self.assertion.envelope.header(name).is_none() {
                return Err(CheckError::HeaderMismatch {
                    name: (*name).to_string(),
                    detail: "missing".to_string(),
                });
            }
        }
        Ok(self.assertion)
    }

    /// Assert a header carries exactly this value.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckError::HeaderMismatch`].
    pub fn header_equals(&self, name: &str, value: &str) -> Result<&'a ResponseAssertion, CheckError> {
        match self.assertion.envelope.header(name) {
            Some(actual) if actual == value => Ok(self.assertion),
            Some(actual) => Err(CheckError::HeaderMismatch {
                name: name.to_string(),
                detail: format!("expected \"{value}\", got \"{actual}\""),
            }),
            None => Err(CheckError::HeaderMismatch {
                name: name.to_string(),
                detail: format!("missing, expected \"{value}\""),
            }),
        }
    }

    /// Assert a header's value contains the substring.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckError::HeaderMismatch`].
    pub fn header_contains(
        &self,
        name: &str,
        substr: &str,
    ) -> Result<&'a ResponseAssertion, CheckError> {
        match self.assertion.envelope.header(name) {
            Some(actual) if actual.contains(substr) => Ok(self.assertion),
            Some(actual) => Err(CheckError::HeaderMismatch {
                name: name.to_string(),
                detail: format!("expected to contain \"{substr}\", got \"{actual}\""),
            }),
            None => Err(CheckError::HeaderMismatch {
                name: name.to_string(),
                detail: format!("missing, expected to contain \"{substr}\""),
            }),
        }
    }
}

/// JSON body assertions, chained back to the parent assertion.
pub struct JsonAssertions<'a> {
    assertion: &'a ResponseAssertion,
}

impl<'a> JsonAssertions<'a> {
    /// Strict structural comparison of the whole body. With no explicit
    /// expectation, the catalog's canonical response body is used.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckError::BodyMismatch`] carrying the first
    /// divergence pointer, [`CheckError::UnexpectedBody`] if the body
    /// is not JSON, and [`CheckError::MissingExpectation`] when neither
    /// an explicit nor a declared expectation exists.
    pub fn equals(&self, expected: Option<&Expected>) -> Result<&'a ResponseAssertion, CheckError> {
        let declared: Expected;
        let expected = match expected {
            Some(expected) => expected,
            None => {
                let canonical = self
                    .assertion
                    .expected
                    .json
                    .as_ref()
                    .ok_or(CheckError::MissingExpectation("canonical response body"))?;
                declared = Expected::from(canonical.clone());
                &declared
            }
        };
        let actual = self.body()?;
        compare::equals(expected, actual).map_err(CheckError::BodyMismatch)?;
        Ok(self.assertion)
    }

    /// Targeted comparison of the subtree at `pointer` only; the rest
    /// of the body is ignored.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckError::FieldNotFound`] if the pointer does not
    /// resolve and [`CheckError::BodyMismatch`] on divergence.
    pub fn param_equals(
        &self,
        pointer: &Pointer,
        expected: &Expected,
    ) -> Result<&'a ResponseAssertion, CheckError> {
        let actual = self.body()?;
        compare::param_equals(pointer, expected, actual).map_err(|e| match e {
            CompareError::FieldNotFound(pointer) => CheckError::FieldNotFound(pointer),
            CompareError::Mismatch(diff) => CheckError::BodyMismatch(diff),
        })?;
        Ok(self.assertion)
    }

    fn body(&self) -> Result<&'a Value, CheckError> {
        self.assertion
            .envelope
            .json()
            .ok_or_else(|| CheckError::UnexpectedBody {
                detail: "response body is not valid JSON".to_string(),
            })
    }
}
