//! Failure kinds raised by request execution and response assertions
//!
//! Every assertion fails fast at the first divergence and carries the
//! offending pointer plus both sides of the comparison, so the failing
//! field can be localized without re-running with extra instrumentation.

use apicheck_core::catalog::CatalogError;
use apicheck_core::compare::Diff;
use apicheck_core::pointer::Pointer;

use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("path template \"{template}\" has no value for placeholder \"{name}\"")]
    MissingPathParam { template: String, name: String },

    #[error("\"{method}\" is not a valid HTTP method")]
    InvalidMethod { method: String },

    #[error("expected status code {expected}, got {actual}")]
    UnexpectedStatusCode { expected: u16, actual: u16 },

    #[error("response body does not match schema: {detail}")]
    SchemaViolation { detail: String },

    #[error("header \"{name}\": {detail}")]
    HeaderMismatch { name: String, detail: String },

    #[error("response body mismatch: {0}")]
    BodyMismatch(Diff),

    #[error("no value at \"{0}\" in the response body")]
    FieldNotFound(Pointer),

    #[error("unexpected response body: {detail}")]
    UnexpectedBody { detail: String },

    #[error("no {0} declared for this request, pass an explicit expectation")]
    MissingExpectation(&'static str),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
