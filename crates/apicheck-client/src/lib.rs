//! apicheck-client: Request execution and response assertions
//!
//! This crate turns catalog templates from `apicheck-core` into HTTP
//! requests and wraps the responses in a fluent assertion surface.
//! The transport is a trait, so suites run against a stub in tests and
//! `reqwest` in production.

pub mod error;
pub mod overlay;
pub mod response;
pub mod transport;

pub use error::CheckError;
pub use overlay::{RequestOverlay, by_name};
pub use response::{HeaderAssertions, JsonAssertions, ResponseAssertion, ResponseEnvelope};
pub use transport::{
    HttpTransport, Payload, ReqwestTransport, TransportError, TransportRequest, TransportResponse,
};
