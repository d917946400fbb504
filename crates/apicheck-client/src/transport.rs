//! HTTP transport boundary
//!
//! Overlays render into a [`TransportRequest`] and hand it to an
//! [`HttpTransport`]. The trait keeps assertions testable against a
//! stub; [`ReqwestTransport`] is the production implementation. Errors
//! at this level are transport failures, never assertion failures.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

/// Request body as rendered by an overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

/// A fully rendered request, ready to send.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: String,
    /// Path with all placeholders substituted, relative to the base URL
    pub path: String,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub body: Option<Payload>,
}

/// The raw result of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Blocking HTTP collaborator contract.
pub trait HttpTransport {
    /// Send one request and return the raw exchange result.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] for connection, TLS, or protocol
    /// failures. Non-2xx status codes are not errors at this level.
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Production transport over `reqwest::blocking`.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Build a transport rooted at `base_url` with a 10 second timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the underlying client cannot
    /// be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| TransportError::Http(format!("invalid method '{}'", request.method)))?;
        let url = format!("{}{}", self.base_url, request.path);

        let mut req = self.client.request(method, &url);
        for (k, v) in &request.headers {
            // Skip header values that are invalid in HTTP (e.g. \0, \r\n);
            // these never reach the server anyway.
            if reqwest::header::HeaderValue::from_str(v).is_ok() {
                req = req.header(k, v);
            }
        }
        for (k, v) in &request.query {
            req = req.query(&[(k, v)]);
        }
        match &request.body {
            Some(Payload::Json(value)) => {
                req = req.header("Content-Type", "application/json");
                req = req.json(value);
            }
            Some(Payload::Text(text)) => {
                req = req.body(text.clone());
            }
            None => {}
        }

        let resp = req.send().map_err(|e| TransportError::Http(e.to_string()))?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).to_string(),
                )
            })
            .collect();
        let body = resp
            .text()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
