//! Request identity and per-request context.
//!
//! # Responsibilities
//! - Resolve the request ID (inbound `X-Request-Id` or a fresh UUID v4)
//! - Carry method, path, parsed body and start time through dispatch
//!
//! # Design Decisions
//! - Request ID resolved as early as possible for tracing
//! - A supplied ID is propagated byte-for-byte; an empty one is replaced

use std::fmt;
use std::time::Instant;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;
use uuid::Uuid;

/// Header carrying the request ID in both directions.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Opaque trace token correlating one request's logs and response header.
///
/// An inbound header is kept as received and echoed unchanged; the text form
/// (lossy for non-UTF-8 bytes) is what logs and envelopes see.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId {
    text: String,
    inbound: Option<HeaderValue>,
}

impl RequestId {
    /// Generate a new UUID v4 request ID.
    pub fn generate() -> Self {
        Self {
            text: Uuid::new_v4().to_string(),
            inbound: None,
        }
    }

    /// Take the inbound `X-Request-Id` when present and non-empty, else generate one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(&X_REQUEST_ID)
            .filter(|v| !v.is_empty())
            .map(|v| Self {
                text: String::from_utf8_lossy(v.as_bytes()).into_owned(),
                inbound: Some(v.clone()),
            })
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Header value for the response: the inbound bytes when supplied.
    pub fn header_value(&self) -> Option<HeaderValue> {
        match &self.inbound {
            Some(value) => Some(value.clone()),
            None => HeaderValue::from_str(&self.text).ok(),
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Everything a handler knows about the request it is serving.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub method: Method,
    /// URI path with the query string removed.
    pub path: String,
    /// Parsed (and, when the route has a schema, validated) JSON body.
    pub body: Option<Value>,
    pub user_agent: Option<String>,
    /// Monotonic timestamp sampled at dispatch entry.
    pub started: Instant,
}

impl RequestContext {
    pub fn new(request_id: RequestId, method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id,
            method,
            path: path.into(),
            body: None,
            user_agent: None,
            started: Instant::now(),
        }
    }
}
