//! Response envelopes.
//!
//! # Responsibilities
//! - Format success `{success:true, data, meta}` and error
//!   `{success:false, error, meta}` envelopes
//! - Stamp `meta.timestamp` (ISO-8601 UTC) and `meta.requestId`
//! - Render handler [`Reply`] values into HTTP responses

use std::borrow::Cow;

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::http::request::RequestId;

const APPLICATION_JSON: &str = "application/json";
const TEXT_PLAIN: &str = "text/plain";

/// Current time as ISO-8601 UTC with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Envelope metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Meta {
    fn new(request_id: Option<&str>, mut extra: Map<String, Value>) -> Self {
        extra.remove("timestamp");
        extra.remove("requestId");
        Self {
            timestamp: timestamp(),
            request_id: request_id.map(str::to_owned),
            extra,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SuccessEnvelope<T> {
    pub success: bool,
    pub data: T,
    pub meta: Meta,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
    pub meta: Meta,
}

/// Parameters for [`send_error`].
#[derive(Debug, Clone)]
pub struct ErrorOptions {
    pub status: StatusCode,
    pub message: String,
    pub code: Option<String>,
    pub details: Option<Value>,
    pub stack: Option<String>,
    pub request_id: Option<String>,
}

impl ErrorOptions {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
            details: None,
            stack: None,
            request_id: None,
        }
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }

    pub fn stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }

    pub fn request_id(mut self, request_id: &RequestId) -> Self {
        self.request_id = Some(request_id.as_str().to_owned());
        self
    }
}

/// Standard success envelope.
pub fn send_success<T: Serialize>(
    status: StatusCode,
    data: T,
    request_id: Option<&str>,
    meta: Map<String, Value>,
) -> Response {
    let envelope = SuccessEnvelope {
        success: true,
        data,
        meta: Meta::new(request_id, meta),
    };
    json_response(status, &envelope)
}

/// Standard error envelope.
pub fn send_error(options: ErrorOptions) -> Response {
    let envelope = ErrorEnvelope {
        success: false,
        error: ErrorBody {
            message: options.message,
            code: options.code,
            details: options.details,
            stack: options.stack,
        },
        meta: Meta::new(options.request_id.as_deref(), Map::new()),
    };
    json_response(options.status, &envelope)
}

/// Serialize `body` as JSON. A serialization failure is logged and
/// replaced by a bare 500 so the caller still gets exactly one response.
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (status, [(header::CONTENT_TYPE, APPLICATION_JSON)], bytes).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            let mut response = Response::new(Body::from("Internal server error"));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

/// Plain-text response with `Content-Type: text/plain`.
pub fn send_text(status: StatusCode, body: impl Into<Body>) -> Response {
    (status, [(header::CONTENT_TYPE, TEXT_PLAIN)], body.into()).into_response()
}

/// What a route handler produced.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Plain text, no envelope.
    Text {
        status: StatusCode,
        body: Cow<'static, str>,
    },
    /// Raw JSON, no envelope.
    Json { status: StatusCode, body: Value },
    /// Success envelope around `data`.
    Success {
        status: StatusCode,
        data: Value,
        meta: Map<String, Value>,
    },
    /// Error envelope written directly, without going through the error handler.
    Failure {
        status: StatusCode,
        message: String,
        code: Option<String>,
    },
}

impl Reply {
    pub fn text(body: impl Into<Cow<'static, str>>) -> Self {
        Reply::Text {
            status: StatusCode::OK,
            body: body.into(),
        }
    }

    pub fn json(body: Value) -> Self {
        Reply::Json {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn success(data: Value) -> Self {
        Reply::Success {
            status: StatusCode::OK,
            data,
            meta: Map::new(),
        }
    }

    pub fn created(data: Value) -> Self {
        Reply::Success {
            status: StatusCode::CREATED,
            data,
            meta: Map::new(),
        }
    }

    pub fn failure(status: StatusCode, message: impl Into<String>, code: &str) -> Self {
        Reply::Failure {
            status,
            message: message.into(),
            code: Some(code.to_owned()),
        }
    }

    pub fn into_response(self, request_id: &RequestId) -> Response {
        match self {
            Reply::Text { status, body } => send_text(status, body.into_owned()),
            Reply::Json { status, body } => json_response(status, &body),
            Reply::Success { status, data, meta } => {
                send_success(status, data, Some(request_id.as_str()), meta)
            }
            Reply::Failure {
                status,
                message,
                code,
            } => {
                let mut options = ErrorOptions::new(status, message).request_id(request_id);
                options.code = code;
                send_error(options)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_timestamp_is_utc_millis() {
        let ts = timestamp();
        assert!(ts.ends_with('Z'), "{ts}");
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
        // 2026-01-01T00:00:00.000Z
        assert_eq!(ts.len(), 24);
    }

    #[tokio::test]
    async fn test_success_envelope_shape() {
        let mut extra = Map::new();
        extra.insert("page".into(), json!(2));
        extra.insert("requestId".into(), json!("spoofed"));

        let response = send_success(StatusCode::OK, json!({ "a": 1 }), Some("req-1"), extra);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], json!({ "a": 1 }));
        assert_eq!(body["meta"]["requestId"], "req-1");
        assert_eq!(body["meta"]["page"], 2);
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_error_envelope_omits_absent_fields() {
        let response = send_error(ErrorOptions::new(StatusCode::BAD_REQUEST, "bad"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], json!({ "message": "bad" }));
        assert!(body["meta"]["timestamp"].is_string());
        assert!(body["meta"].get("requestId").is_none());
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_text_reply() {
        let response = Reply::text("hi").into_response(&RequestId::generate());
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"hi");
    }
}
