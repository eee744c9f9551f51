//! Error taxonomy for request handling.
//!
//! # Design Decisions
//! - [`AppError`] is an operational error: expected, safe to describe to the caller
//! - Everything else is a programmer error, carried as [`ApiError::Internal`]
//! - Errors are immutable once built; the error handler consumes them exactly once

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;

use axum::http::StatusCode;
use serde_json::{Map, Value};

/// Category of an operational error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Generic application error (default 500).
    App,
    /// Malformed or schema-violating input (400).
    Validation,
    /// Missing or invalid credentials (401).
    Unauthorized,
    /// Authenticated but not permitted (403).
    Forbidden,
    /// Requested resource does not exist (404).
    NotFound,
}

impl ErrorKind {
    /// Name reported in logs and in [`AppError::to_json`].
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::App => "AppError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Unauthorized => "UnauthorizedError",
            ErrorKind::Forbidden => "ForbiddenError",
            ErrorKind::NotFound => "NotFoundError",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ErrorKind::App => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            ErrorKind::App => None,
            ErrorKind::Validation => Some("VALIDATION_ERROR"),
            ErrorKind::Unauthorized => Some("UNAUTHORIZED"),
            ErrorKind::Forbidden => Some("FORBIDDEN"),
            ErrorKind::NotFound => Some("NOT_FOUND"),
        }
    }

    fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::App => "Internal server error",
            ErrorKind::Validation => "Validation failed",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Resource not found",
        }
    }
}

/// An operational error with an HTTP status and optional machine-readable code.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    status: StatusCode,
    code: Option<String>,
    details: Option<Value>,
    is_operational: bool,
    stack: Option<String>,
}

impl AppError {
    /// Create a generic application error with an explicit status.
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            kind: ErrorKind::App,
            message: message.into(),
            status,
            code: None,
            details: None,
            is_operational: true,
            stack: capture_stack(),
        }
    }

    /// Create an error of the given kind with its default message.
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self::with_kind(kind, kind.default_message())
    }

    fn with_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: kind.status(),
            code: kind.code().map(str::to_owned),
            details: None,
            is_operational: true,
            stack: capture_stack(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Forbidden, message)
    }

    /// Attach a machine-readable code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach structured details exposed in the error envelope.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark the error as unexpected; the handler then treats it as a programmer error.
    pub fn non_operational(mut self) -> Self {
        self.is_operational = false;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    pub fn is_operational(&self) -> bool {
        self.is_operational
    }

    /// Backtrace captured at construction, when `RUST_BACKTRACE` enables it.
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// Serialize for logs or diagnostics.
    pub fn to_json(&self, include_stack: bool) -> Value {
        let mut base = Map::new();
        base.insert("error".into(), Value::from(self.name()));
        base.insert("message".into(), Value::from(self.message.as_str()));
        base.insert("statusCode".into(), Value::from(self.status.as_u16()));
        if let Some(code) = &self.code {
            base.insert("code".into(), Value::from(code.as_str()));
        }
        if include_stack {
            if let Some(stack) = &self.stack {
                base.insert("stack".into(), Value::from(stack.as_str()));
            }
        }
        Value::Object(base)
    }
}

/// Any failure a handler or the dispatcher can produce.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Operational error with its own status and code.
    #[error(transparent)]
    App(#[from] AppError),

    /// Programmer error: always a 500, details redacted outside development.
    #[error("{message}")]
    Internal {
        name: Cow<'static, str>,
        message: String,
        stack: Option<String>,
    },
}

impl ApiError {
    pub fn internal(name: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        ApiError::Internal {
            name: name.into(),
            message: message.into(),
            stack: capture_stack(),
        }
    }

    /// Convert a caught panic payload; `stack` is the location recorded by the panic hook.
    pub fn from_panic(payload: Box<dyn Any + Send>, stack: Option<String>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "handler panicked".to_owned()
        };
        ApiError::Internal {
            name: Cow::Borrowed("Panic"),
            message,
            stack,
        }
    }

    pub fn is_operational(&self) -> bool {
        matches!(self, ApiError::App(e) if e.is_operational())
    }

    pub fn name(&self) -> &str {
        match self {
            ApiError::App(e) => e.name(),
            ApiError::Internal { name, .. } => name,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::internal("SerdeJsonError", e.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::internal("IoError", e.to_string())
    }
}

impl From<axum::Error> for ApiError {
    fn from(e: axum::Error) -> Self {
        ApiError::internal("AxumError", e.to_string())
    }
}

fn capture_stack() -> Option<String> {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_defaults() {
        let e = AppError::validation("bad input");
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.code(), Some("VALIDATION_ERROR"));
        assert_eq!(e.name(), "ValidationError");
        assert!(e.is_operational());

        let e = AppError::from_kind(ErrorKind::NotFound);
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
        assert_eq!(e.message(), "Resource not found");

        let e = AppError::from_kind(ErrorKind::Unauthorized);
        assert_eq!(e.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(e.code(), Some("UNAUTHORIZED"));

        let e = AppError::forbidden("nope");
        assert_eq!(e.status(), StatusCode::FORBIDDEN);
        assert_eq!(e.code(), Some("FORBIDDEN"));
    }

    #[test]
    fn test_generic_app_error() {
        let e = AppError::new("boom", StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.code(), None);
        assert_eq!(e.to_string(), "boom");

        let e = AppError::new("teapot", StatusCode::IM_A_TEAPOT).with_code("TEAPOT");
        assert_eq!(e.status().as_u16(), 418);
        assert_eq!(e.code(), Some("TEAPOT"));
    }

    #[test]
    fn test_to_json_omits_absent_fields() {
        let json = AppError::new("boom", StatusCode::BAD_GATEWAY).to_json(false);
        assert_eq!(json["error"], "AppError");
        assert_eq!(json["statusCode"], 502);
        assert!(json.get("code").is_none());
        assert!(json.get("stack").is_none());

        let json = AppError::not_found("gone").to_json(false);
        assert_eq!(json["code"], "NOT_FOUND");
    }

    #[test]
    fn test_operational_classification() {
        assert!(ApiError::from(AppError::validation("x")).is_operational());
        assert!(!ApiError::from(AppError::validation("x").non_operational()).is_operational());
        assert!(!ApiError::internal("TypeError", "x is undefined").is_operational());
    }

    #[test]
    fn test_from_panic_payloads() {
        let e = ApiError::from_panic(Box::new("static str"), None);
        assert_eq!(e.to_string(), "static str");
        assert_eq!(e.name(), "Panic");

        let e = ApiError::from_panic(Box::new(String::from("owned")), None);
        assert_eq!(e.to_string(), "owned");

        let e = ApiError::from_panic(Box::new(42_u8), None);
        assert_eq!(e.to_string(), "handler panicked");
    }
}
