//! Request body parsing and validation.
//!
//! # Responsibilities
//! - Buffer the request stream and decode it as JSON
//! - Validate decoded bodies against a JSON Schema
//!
//! # Design Decisions
//! - Empty body is an explicit `None`, not an error
//! - Validation reports every violation from one pass, never a partial result
//! - Schemas are compiled once at startup and shared by reference

use std::fmt;

use axum::{body::Body, http::StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::{ApiError, AppError};

/// Message of the validation error raised for undecodable bodies.
pub const INVALID_JSON_BODY: &str = "Invalid JSON body";

/// Error compiling a JSON Schema.
#[derive(Debug, thiserror::Error)]
#[error("invalid schema: {0}")]
pub struct SchemaError(String);

/// One failed schema check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Dotted field path (`""` for the document root).
    pub path: String,
    pub message: String,
}

/// A compiled JSON Schema used to validate request bodies.
pub struct BodySchema {
    validator: jsonschema::Validator,
}

impl BodySchema {
    pub fn compile(schema: &Value) -> Result<Self, SchemaError> {
        jsonschema::validator_for(schema)
            .map(|validator| Self { validator })
            .map_err(|e| SchemaError(e.to_string()))
    }

    /// Every violation of `instance`, in schema evaluation order.
    pub fn violations(&self, instance: &Value) -> Vec<Violation> {
        self.validator
            .iter_errors(instance)
            .map(|error| Violation {
                path: dotted_path(&error.instance_path.to_string()),
                message: error.to_string(),
            })
            .collect()
    }
}

impl fmt::Debug for BodySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodySchema").finish_non_exhaustive()
    }
}

/// JSON pointer (`/items/0/name`) to dotted path (`items.0.name`).
fn dotted_path(pointer: &str) -> String {
    pointer
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}

/// Buffer the whole body and decode it as JSON.
///
/// Returns `Ok(None)` for an empty body. Transport failures (disconnects,
/// exceeding `limit`) fail immediately.
pub async fn parse_body(body: Body, limit: usize) -> Result<Option<Value>, ApiError> {
    let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
        tracing::debug!(error = %e, "Failed to read request body");
        AppError::new("Failed to read request body", StatusCode::BAD_REQUEST)
            .with_code("BODY_READ_ERROR")
    })?;

    let text = String::from_utf8_lossy(&bytes);
    if text.is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&text)
        .map(Some)
        .map_err(|_| AppError::validation(INVALID_JSON_BODY).into())
}

/// Validate `body` (a missing body validates as `null`) and deserialize it.
pub fn validate_body<T: DeserializeOwned>(
    body: Option<Value>,
    schema: &BodySchema,
) -> Result<T, ApiError> {
    let value = body.unwrap_or(Value::Null);

    let violations = schema.violations(&value);
    if !violations.is_empty() {
        return Err(validation_failed(violations));
    }

    serde_json::from_value(value).map_err(|e| {
        validation_failed(vec![Violation {
            path: String::new(),
            message: e.to_string(),
        }])
    })
}

/// [`parse_body`] followed by [`validate_body`].
pub async fn parse_and_validate<T: DeserializeOwned>(
    body: Body,
    limit: usize,
    schema: &BodySchema,
) -> Result<T, ApiError> {
    let parsed = parse_body(body, limit).await?;
    validate_body(parsed, schema)
}

fn validation_failed(violations: Vec<Violation>) -> ApiError {
    let list = serde_json::to_value(&violations).unwrap_or_default();
    AppError::validation(format!("Validation failed: {list}"))
        .with_details(list)
        .into()
}
