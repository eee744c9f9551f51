//! Error translation.
//!
//! Turns any [`ApiError`] into exactly one error envelope.
//!
//! # Design Decisions
//! - Operational errors keep their status and message; logged at WARN
//! - Programmer errors become 500 `INTERNAL_ERROR`; logged at ERROR with the stack
//! - Outside development the programmer-error message is replaced and no
//!   stack is ever sent

use axum::{http::StatusCode, response::Response};

use crate::config::Environment;
use crate::error::ApiError;
use crate::http::request::RequestId;
use crate::http::response::{send_error, ErrorOptions};

/// Message sent in place of programmer-error details outside development.
pub const SANITIZED_MESSAGE: &str = "Internal server error";

pub fn handle_error(error: ApiError, request_id: &RequestId, environment: Environment) -> Response {
    let development = environment.is_development();

    match error {
        ApiError::App(error) if error.is_operational() => {
            tracing::warn!(
                request_id = %request_id,
                error = error.name(),
                error_message = error.message(),
                status_code = error.status().as_u16(),
                code = error.code().unwrap_or_default(),
                "Request failed"
            );

            let mut options = ErrorOptions::new(error.status(), error.message())
                .details(error.details().cloned())
                .request_id(request_id);
            if let Some(code) = error.code() {
                options = options.code(code);
            }
            if development {
                options = options.stack(error.stack().map(str::to_owned));
            }
            send_error(options)
        }
        ApiError::App(error) => programmer_error(
            request_id,
            development,
            error.name(),
            error.message(),
            error.stack(),
        ),
        ApiError::Internal {
            name,
            message,
            stack,
        } => programmer_error(request_id, development, &name, &message, stack.as_deref()),
    }
}

fn programmer_error(
    request_id: &RequestId,
    development: bool,
    name: &str,
    message: &str,
    stack: Option<&str>,
) -> Response {
    tracing::error!(
        request_id = %request_id,
        error = name,
        error_message = message,
        stack = stack.unwrap_or_default(),
        "Unhandled error"
    );

    let message = if development { message } else { SANITIZED_MESSAGE };
    let mut options = ErrorOptions::new(StatusCode::INTERNAL_SERVER_ERROR, message)
        .code("INTERNAL_ERROR")
        .request_id(request_id);
    if development {
        options = options.stack(stack.map(str::to_owned));
    }
    send_error(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use serde_json::Value;

    async fn render(error: ApiError, environment: Environment) -> (StatusCode, Value) {
        let response = handle_error(error, &RequestId::generate(), environment);
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_operational_error_keeps_status_and_message() {
        let (status, body) = render(
            AppError::forbidden("No access to widget").into(),
            Environment::Production,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["message"], "No access to widget");
        assert_eq!(body["error"]["code"], "FORBIDDEN");
        assert!(body["error"].get("stack").is_none());
        assert!(body["meta"]["requestId"].is_string());
    }

    #[tokio::test]
    async fn test_programmer_error_is_sanitized_outside_development() {
        for environment in [Environment::Production, Environment::Staging, Environment::Test] {
            let (status, body) = render(
                ApiError::internal("TypeError", "cannot read field of null"),
                environment,
            )
            .await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["error"]["message"], SANITIZED_MESSAGE);
            assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
            assert!(body["error"].get("stack").is_none());
        }
    }

    #[tokio::test]
    async fn test_programmer_error_is_raw_in_development() {
        let (status, body) = render(
            ApiError::internal("TypeError", "cannot read field of null"),
            Environment::Development,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "cannot read field of null");
    }

    #[tokio::test]
    async fn test_non_operational_app_error_is_treated_as_programmer_error() {
        let error = AppError::new("db pool exhausted", StatusCode::SERVICE_UNAVAILABLE)
            .with_code("POOL")
            .non_operational();
        let (status, body) = render(error.into(), Environment::Production).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], SANITIZED_MESSAGE);
    }

    #[tokio::test]
    async fn test_validation_details_are_exposed() {
        let error = AppError::validation("Validation failed")
            .with_details(serde_json::json!([{ "path": "name", "message": "required" }]));
        let (status, body) = render(error.into(), Environment::Production).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"][0]["path"], "name");
    }
}
