//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Assign the request ID and log the request lifecycle
//! - Parse and validate bodies before route handlers run
//! - Turn handler results, errors and panics into exactly one response
//!
//! # Design Decisions
//! - One dispatcher for every method and path; lookup happens in [`Routes`]
//! - Unmatched paths answer 404 without reading the body
//! - A panicking handler fails its own request only

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use serde_json::Value;
use tracing::Instrument;

use crate::config::{Environment, ServiceConfig};
use crate::error::{ApiError, AppError};
use crate::health::ReadinessHandle;
use crate::http::body::{parse_body, validate_body};
use crate::http::error_handler::handle_error;
use crate::http::request::{RequestContext, RequestId, X_REQUEST_ID};
use crate::http::response::Reply;
use crate::lifecycle::fatal;
use crate::observability::logging::SERVICE_NAME;
use crate::observability::RequestLogger;
use crate::routing::{HandlerResult, Routes, GREETING};

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub routes: Arc<Routes>,
    pub readiness: ReadinessHandle,
    pub environment: Environment,
    pub request_log: Arc<RequestLogger>,
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(config: &ServiceConfig, routes: Arc<Routes>, readiness: ReadinessHandle) -> Self {
        Self {
            routes,
            readiness,
            environment: config.environment,
            request_log: Arc::new(RequestLogger::new(
                config.observability.exclude_paths.iter().cloned(),
            )),
            max_body_bytes: config.limits.max_body_bytes,
            request_timeout: config.timeouts.request_timeout(),
        }
    }
}

/// Build the Axum router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", any(dispatch))
        .route("/{*path}", any(dispatch))
        .with_state(state)
}

async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    let request_id = RequestId::from_headers(&parts.headers);
    let mut ctx = RequestContext::new(request_id.clone(), parts.method, parts.uri.path());
    ctx.user_agent = parts
        .headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let span = tracing::info_span!(
        "request",
        service = SERVICE_NAME,
        request_id = %request_id,
    );
    respond(ctx, body, state).instrument(span).await
}

async fn respond(ctx: RequestContext, body: Body, state: AppState) -> Response {
    let request_id = ctx.request_id.clone();
    let environment = state.environment;
    let excluded = state.request_log.is_excluded(&ctx.path);
    // Dropped unconsumed if the client goes away; it then logs the abort.
    let completion = state.request_log.start(&ctx);

    let outcome = fatal::catch_dispatch_panic(route_request(ctx, body, state)).await;

    let mut response = match outcome {
        Ok(Ok(reply)) => reply.into_response(&request_id),
        Ok(Err(error)) => handle_error(error, &request_id, environment),
        Err((payload, report)) => {
            handle_error(ApiError::from_panic(payload, report), &request_id, environment)
        }
    };

    if !excluded {
        if let Some(value) = request_id.header_value() {
            response.headers_mut().insert(X_REQUEST_ID, value);
        }
    }
    if let Some(hook) = completion {
        hook.complete(response.status());
    }

    response
}

async fn route_request(mut ctx: RequestContext, body: Body, state: AppState) -> HandlerResult {
    let route = state.routes.find(&ctx.method, &ctx.path).cloned();
    if route.is_none() && ctx.path != "/" {
        return Ok(Reply::failure(
            StatusCode::NOT_FOUND,
            "Route not found",
            "NOT_FOUND",
        ));
    }

    if carries_body(&ctx.method) {
        let parsed = parse_body(body, state.max_body_bytes).await?;
        ctx.body = match route.as_ref().and_then(|r| r.schema()) {
            Some(schema) => Some(validate_body::<Value>(parsed, schema)?),
            None => parsed,
        };
    }

    // Any method on `/` falls back to the greeting.
    let Some(route) = route else {
        return Ok(Reply::text(GREETING));
    };

    let timeout = state.request_timeout;
    match tokio::time::timeout(timeout, route.call(ctx, state)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "Handler timed out");
            Err(AppError::new("Request timed out", StatusCode::REQUEST_TIMEOUT)
                .with_code("REQUEST_TIMEOUT")
                .into())
        }
    }
}

fn carries_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carries_body() {
        assert!(carries_body(&Method::POST));
        assert!(carries_body(&Method::PUT));
        assert!(carries_body(&Method::PATCH));
        assert!(carries_body(&Method::DELETE));
        assert!(!carries_body(&Method::GET));
        assert!(!carries_body(&Method::HEAD));
        assert!(!carries_body(&Method::OPTIONS));
    }
}
