//! Health-check endpoints for Kubernetes-style orchestrators.
//!
//! - `/health`: comprehensive check, always 200 (kept for backward compatibility)
//! - `/ready`: readiness, 503 during startup and shutdown
//! - `/live`: liveness, always 200 with a bare body

use axum::http::StatusCode;
use serde_json::json;

use crate::http::request::RequestContext;
use crate::http::response::{timestamp, Reply};
use crate::http::server::AppState;
use crate::routing::router::HandlerResult;

/// GET /health
pub async fn health(_ctx: RequestContext, _state: AppState) -> HandlerResult {
    Ok(Reply::success(json!({
        "status": "ok",
        "timestamp": timestamp(),
    })))
}

/// GET /ready
pub async fn ready(_ctx: RequestContext, state: AppState) -> HandlerResult {
    if state.readiness.is_ready() {
        Ok(Reply::success(json!({
            "status": "ready",
            "timestamp": timestamp(),
        })))
    } else {
        Ok(Reply::failure(
            StatusCode::SERVICE_UNAVAILABLE,
            "Service not ready",
            "NOT_READY",
        ))
    }
}

/// GET /live
pub async fn live(_ctx: RequestContext, _state: AppState) -> HandlerResult {
    Ok(Reply::json(json!({ "status": "live" })))
}
