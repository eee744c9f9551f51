//! Request lifecycle logging.
//!
//! [`RequestLogger::start`] logs the incoming request and hands back a
//! [`CompletionHook`]; the dispatcher invokes the hook once the response is
//! built, whichever path produced it. The hook is consumed on use, so a
//! request can be logged as completed at most once.
//!
//! A hook dropped without being completed means the client went away before
//! a response was produced. It still logs one "Request completed" record,
//! with [`ABORTED_STATUS`] and `aborted = true`.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use axum::http::{Method, StatusCode};

use crate::http::request::{RequestContext, RequestId};
use crate::observability::metrics;

/// Paths excluded by default: the liveness check.
pub const DEFAULT_EXCLUDED_PATHS: &[&str] = &["/live"];

/// Status recorded for a request whose client disconnected first.
pub const ABORTED_STATUS: u16 = 499;

#[derive(Debug, Clone)]
pub struct RequestLogger {
    excluded: HashSet<String>,
}

impl RequestLogger {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded.contains(path)
    }

    /// Log the incoming request. Excluded paths log nothing and get no hook.
    pub fn start(&self, ctx: &RequestContext) -> Option<CompletionHook> {
        if self.is_excluded(&ctx.path) {
            return None;
        }

        tracing::info!(
            request_id = %ctx.request_id,
            method = %ctx.method,
            path = %ctx.path,
            user_agent = ctx.user_agent.as_deref().unwrap_or(""),
            "Incoming request"
        );

        Some(CompletionHook {
            request_id: ctx.request_id.clone(),
            method: ctx.method.clone(),
            path: ctx.path.clone(),
            started: ctx.started,
            finished: false,
        })
    }
}

impl Default for RequestLogger {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_PATHS.iter().copied())
    }
}

/// Emits the "Request completed" record for one request.
#[must_use = "a request must be logged as completed"]
#[derive(Debug)]
pub struct CompletionHook {
    request_id: RequestId,
    method: Method,
    path: String,
    started: Instant,
    finished: bool,
}

impl CompletionHook {
    /// Log completion and return the duration in milliseconds.
    pub fn complete(mut self, status: StatusCode) -> f64 {
        self.finished = true;
        self.emit(status.as_u16(), false)
    }

    fn emit(&self, status_code: u16, aborted: bool) -> f64 {
        let elapsed = self.started.elapsed();
        let duration_ms = round_millis(elapsed);

        tracing::info!(
            request_id = %self.request_id,
            method = %self.method,
            path = %self.path,
            status_code,
            duration_ms,
            aborted,
            "Request completed"
        );
        metrics::record_request(self.method.as_str(), status_code, elapsed);

        duration_ms
    }
}

impl Drop for CompletionHook {
    fn drop(&mut self) {
        if !self.finished {
            self.emit(ABORTED_STATUS, true);
        }
    }
}

/// Milliseconds rounded to two decimal places.
pub fn round_millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100_000.0).round() / 100.0
}
