//! Route table and lookup.
//!
//! # Responsibilities
//! - Store the fixed set of routes
//! - Look up the route for a method + path
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan over exact literals; paths are distinct so order never matters
//! - Explicit no-match rather than silent default

use std::future::Future;
use std::sync::Arc;

use axum::http::Method;
use futures_util::future::BoxFuture;

use crate::error::ApiError;
use crate::health::endpoints;
use crate::http::body::BodySchema;
use crate::http::request::RequestContext;
use crate::http::response::Reply;
use crate::http::server::AppState;

/// Body of the default `/` response.
pub const GREETING: &str = "Hello, Rust World!";

/// What every handler returns.
pub type HandlerResult = Result<Reply, ApiError>;

type BoxedHandler =
    Arc<dyn Fn(RequestContext, AppState) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// A single method + exact-path route.
#[derive(Clone)]
pub struct Route {
    method: Method,
    path: String,
    handler: BoxedHandler,
    schema: Option<Arc<BodySchema>>,
}

impl Route {
    pub fn new<F, Fut>(method: Method, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(RequestContext, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            method,
            path: path.into(),
            handler: Arc::new(
                move |ctx: RequestContext, state: AppState| -> BoxFuture<'static, HandlerResult> {
                    Box::pin(handler(ctx, state))
                },
            ),
            schema: None,
        }
    }

    pub fn get<F, Fut>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(RequestContext, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::new(Method::GET, path, handler)
    }

    pub fn post<F, Fut>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(RequestContext, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::new(Method::POST, path, handler)
    }

    /// Validate the parsed body against `schema` before the handler runs.
    pub fn with_schema(mut self, schema: BodySchema) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn schema(&self) -> Option<&BodySchema> {
        self.schema.as_deref()
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method == *method && self.path == path
    }

    pub(crate) fn call(&self, ctx: RequestContext, state: AppState) -> BoxFuture<'static, HandlerResult> {
        (self.handler)(ctx, state)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("schema", &self.schema.is_some())
            .finish()
    }
}

/// Immutable route table.
#[derive(Debug, Clone, Default)]
pub struct Routes {
    routes: Vec<Route>,
}

impl Routes {
    /// An empty table; every request falls through to the greeting or 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// `/`, `/health`, `/ready` and `/live`.
    pub fn defaults() -> Self {
        Self::new()
            .route(Route::get("/", greeting))
            .route(Route::get("/health", endpoints::health))
            .route(Route::get("/ready", endpoints::ready))
            .route(Route::get("/live", endpoints::live))
    }

    /// Add a route. A route with the same method and path replaces the old one,
    /// so lookups stay unambiguous.
    pub fn route(mut self, route: Route) -> Self {
        if let Some(existing) = self
            .routes
            .iter_mut()
            .find(|r| r.matches(&route.method, &route.path))
        {
            tracing::warn!(method = %route.method, path = %route.path, "Replacing duplicate route");
            *existing = route;
        } else {
            self.routes.push(route);
        }
        self
    }

    pub fn find(&self, method: &Method, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.matches(method, path))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// GET /
pub async fn greeting(_ctx: RequestContext, _state: AppState) -> HandlerResult {
    Ok(Reply::text(GREETING))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn teapot(_ctx: RequestContext, _state: AppState) -> HandlerResult {
        Ok(Reply::text("teapot"))
    }

    #[test]
    fn test_default_routes() {
        let routes = Routes::defaults();
        assert_eq!(routes.len(), 4);
        assert!(routes.find(&Method::GET, "/health").is_some());
        assert!(routes.find(&Method::GET, "/ready").is_some());
        assert!(routes.find(&Method::GET, "/live").is_some());
    }

    #[test]
    fn test_exact_match_only() {
        let routes = Routes::defaults();
        assert!(routes.find(&Method::POST, "/health").is_none());
        assert!(routes.find(&Method::GET, "/health/").is_none());
        assert!(routes.find(&Method::GET, "/healthz").is_none());
        assert!(routes.find(&Method::GET, "/nope").is_none());
    }

    #[test]
    fn test_duplicate_route_replaces() {
        let routes = Routes::new()
            .route(Route::get("/x", teapot))
            .route(Route::get("/x", greeting))
            .route(Route::post("/x", teapot));
        assert_eq!(routes.len(), 2);
        assert!(routes.find(&Method::POST, "/x").is_some());
    }
}
