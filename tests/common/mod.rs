//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

use service_skeleton::config::{Environment, ServiceConfig};
use service_skeleton::health::Readiness;
use service_skeleton::http::{build_router, AppState};
use service_skeleton::routing::Routes;

/// Config bound to an OS-assigned loopback port.
pub fn test_config(environment: Environment) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.host = "127.0.0.1".to_string();
    config.listener.port = 0;
    config.environment = environment;
    config
}

/// In-process router with a readiness writer the test controls.
pub struct TestApp {
    pub router: Router,
    pub readiness: Readiness,
}

impl TestApp {
    pub fn new(routes: Routes, environment: Environment) -> Self {
        Self::with_state(routes, environment, |_| {})
    }

    pub fn with_state(
        routes: Routes,
        environment: Environment,
        customize: impl FnOnce(&mut AppState),
    ) -> Self {
        let readiness = Readiness::new();
        let mut state = AppState::new(
            &test_config(environment),
            Arc::new(routes),
            readiness.handle(),
        );
        customize(&mut state);
        Self {
            router: build_router(state),
            readiness,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, path: &str) -> Response {
        self.send(request(Method::GET, path, Body::empty())).await
    }

    pub async fn post(&self, path: &str, body: impl Into<Body>) -> Response {
        self.send(request(Method::POST, path, body.into())).await
    }
}

pub fn request(method: Method, path: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(body)
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

/// Port that was free a moment ago.
pub async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// JSON log records written while the guard from [`capture_logs`] is alive.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn records(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// Records whose message equals `message`.
    pub fn with_message(&self, message: &str) -> Vec<Value> {
        self.records()
            .into_iter()
            .filter(|r| r["fields"]["message"] == message)
            .collect()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route this thread's events into a [`LogBuffer`] as JSON lines.
///
/// Thread-scoped, so use it from a current-thread runtime.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}
