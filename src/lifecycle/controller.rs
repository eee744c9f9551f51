//! Startup and shutdown orchestration.
//!
//! # Responsibilities
//! - Bind the listener and report port conflicts distinctly
//! - Flip readiness when traffic is accepted and again when draining starts
//! - Drain in-flight requests under a watchdog
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The watchdog only starts once shutdown is requested; a clean drain
//!   cancels it
//! - The controller owns the only [`Readiness`] writer
//! - A second shutdown request abandons the drain
//! - Runtime teardown is bounded too: blocking work never delays exit

use std::future::{Future, IntoFuture};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::runtime::Runtime;

use crate::config::ServiceConfig;
use crate::health::{Readiness, ReadinessHandle};
use crate::http::server::{build_router, AppState};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::SignalListener;
use crate::routing::Routes;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Port {port} is already in use")]
    PortInUse {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to install signal handlers: {0}")]
    Signals(#[source] io::Error),

    #[error("Server error: {0}")]
    Serve(#[source] io::Error),
}

/// How the server stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every in-flight request finished before the deadline.
    Graceful,
    /// The shutdown deadline expired with requests still running.
    Forced,
}

impl ShutdownOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            ShutdownOutcome::Graceful => 0,
            ShutdownOutcome::Forced => 1,
        }
    }
}

/// Owns the server from bind to exit.
pub struct Lifecycle {
    config: ServiceConfig,
    routes: Arc<Routes>,
    readiness: Readiness,
    shutdown: Shutdown,
}

impl Lifecycle {
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_routes(config, Routes::defaults())
    }

    pub fn with_routes(config: ServiceConfig, routes: Routes) -> Self {
        Self {
            config,
            routes: Arc::new(routes),
            readiness: Readiness::new(),
            shutdown: Shutdown::new(),
        }
    }

    pub fn readiness(&self) -> ReadinessHandle {
        self.readiness.handle()
    }

    /// Handle that requests graceful shutdown without a signal.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, StartupError> {
        let address = self.config.listener.address();

        TcpListener::bind(&address).await.map_err(|source| {
            if source.kind() == io::ErrorKind::AddrInUse {
                StartupError::PortInUse {
                    port: self.config.listener.port,
                    source,
                }
            } else {
                StartupError::Bind { address, source }
            }
        })
    }

    /// Serve on `listener` until shutdown is requested, then drain.
    pub async fn serve(self, listener: TcpListener) -> Result<ShutdownOutcome, StartupError> {
        let local_addr = listener.local_addr().map_err(StartupError::Serve)?;
        let shutdown_timeout = self.config.timeouts.shutdown_timeout();
        let environment = self.config.environment;

        let state = AppState::new(&self.config, Arc::clone(&self.routes), self.readiness.handle());
        let app = build_router(state);

        self.readiness.mark_ready();
        tracing::info!(
            port = local_addr.port(),
            address = %local_addr,
            environment = %environment,
            "Server listening"
        );

        let readiness = self.readiness;
        let mut drain = self.shutdown.subscribe();
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                drain.recv().await;
                readiness.begin_shutdown();
                tracing::info!("Shutting down gracefully, draining connections");
            })
            .into_future();
        tokio::pin!(server);

        let mut requested = self.shutdown.subscribe();
        tokio::select! {
            result = &mut server => {
                result.map_err(StartupError::Serve)?;
                tracing::info!("Server stopped");
                return Ok(ShutdownOutcome::Graceful);
            }
            _ = requested.recv() => {}
        }

        tokio::select! {
            drained = tokio::time::timeout(shutdown_timeout, &mut server) => match drained {
                Ok(result) => {
                    result.map_err(StartupError::Serve)?;
                    tracing::info!("Shutdown complete");
                    Ok(ShutdownOutcome::Graceful)
                }
                Err(_) => {
                    tracing::error!(
                        timeout_secs = shutdown_timeout.as_secs(),
                        "Graceful shutdown timed out, forcing exit"
                    );
                    Ok(ShutdownOutcome::Forced)
                }
            },
            _ = requested.forced() => {
                tracing::error!("Shutdown forced before drain completed");
                Ok(ShutdownOutcome::Forced)
            }
        }
    }

    /// Bind, install signal handlers and serve.
    pub async fn run(self) -> Result<ShutdownOutcome, StartupError> {
        let listener = self.bind().await?;
        let mut signals = SignalListener::install().map_err(StartupError::Signals)?;

        let shutdown = self.shutdown.clone();
        let signal_task = tokio::spawn(async move {
            loop {
                let signal = signals.recv().await;
                if shutdown.is_triggered() {
                    tracing::warn!(signal = %signal, "Received second shutdown signal, forcing exit");
                    shutdown.force();
                    break;
                }
                tracing::info!(signal = %signal, "Received shutdown signal");
                shutdown.trigger();
            }
        });

        let outcome = self.serve(listener).await;
        signal_task.abort();
        outcome
    }
}

/// Upper bound on runtime teardown once serving has ended.
pub const TEARDOWN_GRACE: Duration = Duration::from_millis(500);

/// Drive `future` on `runtime`, then shut the runtime down without waiting
/// longer than `grace` for tasks stuck in blocking code.
pub fn block_on_bounded<F: Future>(runtime: Runtime, future: F, grace: Duration) -> F::Output {
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(grace);
    output
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("address", &self.config.listener.address())
            .field("routes", &self.routes.len())
            .field("readiness", &self.readiness.state())
            .finish()
    }
}
