//! Service skeleton binary.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ listener ──▶ dispatch ──▶ body parser ──▶ route handler
//!                                     │                              │
//!                                     │ request ID, request log      │ Reply / ApiError
//!                                     ▼                              ▼
//!     Client Response ◀──────── X-Request-Id ◀──── envelope / error handler
//!
//!     lifecycle: bind → ready → signal → draining → drain (watchdog) → exit
//! ```
//!
//! Exit status is 0 after a clean shutdown and 1 on invalid configuration,
//! bind failure, a fatal panic or a forced shutdown.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::Instrument;

use service_skeleton::config::{self, ServiceConfig};
use service_skeleton::lifecycle::controller::{block_on_bounded, TEARDOWN_GRACE};
use service_skeleton::lifecycle::{fatal, Lifecycle, StartupError};
use service_skeleton::observability::logging::{self, SERVICE_NAME};
use service_skeleton::observability::metrics;

#[derive(Parser)]
#[command(name = "service-skeleton")]
#[command(about = "Minimal HTTP service skeleton", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability, config.environment);
    let _fatal = fatal::install();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    let span = tracing::info_span!("service", service = SERVICE_NAME);
    block_on_bounded(runtime, serve(config).instrument(span), TEARDOWN_GRACE)
}

async fn serve(config: ServiceConfig) -> ExitCode {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        port = config.listener.port,
        "service-skeleton starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    match Lifecycle::new(config).run().await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(StartupError::PortInUse { port, .. }) => {
            tracing::error!(port, "Port {port} is already in use");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
