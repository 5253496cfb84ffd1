//! evalboardd - HTTP gateway for evalboard
//!
//! Wires the in-process submission pipeline and serves it over HTTP until
//! interrupted. Configuration comes from flags or the environment:
//!
//! - `EVALBOARD_HTTP_PORT` (default 8080)
//! - `EVALBOARD_BIND` (default 0.0.0.0)
//! - `RUST_LOG` overrides the log filter

mod config;
mod error;
mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use evalboard_core::{init_tracing, InMemoryMetrics, Pipeline, PipelineConfig, VERSION};

use crate::config::Config;
use crate::routes::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format(), config.log_level());

    let metrics = Arc::new(InMemoryMetrics::new());
    let pipeline = Pipeline::new(PipelineConfig::default().with_metrics(metrics.clone()))
        .context("failed to wire submission pipeline")?;

    let shutdown = CancellationToken::new();
    let app = router(AppState::new(Arc::new(pipeline), shutdown.clone()));

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, version = VERSION, "evalboardd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("http server failed")?;

    metrics.flush();
    info!("evalboardd stopped");
    Ok(())
}

/// Resolves on Ctrl-C, cancelling every in-flight dispatch token.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        shutdown.cancelled().await;
    }
    info!("shutdown requested");
    shutdown.cancel();
}
