// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `ztap serve`: bootstrap the agent and run the HTTP API until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use ztap_core::application::AgentRuntime;
use ztap_core::domain::agent_config::AgentConfig;
use ztap_core::presentation::app;

pub async fn run(config_path: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = AgentConfig::load_or_default(config_path).context("Failed to load configuration")?;
    apply_cli_overrides(&mut config, host, port);
    config.validate().context("Configuration validation failed")?;

    // Any misconfiguration stops the process here, before the listener binds.
    let runtime = AgentRuntime::bootstrap(&config).context("Agent refused to start")?;

    if let Some(metrics_port) = config.spec.server.metrics_port {
        let addr: SocketAddr = format!("{}:{}", config.spec.server.host, metrics_port)
            .parse()
            .with_context(|| format!("Invalid metrics address {}:{}", config.spec.server.host, metrics_port))?;
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Metrics exporter listening on {}", addr);
    }

    let router = app(Arc::new(runtime));

    let addr = format!("{}:{}", config.spec.server.host, config.spec.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(agent = %config.metadata.name, "Agent listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Agent shutting down");

    Ok(())
}

fn apply_cli_overrides(config: &mut AgentConfig, host: Option<String>, port: Option<u16>) {
    if let Some(host) = host {
        config.spec.server.host = host;
    }
    if let Some(port) = port {
        config.spec.server.port = port;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
