// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account-Kit API Server
//!
//! Serves the account API and static frontend assets.

use account_kit::{
    config::{Config, DeploymentMode, StorageBackend},
    db::DocumentDb,
    tls, AppState,
};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let config = Config::from_env()?;

    init_logging(config.mode);
    tracing::info!(port = config.port, mode = %config.mode, "Starting Account-Kit API");

    // Initialize document store
    let db = match config.storage {
        StorageBackend::Firestore => DocumentDb::new(&config.gcp_project_id).await?,
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            DocumentDb::new_in_memory()
        }
    };

    // Fail before binding if secure mode has no certificates
    let tls_config = if config.mode.is_secure() {
        Some(tls::load_server_config(
            Path::new(tls::KEY_PATH),
            Path::new(tls::CERT_PATH),
        )?)
    } else {
        None
    };

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
    });

    // Build router
    let app = account_kit::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    match tls_config {
        Some(tls_config) => {
            tracing::info!(address = %addr, "Server listening (HTTPS)");
            tls::serve(listener, tls_config, app).await?;
        }
        None => {
            tracing::info!(address = %addr, "Server listening");
            axum::serve(listener, app).await?;
        }
    }
    Ok(())
}

/// Initialize logging: human-readable in development, structured JSON otherwise.
fn init_logging(mode: DeploymentMode) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("account_kit=debug,info"));

    let registry = tracing_subscriber::registry().with(filter);

    if mode.is_development() {
        registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    } else {
        let format = tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .with_current_span(true)
            .flatten_event(true);
        registry.with(format).init();
    }
}
