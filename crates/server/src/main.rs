//! sitescout HTTP server entry point.
//!
//! Boots the audit engine behind an axum router. Logging goes to stderr as
//! JSON. A cache that cannot be opened is logged and skipped: the server
//! still audits, it just repeats work.

use std::sync::Arc;

use anyhow::{Context, Result};
use sitescout_client::AuditEngine;
use sitescout_core::{AppConfig, AuditStore, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod routes;

async fn open_store(config: &AppConfig) -> Option<Arc<dyn AuditStore>> {
    match CacheDb::open(&config.db_path).await {
        Ok(db) => {
            let db = db.with_ttl(config.cache_ttl());
            match db.sweep().await {
                Ok(removed) if removed > 0 => tracing::info!(removed, "swept expired cache entries"),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "startup cache sweep failed"),
            }
            Some(Arc::new(db))
        }
        Err(e) => {
            tracing::warn!(path = %config.db_path.display(), error = %e, "cache unavailable, running without it");
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let store = open_store(&config).await;
    let engine = AuditEngine::from_config(&config, store).context("failed to build audit engine")?;
    let app = handler::router(handler::AppState::new(engine));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let pagespeed = match config.require_pagespeed_api_key() {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "performance scores will be neutral");
            false
        }
    };

    tracing::info!(
        %addr,
        pagespeed,
        contact_extraction = config.contact_extraction,
        "sitescout server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
