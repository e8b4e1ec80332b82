// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;

use casting_agency_server::{
    api::router,
    auth::{AuthGate, HttpKeySource, JwksManager, TokenVerifier},
    config::{Config, LOG_FORMAT_ENV},
    state::AppState,
    store::InMemoryStore,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::from_env()?;
    let auth = &config.auth;

    let source = HttpKeySource::new(auth.jwks_url.as_str(), auth.fetch_timeout)?;
    let jwks = JwksManager::new(source)
        .with_cache_ttl(auth.cache_ttl)
        .with_fetch_timeout(auth.fetch_timeout);
    let verifier = TokenVerifier::new(jwks, auth.verifier_settings());

    let state = AppState::new(InMemoryStore::new(), AuthGate::new(verifier));
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        %addr,
        jwks_url = %auth.jwks_url,
        issuer = %auth.issuer,
        audience = %auth.audience,
        "Casting Agency server listening (docs at /docs)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
