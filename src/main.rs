mod adapters;
mod application;
mod domain;
mod services;

use std::sync::Arc;

use adapters::{routes::build_router, server, state::AppState};
use domain::config::{gateway::DEFAULT_SESSION_SECRET, GatewayConfig};
use services::{spawn_eviction, ScratchStorage};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GatewayConfig::from_env().expect("ERROR: Invalid configuration");

    if config.session_secret == DEFAULT_SESSION_SECRET {
        tracing::warn!("SESSION_SECRET not set, using the built-in default");
    }

    tracing::info!(
        "Starting bg-remover-gateway, upstream {}{}",
        config.upstream.base_url,
        config.upstream.api_name
    );

    let scratch = Arc::new(
        ScratchStorage::create(&config.scratch.dir)
            .expect("ERROR: Failed to create a scratch directory"),
    );

    tracing::info!("Scratch directory ready at {}", scratch.path().display());

    let eviction = config.scratch.ttl.map(|ttl| {
        tracing::info!("Evicting scratch files older than {:?}", ttl);
        spawn_eviction(&scratch, ttl)
    });

    let background_remover = services::create_background_remover(&config.upstream)
        .expect("Failed to create upstream client");

    let app_state = AppState {
        scratch,
        background_remover,
    };

    let router = build_router(app_state, &config);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("Failed to bind to port");

    tracing::info!("Server listening on 0.0.0.0:{}", config.port);

    server::serve(listener, router, shutdown_signal(), config.shutdown_grace)
        .await
        .expect("Failed to start server");

    if let Some(handle) = eviction {
        handle.abort();
    }

    // Requests cut off by the grace period still hold the scratch storage;
    // it is dropped, and the directory removed, when the runtime shuts down.
    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
