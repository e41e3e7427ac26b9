//! Server initialization and routing

use crate::routes::{chat, health, not_found};
use crate::state::ServerState;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
pub fn build_router(state: ServerState) -> Router {
    // Permissive CORS lets a browser front-end on another origin call /chat
    let cors = if state.settings.cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let timeout = Duration::from_secs(state.settings.timeout_secs);

    Router::new()
        .route("/chat", post(chat::chat))
        .route("/health", get(health::health_check))
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server
///
/// Binds to the configured address and serves until Ctrl+C or SIGTERM.
/// The matcher in `state` must already be loaded; the server never starts
/// with a partially loaded catalog.
pub async fn start_server(state: ServerState) -> anyhow::Result<()> {
    let addr = state.settings.socket_addr()?;

    tracing::info!(
        "Starting qamatch server on {} (catalog '{}', {} entries)",
        addr,
        state.catalog_name,
        state.matcher.catalog().len()
    );
    tracing::info!(
        "Timeout: {}s, CORS: {}, threshold: {}",
        state.settings.timeout_secs,
        state.settings.cors,
        state.matcher.config().threshold
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
