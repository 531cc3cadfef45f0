//! Coupon predictor HTTP server
//!
//! This module provides the main HTTP server with:
//! - Sample rows at /samples
//! - Single-row prediction at /predict
//! - Model description at /model
//! - Health checks at / and /health
//!
//! Every route is also reachable under the /api prefix.

use anyhow::Result;
use axum::{extract::State, middleware::from_fn, response::IntoResponse, routing::get, Json, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod middleware;
pub mod routes;
pub mod state;

use state::ServerState;

/// Create the main application router
pub fn create_app(state: ServerState) -> Router {
    let cors = middleware::cors_layer(&state.config.cors);

    let api = Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .merge(routes::inference::create_router());

    Router::new()
        .nest("/api", api.clone())
        .merge(api)
        .layer(from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<ServerState>) -> impl IntoResponse {
    let status = if state.service.is_ready() {
        "healthy"
    } else {
        "degraded"
    };
    Json(serde_json::json!({
        "status": status,
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "model_loaded": state.service.is_ready(),
        "samples": state.service.samples().len(),
    }))
}

/// Start the HTTP server
pub async fn start_server(addr: SocketAddr, state: ServerState) -> Result<()> {
    let app = create_app(state);

    info!("Starting coupon predictor on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
