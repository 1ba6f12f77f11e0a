//! HTTP server for driver-behavior monitoring.
//!
//! This module provides an HTTP server that:
//! - Manages accounts, login sessions, and profiles backed by SQLite
//! - Serves the authenticated monitoring pages
//! - Exposes prediction endpoints backed by startup-loaded model bundles
//!
//! # Architecture
//!
//! ```text
//! Browser ──→ /register/ /login/ /profile/ ──→ UserStore (SQLite)
//! Sensor UI ──→ POST /api/predict-behavior/ ──→ ModelRegistry ──→ JSON
//! ```

use crate::config::ModelPaths;
use crate::model::ModelRegistry;
use crate::store::UserStore;
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub mod auth;
pub mod predict;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: IpAddr,
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Path of the SQLite account database
    pub database_path: PathBuf,
    /// Locations of the model bundles to load at startup
    pub model_paths: ModelPaths,
}

/// Shared server state
pub struct AppState {
    /// Account, profile, and session storage
    pub store: UserStore,
    /// Startup-loaded prediction models
    pub models: ModelRegistry,
}

pub type SharedState = Arc<AppState>;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/register/",
            get(auth::register_page).post(auth::register_submit),
        )
        .route("/login/", get(auth::login_page).post(auth::login_submit))
        .route("/logout/", get(auth::logout))
        .route("/home/", get(auth::home))
        .route(
            "/profile/",
            get(auth::profile_page).post(auth::profile_submit),
        )
        .route("/sensor-monitor/", get(auth::sensor_monitor))
        .route("/api/predict-behavior/", post(predict::predict_behavior))
        .route("/api/predict-safety/", post(predict::predict_safety))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let store = UserStore::open(&config.database_path)?;
    let models = ModelRegistry::load(&config.model_paths);
    let state = Arc::new(AppState { store, models });

    let app = router(state);

    let addr = SocketAddr::from((config.host, config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("drivesense server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
