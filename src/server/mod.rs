//! API server — Axum JSON API over the analysis core and its
//! collaborators (auth, history, settings, extraction).
//!
//! CORS enabled for local development. The router is built by a free
//! function so integration tests can drive it without binding a port.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use routes::AppState;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        // Auth
        .route("/api/auth/register", post(routes::register))
        .route("/api/auth/login", post(routes::login))
        .route("/api/auth/logout", post(routes::logout))
        .route("/api/auth/me", get(routes::me))
        // Analysis core
        .route("/api/evaluate", post(routes::evaluate_facts))
        .route("/api/evaluate/max-bid", post(routes::max_bid))
        .route("/api/evaluate/outlook", post(routes::scenario_outlook))
        // Saved analyses
        .route(
            "/api/analyses",
            get(routes::list_analyses).post(routes::save_analysis),
        )
        .route(
            "/api/analyses/:id",
            get(routes::get_analysis).delete(routes::delete_analysis),
        )
        // Settings
        .route(
            "/api/settings",
            get(routes::get_settings).put(routes::put_settings),
        )
        // Extraction
        .route("/api/extract", post(routes::extract_notice))
        // Admin
        .route("/api/admin/users", get(routes::admin_list_users))
        .route("/api/admin/users/:id/toggle", post(routes::admin_toggle_user))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "API server starting on http://localhost:{port}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind server port")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received.");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
