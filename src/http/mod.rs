//! REST + WebSocket surface (component E's external face).
//!
//! An Axum [`Router`] built from small per-route handler functions, CORS
//! opened wide (this service has no auth surface), and a plain TCP listener
//! with graceful shutdown driven by a broadcast channel.

pub mod error;
pub mod routes;
pub mod ws;

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use routes::AppState;

/// Builds the REST control surface router. Served on its own port
/// (`rest_port`), separate from the WebSocket dashboard feed — a REST API
/// and a dashboard feed server running side by side on independent ports,
/// not one multiplexed server.
pub fn rest_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/symbols", get(routes::symbols_table))
        .route("/positions/{client_id}", get(routes::positions))
        .route("/positions/{client_id}/{symbol}", get(routes::position_for_symbol))
        .route("/create", post(routes::create))
        .route("/redeem", post(routes::redeem))
        .route("/history", get(routes::history))
        .layer(cors)
        .with_state(state)
}

/// Builds the WebSocket dashboard router, served on its own port (`ws_port`).
pub fn ws_router(state: AppState) -> Router {
    Router::new().route("/", get(ws::upgrade)).with_state(state)
}

/// Serves `router` on `addr` until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    router: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router).with_graceful_shutdown(shutdown).await
}
