//! HTTP server module for the relay and its companion endpoints.
//!
//! Serves the two WebSocket drawing channels, the health probe, demo
//! accounts, the mock diagram cleanup and the static frontend.

pub mod routes;
pub mod state;
pub mod ws;

use crate::config::Config;
use crate::error::ServerError;
use crate::server::routes::{auth, cleanup, health};
use crate::server::state::AppState;
use crate::server::ws::{ws_draw_handler, ws_handler};

use axum::{
    http::HeaderValue,
    routing::{get, get_service, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

/// Builds the application router.
pub fn router(state: Arc<AppState>, config: &Config) -> Router {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // Credentials rule out wildcards, so methods and headers are mirrored.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    let static_dir = &config.static_dir;

    Router::new()
        // Real-time drawing channels
        .route("/ws", get(ws_handler))
        .route("/ws/draw", get(ws_draw_handler))
        // Health check
        .route("/health", get(health::health_check))
        // Demo accounts
        .route(
            "/login",
            get_service(ServeFile::new(static_dir.join("login.html"))).post(auth::login),
        )
        .route(
            "/register",
            get_service(ServeFile::new(static_dir.join("register.html"))).post(auth::register),
        )
        // Diagram cleanup
        .route("/ai/cleanup", post(cleanup::ai_cleanup))
        // Frontend
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(cors)
        .with_state(state)
}

/// Serves on an already bound listener until `shutdown` flips to true.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    config: &Config,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let app = router(state, config);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
            tracing::info!("HTTP server shutting down");
        })
        .await
        .map_err(ServerError::Serve)
}

/// Binds the configured address and runs the server.
pub async fn run_server(config: Config, shutdown: watch::Receiver<bool>) -> Result<(), ServerError> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    tracing::info!("HTTP server listening on http://{}", addr);

    let state = Arc::new(AppState::new(&config, shutdown.clone()));
    serve(listener, state, &config, shutdown).await
}
