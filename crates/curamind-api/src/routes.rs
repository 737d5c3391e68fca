//! Router setup and server startup.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use curamind_core::config::ServerConfig;
use curamind_core::error::{CuramindError, Result};

use crate::handlers;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
///
/// The dashboard is served from another origin, so CORS is permissive.
/// A `rate_limit_per_sec` of zero disables rate limiting.
pub fn create_router(state: AppState) -> Router {
    let mut chat_routes = Router::new().route("/api/chatbot/chat", post(handlers::chat));
    if state.server.rate_limit_per_sec > 0 {
        chat_routes = chat_routes
            .layer(axum::middleware::from_fn(rate_limit_middleware))
            .layer(axum::Extension(RateLimiter::new(
                state.server.rate_limit_per_sec,
            )));
    }

    Router::new()
        .route("/health", get(handlers::health))
        .merge(chat_routes)
        .layer(DefaultBodyLimit::max(state.server.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CuramindError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(addr = %addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CuramindError::Api(format!("Server error: {}", e)))?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
