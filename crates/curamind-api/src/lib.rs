//! CuraMind API crate - axum HTTP server exposing the chat pipeline.
//!
//! Provides the chatbot endpoint consumed by the health dashboard and a
//! health check for deployment probes.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
