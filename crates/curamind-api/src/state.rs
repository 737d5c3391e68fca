//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use curamind_chat::ChatOrchestrator;
use curamind_core::config::ServerConfig;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Chat pipeline. Stateless per request, so shared without locking.
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Listener, rate limit and body size settings.
    pub server: ServerConfig,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(orchestrator: ChatOrchestrator, server: ServerConfig) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            server,
            start_time: Instant::now(),
        }
    }
}
