//! Route handler functions.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use curamind_core::types::ConversationTurn;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /api/chatbot/chat.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Prior turns, oldest first.
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

/// Response body for POST /api/chatbot/chat.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub confidence: f32,
}

/// POST /api/chatbot/chat - answer one user message.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = body?;
    tracing::debug!(
        message_chars = request.message.chars().count(),
        history_turns = request.history.len(),
        "Chat request"
    );

    let result = state
        .orchestrator
        .handle(&request.message, &request.history)
        .await?;

    Ok(Json(ChatResponse {
        response: result.message,
        confidence: result.confidence,
    }))
}

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub knowledge_topics: usize,
    pub provider: String,
}

/// GET /health - liveness and pipeline summary.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        knowledge_topics: state.orchestrator.topic_count(),
        provider: state.orchestrator.provider_name().to_string(),
    })
}
