//! Conversation and generation types shared by the chat pipeline and the API.

use serde::{Deserialize, Serialize};

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single prior turn supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Everything a provider needs to produce one reply.
///
/// Built fresh for each call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub history: Vec<ConversationTurn>,
    pub user_message: String,
}

impl GenerationRequest {
    pub fn new(
        system_prompt: impl Into<String>,
        history: Vec<ConversationTurn>,
        user_message: impl Into<String>,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            history,
            user_message: user_message.into(),
        }
    }
}

/// A provider's reply.
///
/// `confidence` is declared by the provider, not measured, and always lies
/// in `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub message: String,
    pub confidence: f32,
}

impl GenerationResult {
    pub fn new(message: impl Into<String>, confidence: f32) -> Self {
        Self {
            message: message.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}
