//! Error types for the chat pipeline.

use std::path::PathBuf;
use std::time::Duration;

/// Message shown to users when no provider could produce a reply.
pub const GENERATION_FAILED_MESSAGE: &str = "Sorry, I couldn't get a response.";

/// The knowledge base corpus could not be loaded.
///
/// Never fatal: callers log it and continue with an empty store.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeLoadError {
    #[error("cannot read knowledge base {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Provider-local failure while generating a reply.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("network failure: {0}")]
    NetworkFailure(String),
    #[error("authentication rejected: {0}")]
    AuthFailure(String),
    #[error("provider returned no completion text")]
    EmptyCompletion,
    #[error("model initialisation failed: {0}")]
    InitFailure(String),
    #[error("inference failed: {0}")]
    InferenceFailure(String),
    #[error("provider timed out after {0:?}")]
    Timeout(Duration),
}

impl GenerationError {
    /// Map a reqwest transport error, keeping timeouts distinct.
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout(timeout)
        } else if err.is_connect() {
            GenerationError::NetworkFailure(format!("connection failed: {}", err))
        } else {
            GenerationError::NetworkFailure(err.to_string())
        }
    }

    /// Map a non-success HTTP status. 401 and 403 are authentication failures.
    pub(crate) fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => GenerationError::AuthFailure(format!("HTTP {}", status.as_u16())),
            code => GenerationError::NetworkFailure(format!("HTTP {}", code)),
        }
    }
}

/// Errors returned by [`crate::ChatOrchestrator::handle`].
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
}

impl ChatError {
    /// Whether the caller supplied an invalid request.
    pub fn is_validation(&self) -> bool {
        matches!(self, ChatError::EmptyMessage | ChatError::MessageTooLong(_))
    }
}
