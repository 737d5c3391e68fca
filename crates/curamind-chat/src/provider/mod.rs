//! Generation providers: interchangeable strategies that turn a composed
//! prompt into a reply.
//!
//! - [`HostedApiProvider`]: authenticated remote APIs (OpenAI-compatible, Gemini).
//! - [`LocalModelProvider`]: an in-process pipeline, initialised once on first use.
//! - [`RemoteLocalServiceProvider`]: a self-hosted Ollama daemon.
//! - [`OfflineLexicalProvider`]: canned keyword responses; never fails.

use async_trait::async_trait;

use curamind_core::types::{GenerationRequest, GenerationResult};

use crate::error::GenerationError;

pub mod hosted;
pub mod local;
pub mod offline;
pub mod remote;

pub use hosted::{HostedApiConfig, HostedApiFlavor, HostedApiProvider};
pub use local::{LocalModelConfig, LocalModelProvider, OnnxPipelineLoader, PipelineLoader, TextPipeline};
pub use offline::OfflineLexicalProvider;
pub use remote::{RemoteLocalServiceProvider, RemoteServiceConfig};

/// A strategy for generating a reply from a composed prompt.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Short identifier used in logs and health output.
    fn name(&self) -> &str;

    /// True for providers that never perform I/O and never fail.
    fn is_offline(&self) -> bool {
        false
    }

    /// Generate a reply. May suspend on network I/O or local inference.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError>;
}

/// Sampling parameters forwarded to network and local backends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 120,
            temperature: 0.7,
        }
    }
}

/// Build an HTTP client whose requests are bounded by `timeout`.
pub(crate) fn http_client(
    timeout: std::time::Duration,
) -> Result<reqwest::Client, GenerationError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GenerationError::InitFailure(format!("HTTP client: {}", e)))
}

/// Return `text` trimmed, or `EmptyCompletion` if nothing is left.
pub(crate) fn non_empty(text: Option<String>) -> Result<String, GenerationError> {
    match text.map(|t| t.trim().to_string()) {
        Some(t) if !t.is_empty() => Ok(t),
        _ => Err(GenerationError::EmptyCompletion),
    }
}
