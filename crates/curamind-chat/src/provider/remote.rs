//! Self-hosted inference daemon (Ollama `/api/generate`), no authentication.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use curamind_core::types::{GenerationRequest, GenerationResult};

use super::{http_client, non_empty, GenerationParams, GenerationProvider};
use crate::error::GenerationError;

/// Declared confidence for replies from a self-hosted model.
pub const REMOTE_LOCAL_CONFIDENCE: f32 = 0.85;

/// Settings for a [`RemoteLocalServiceProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteServiceConfig {
    pub base_url: String,
    pub model: String,
    pub params: GenerationParams,
    pub timeout: Duration,
}

/// Generates replies through an Ollama-compatible daemon.
#[derive(Debug)]
pub struct RemoteLocalServiceProvider {
    client: reqwest::Client,
    config: RemoteServiceConfig,
}

impl RemoteLocalServiceProvider {
    pub fn new(mut config: RemoteServiceConfig) -> Result<Self, GenerationError> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self {
            client: http_client(config.timeout)?,
            config,
        })
    }

    pub fn config(&self) -> &RemoteServiceConfig {
        &self.config
    }
}

/// Flatten history and the new question into a single completion prompt.
fn build_prompt(request: &GenerationRequest) -> String {
    let mut prompt = String::new();
    if !request.history.is_empty() {
        prompt.push_str("Here is the conversation history:\n");
        for turn in &request.history {
            prompt.push_str(turn.role.as_str());
            prompt.push_str(": ");
            prompt.push_str(&turn.content);
            prompt.push('\n');
        }
        prompt.push('\n');
    }
    prompt.push_str("Question: ");
    prompt.push_str(&request.user_message);
    prompt.push_str("\n\nAnswer:");
    prompt
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: Option<String>,
}

#[async_trait]
impl GenerationProvider for RemoteLocalServiceProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        let prompt = build_prompt(request);
        let body = OllamaGenerateRequest {
            model: &self.config.model,
            prompt: &prompt,
            system: &request.system_prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.params.temperature,
                num_predict: self.config.params.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::from_transport(e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Ollama returned an error status");
            return Err(GenerationError::from_status(status));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::NetworkFailure(format!("malformed response: {}", e)))?;

        let message = non_empty(parsed.response)?;
        Ok(GenerationResult::new(message, REMOTE_LOCAL_CONFIDENCE))
    }
}
