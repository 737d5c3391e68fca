//! Chat orchestrator: wires retrieval, prompt composition and generation.
//!
//! Validates the incoming message, looks up trusted context, asks the
//! configured provider for a reply within the configured timeout, and falls
//! back to the offline responder when the provider fails.

use std::sync::Arc;

use curamind_core::config::ChatConfig;
use curamind_core::types::{ConversationTurn, GenerationRequest, GenerationResult};

use crate::error::{ChatError, GenerationError};
use crate::prompt::PromptComposer;
use crate::provider::{GenerationProvider, OfflineLexicalProvider};
use crate::retriever::Retriever;

/// Central coordinator for a single chat exchange.
///
/// Holds no per-conversation state; the caller supplies prior history with
/// every message.
pub struct ChatOrchestrator {
    retriever: Retriever,
    composer: PromptComposer,
    provider: Arc<dyn GenerationProvider>,
    fallback: OfflineLexicalProvider,
    config: ChatConfig,
}

impl ChatOrchestrator {
    pub fn new(
        retriever: Retriever,
        provider: Arc<dyn GenerationProvider>,
        config: ChatConfig,
    ) -> Self {
        Self {
            retriever,
            composer: PromptComposer,
            provider,
            fallback: OfflineLexicalProvider::new(),
            config,
        }
    }

    /// Replace the offline responder used on provider failure.
    pub fn with_fallback(mut self, fallback: OfflineLexicalProvider) -> Self {
        self.fallback = fallback;
        self
    }

    /// Name of the configured provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Number of topics in the knowledge base.
    pub fn topic_count(&self) -> usize {
        self.retriever.store().topic_count()
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Handle one user message with the conversation so far.
    pub async fn handle(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<GenerationResult, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if message.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }

        let context = self.retriever.retrieve(message);
        match context {
            Some(content) => tracing::info!(context_chars = content.len(), "Context found"),
            None => tracing::info!("No context found"),
        }

        let system_prompt = self.composer.compose(context);
        let skip = history.len().saturating_sub(self.config.max_history_turns);
        let request = GenerationRequest::new(system_prompt, history[skip..].to_vec(), message);

        match self.generate(&request).await {
            Ok(result) => {
                tracing::debug!(
                    provider = self.provider.name(),
                    confidence = result.confidence,
                    "Reply generated"
                );
                Ok(result)
            }
            Err(e) if self.config.fallback_to_offline && !self.provider.is_offline() => {
                tracing::warn!(
                    provider = self.provider.name(),
                    error = %e,
                    "Provider failed; answering offline"
                );
                Ok(self.fallback.respond(message))
            }
            Err(e) => {
                tracing::error!(provider = self.provider.name(), error = %e, "Provider failed");
                Err(ChatError::Generation(e))
            }
        }
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        let limit = self.config.timeout();
        match tokio::time::timeout(limit, self.provider.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(limit)),
        }
    }
}
