//! Health-information chat pipeline for CuraMind.
//!
//! Retrieves curated knowledge for a user message, composes the system
//! prompt, and asks a pluggable generation provider for the reply, falling
//! back to an offline responder when the provider is unavailable.

pub mod error;
pub mod factory;
pub mod knowledge;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod retriever;

pub use error::{ChatError, GenerationError, KnowledgeLoadError};
pub use factory::{ProviderFactory, ProviderSettings};
pub use knowledge::{KnowledgeEntry, KnowledgeStore};
pub use orchestrator::ChatOrchestrator;
pub use prompt::PromptComposer;
pub use provider::{
    GenerationProvider, HostedApiFlavor, HostedApiProvider, LocalModelProvider,
    OfflineLexicalProvider, RemoteLocalServiceProvider,
};
pub use retriever::Retriever;
