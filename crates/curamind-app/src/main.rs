//! CuraMind - application entry point.
//!
//! Composition root: resolves configuration, loads the knowledge base,
//! selects the generation provider and either answers one message
//! (`--ask`) or serves the HTTP API.

mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use curamind_api::AppState;
use curamind_chat::{
    ChatOrchestrator, KnowledgeStore, OfflineLexicalProvider, ProviderFactory, Retriever,
};
use curamind_core::config::CuramindConfig;

use crate::cli::CliArgs;

/// Wire the chat pipeline from a resolved configuration.
fn build_orchestrator(config: &CuramindConfig) -> ChatOrchestrator {
    let store = KnowledgeStore::load_or_empty(
        Path::new(&config.general.knowledge_base_path),
        &config.general.title_marker,
    );
    let retriever = Retriever::with_greetings(Arc::new(store), &config.chat.greetings);

    let factory = ProviderFactory::new(config.chat.timeout());
    let provider = factory.create(&config.provider.kind, &config.provider);

    let fallback = match config.provider.seed {
        Some(seed) => OfflineLexicalProvider::seeded(seed),
        None => OfflineLexicalProvider::new(),
    };

    ChatOrchestrator::new(retriever, provider, config.chat.clone()).with_fallback(fallback)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = CuramindConfig::load_or_default(&config_file);
    args.apply(&mut config);

    // Tracing. Logs go to stderr so `--ask` output stays clean.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting CuraMind v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = %config_file.display(),
        found = config_file.exists(),
        provider = %config.provider.kind,
        "Configuration resolved"
    );

    let orchestrator = build_orchestrator(&config);
    tracing::info!(
        topics = orchestrator.topic_count(),
        provider = orchestrator.provider_name(),
        "Chat pipeline ready"
    );

    if let Some(message) = args.ask {
        let reply = orchestrator.handle(&message, &[]).await?;
        println!("{}", reply.message);
        return Ok(());
    }

    let state = AppState::new(orchestrator, config.server.clone());
    curamind_api::start_server(&config.server, state).await?;

    Ok(())
}
