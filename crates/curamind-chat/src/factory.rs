//! Provider selection from configuration.
//!
//! The configured kind string is parsed into a closed [`ProviderSettings`]
//! enum, each variant carrying only the fields its provider needs. Anything
//! that cannot be honoured (unknown kind, missing API key, HTTP client
//! failure) degrades to the offline responder instead of failing.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use curamind_core::config::ProviderConfig;

use crate::provider::{
    GenerationParams, GenerationProvider, HostedApiConfig, HostedApiFlavor, HostedApiProvider,
    LocalModelConfig, LocalModelProvider, OfflineLexicalProvider, RemoteLocalServiceProvider,
    RemoteServiceConfig,
};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENAI_MODEL: &str = "gpt-3.5-turbo";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OPENROUTER_MODEL: &str = "mistralai/mistral-7b-instruct:free";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_MODEL: &str = "gemini-pro";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";
const OLLAMA_MODEL: &str = "gemma2:2b";
const LOCAL_MODEL_DIR: &str = "models/gpt2";

/// Fully resolved settings for exactly one provider.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderSettings {
    HostedApi(HostedApiConfig),
    LocalModel(LocalModelConfig),
    RemoteLocalService(RemoteServiceConfig),
    OfflineLexical { seed: Option<u64> },
}

impl ProviderSettings {
    /// Resolve `kind` against `config`. Never fails.
    pub fn resolve(kind: &str, config: &ProviderConfig, timeout: Duration) -> Self {
        let params = GenerationParams {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        };
        let kind = kind.trim().to_lowercase();
        let offline = ProviderSettings::OfflineLexical { seed: config.seed };

        let hosted = |flavor, base_url: &str, model: &str| {
            match config.api_key.as_deref().map(str::trim) {
                Some(key) if !key.is_empty() => ProviderSettings::HostedApi(HostedApiConfig {
                    flavor,
                    label: kind.clone(),
                    api_key: key.to_string(),
                    base_url: pick(&config.base_url, base_url),
                    model: pick(&config.model, model),
                    params,
                    timeout,
                }),
                _ => {
                    tracing::warn!(kind = %kind, "No API key configured; using offline responses");
                    offline.clone()
                }
            }
        };

        match kind.as_str() {
            "openai" => hosted(HostedApiFlavor::OpenAiCompatible, OPENAI_BASE_URL, OPENAI_MODEL),
            "openrouter" => hosted(
                HostedApiFlavor::OpenAiCompatible,
                OPENROUTER_BASE_URL,
                OPENROUTER_MODEL,
            ),
            "gemini" => hosted(HostedApiFlavor::Gemini, GEMINI_BASE_URL, GEMINI_MODEL),
            "local" => ProviderSettings::LocalModel(LocalModelConfig {
                model_dir: PathBuf::from(pick(&config.model_dir, LOCAL_MODEL_DIR)),
                params,
            }),
            "ollama" => ProviderSettings::RemoteLocalService(RemoteServiceConfig {
                base_url: pick(&config.base_url, OLLAMA_BASE_URL),
                model: pick(&config.model, OLLAMA_MODEL),
                params,
                timeout,
            }),
            "smart" | "offline" => offline,
            other => {
                tracing::warn!(kind = %other, "Unknown provider kind; using offline responses");
                offline
            }
        }
    }
}

/// Use the configured value unless it is missing or blank.
fn pick(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Builds the configured generation provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderFactory {
    timeout: Duration,
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl ProviderFactory {
    /// `timeout` bounds every network request a provider makes.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Construct the provider named by `kind`.
    pub fn create(&self, kind: &str, config: &ProviderConfig) -> Arc<dyn GenerationProvider> {
        Self::build(ProviderSettings::resolve(kind, config, self.timeout))
    }

    /// Construct a provider from already resolved settings.
    pub fn build(settings: ProviderSettings) -> Arc<dyn GenerationProvider> {
        let provider: Arc<dyn GenerationProvider> = match settings {
            ProviderSettings::HostedApi(config) => match HostedApiProvider::new(config) {
                Ok(p) => Arc::new(p),
                Err(e) => {
                    tracing::error!(error = %e, "Hosted provider unavailable; using offline responses");
                    Arc::new(OfflineLexicalProvider::new())
                }
            },
            ProviderSettings::LocalModel(config) => Arc::new(LocalModelProvider::new(config)),
            ProviderSettings::RemoteLocalService(config) => {
                match RemoteLocalServiceProvider::new(config) {
                    Ok(p) => Arc::new(p),
                    Err(e) => {
                        tracing::error!(error = %e, "Ollama provider unavailable; using offline responses");
                        Arc::new(OfflineLexicalProvider::new())
                    }
                }
            }
            ProviderSettings::OfflineLexical { seed: Some(seed) } => {
                Arc::new(OfflineLexicalProvider::seeded(seed))
            }
            ProviderSettings::OfflineLexical { seed: None } => Arc::new(OfflineLexicalProvider::new()),
        };
        tracing::info!(provider = provider.name(), "Generation provider selected");
        provider
    }
}
