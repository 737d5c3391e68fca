//! CLI argument definitions for the `curamind` binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::Parser;

use curamind_core::config::CuramindConfig;

/// CuraMind - health-information chat assistant backed by a curated knowledge base.
#[derive(Parser, Debug, Default)]
#[command(name = "curamind", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// API server bind address.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Knowledge base corpus file.
    #[arg(short = 'k', long = "knowledge-base")]
    pub knowledge_base: Option<PathBuf>,

    /// Generation provider (openai, openrouter, gemini, local, ollama, smart).
    #[arg(long = "provider")]
    pub provider: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Answer a single message on stdout instead of starting the server.
    #[arg(long = "ask", value_name = "MESSAGE")]
    pub ask: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CURAMIND_CONFIG env var > ./curamind.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.resolve_config_path_with(|k| std::env::var(k).ok())
    }

    fn resolve_config_path_with(&self, env: impl Fn(&str) -> Option<String>) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = env("CURAMIND_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("curamind.toml")
    }

    /// Apply CLI and environment overrides to a loaded configuration.
    pub fn apply(&self, config: &mut CuramindConfig) {
        self.apply_with(config, |k| std::env::var(k).ok())
    }

    fn apply_with(&self, config: &mut CuramindConfig, env: impl Fn(&str) -> Option<String>) {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = self
            .port
            .or_else(|| env("CURAMIND_PORT").and_then(|v| v.parse().ok()))
        {
            config.server.port = port;
        }
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(ref path) = self.knowledge_base {
            config.general.knowledge_base_path = path.to_string_lossy().to_string();
        }
        if let Some(kind) = self.provider.clone().or_else(|| env("CURAMIND_PROVIDER")) {
            config.provider.kind = kind;
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }

        let provider_key = match config.provider.kind.trim().to_lowercase().as_str() {
            "openrouter" => Some("OPENROUTER_API_KEY"),
            "openai" => Some("OPENAI_API_KEY"),
            "gemini" => Some("GEMINI_API_KEY"),
            _ => None,
        };
        if let Some(key) =
            env("CURAMIND_API_KEY").or_else(|| provider_key.and_then(|name| env(name)))
        {
            config.provider.api_key = Some(key);
        }
    }
}
