use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CuramindError, Result};

/// Top-level configuration for the CuraMind chat service.
///
/// Loaded from `./curamind.toml` by default (see `--config` and
/// `CURAMIND_CONFIG`). Every section is optional and falls back to its
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CuramindConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl CuramindConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CuramindConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CuramindError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Path to the knowledge base corpus.
    pub knowledge_base_path: String,
    /// Prefix that marks a topic title line inside a corpus section.
    pub title_marker: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            knowledge_base_path: "data/knowledge_base.txt".to_string(),
            title_marker: "### \u{1f9e0}".to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Chat requests allowed per second across all clients.
    pub rate_limit_per_sec: u64,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            rate_limit_per_sec: 50,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Chat pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum user message length in characters.
    pub max_message_length: usize,
    /// Number of most recent prior turns forwarded to the provider.
    pub max_history_turns: usize,
    /// Upper bound on a single provider call, in seconds. Zero is read as one.
    pub timeout_secs: u64,
    /// Answer with the offline responder when the configured provider fails.
    pub fallback_to_offline: bool,
    /// Query prefixes (upper case) that are never treated as topic lookups.
    pub greetings: Vec<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
            max_history_turns: 10,
            timeout_secs: 30,
            fallback_to_offline: true,
            greetings: vec!["HELLO".to_string(), "HI".to_string()],
        }
    }
}

impl ChatConfig {
    /// Provider call timeout, never shorter than one second.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Generation provider selection and per-provider settings.
///
/// `kind` is one of `openai`, `openrouter`, `gemini`, `local`, `ollama`,
/// `smart` (alias `offline`). Unrecognised kinds select the offline responder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: String,
    /// API key for hosted providers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Endpoint override; each provider has its own default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model name override; each provider has its own default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Directory holding `model.onnx` and `tokenizer.json` for the local model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<String>,
    /// Maximum tokens to generate per reply.
    pub max_tokens: u32,
    pub temperature: f32,
    /// Seed for the offline responder's canned-response selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: "smart".to_string(),
            api_key: None,
            base_url: None,
            model: None,
            model_dir: None,
            max_tokens: 120,
            temperature: 0.7,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = CuramindConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.title_marker, "### 🧠");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.chat.max_message_length, 2000);
        assert_eq!(config.chat.greetings, vec!["HELLO", "HI"]);
        assert!(config.chat.fallback_to_offline);
        assert_eq!(config.provider.kind, "smart");
        assert_eq!(config.provider.max_tokens, 120);
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let chat = ChatConfig {
            timeout_secs: 0,
            ..ChatConfig::default()
        };
        assert_eq!(chat.timeout(), Duration::from_secs(1));
        assert_eq!(ChatConfig::default().timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"
knowledge_base_path = "/srv/kb.txt"

[server]
host = "0.0.0.0"
port = 8080

[chat]
timeout_secs = 5
fallback_to_offline = false
greetings = ["HELLO", "HI", "HEY"]

[provider]
kind = "openrouter"
api_key = "sk-test"
model = "mistralai/mistral-7b-instruct:free"
"#;
        let file = create_temp_config(content);
        let config = CuramindConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.knowledge_base_path, "/srv/kb.txt");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.chat.timeout_secs, 5);
        assert!(!config.chat.fallback_to_offline);
        assert_eq!(config.chat.greetings.len(), 3);
        assert_eq!(config.provider.kind, "openrouter");
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[provider]
kind = "ollama"
"#;
        let file = create_temp_config(content);
        let config = CuramindConfig::load(file.path()).unwrap();
        assert_eq!(config.provider.kind, "ollama");
        assert_eq!(config.provider.temperature, 0.7);
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.chat.max_history_turns, 10);
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let file = create_temp_config("[server\nport = ");
        let err = CuramindConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, CuramindError::Config(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = CuramindConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.provider.kind, "smart");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = CuramindConfig::default();
        config.provider.kind = "gemini".to_string();
        config.provider.seed = Some(7);
        config.save(&path).unwrap();

        let reloaded = CuramindConfig::load(&path).unwrap();
        assert_eq!(reloaded.provider.kind, "gemini");
        assert_eq!(reloaded.provider.seed, Some(7));
        assert!(reloaded.provider.api_key.is_none());
        assert_eq!(reloaded.general.title_marker, config.general.title_marker);
    }
}
