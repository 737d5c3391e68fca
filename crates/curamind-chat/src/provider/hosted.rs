//! Hosted text-generation APIs reached over an authenticated HTTPS call.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use curamind_core::types::{GenerationRequest, GenerationResult, Role};

use super::{http_client, non_empty, GenerationParams, GenerationProvider};
use crate::error::GenerationError;

/// Declared confidence for replies from hosted models.
pub const HOSTED_CONFIDENCE: f32 = 0.9;

/// Wire format spoken by the hosted endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostedApiFlavor {
    /// `POST {base}/chat/completions` with a bearer token (OpenAI, OpenRouter).
    OpenAiCompatible,
    /// `POST {base}/models/{model}:generateContent` with an API key header.
    Gemini,
}

/// Settings for a [`HostedApiProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct HostedApiConfig {
    pub flavor: HostedApiFlavor,
    /// Name reported in logs, e.g. `openrouter`.
    pub label: String,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub params: GenerationParams,
    pub timeout: Duration,
}

/// Generates replies through a hosted API.
pub struct HostedApiProvider {
    client: reqwest::Client,
    config: HostedApiConfig,
}

impl std::fmt::Debug for HostedApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedApiProvider")
            .field("label", &self.config.label)
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

impl HostedApiProvider {
    pub fn new(mut config: HostedApiConfig) -> Result<Self, GenerationError> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self {
            client: http_client(config.timeout)?,
            config,
        })
    }

    pub fn config(&self) -> &HostedApiConfig {
        &self.config
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        request: reqwest::RequestBuilder,
        body: &B,
    ) -> Result<reqwest::Response, GenerationError> {
        let response = request
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::from_transport(e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                provider = %self.config.label,
                status = status.as_u16(),
                "Hosted API returned an error status"
            );
            return Err(GenerationError::from_status(status));
        }
        Ok(response)
    }

    async fn generate_openai(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(ChatMessage {
            role: "system",
            content: &request.system_prompt,
        });
        messages.extend(request.history.iter().map(|turn| ChatMessage {
            role: turn.role.as_str(),
            content: &turn.content,
        }));
        messages.push(ChatMessage {
            role: Role::User.as_str(),
            content: &request.user_message,
        });

        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.params.max_tokens,
            temperature: self.config.params.temperature,
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .send(
                self.client.post(&url).bearer_auth(&self.config.api_key),
                &body,
            )
            .await?;

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::NetworkFailure(format!("malformed response: {}", e)))?;

        non_empty(
            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content),
        )
    }

    async fn generate_gemini(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let mut contents: Vec<GeminiContent> = request
            .history
            .iter()
            .map(|turn| GeminiContent {
                role: Some(match turn.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                }),
                parts: vec![GeminiPart {
                    text: &turn.content,
                }],
            })
            .collect();
        contents.push(GeminiContent {
            role: Some("user"),
            parts: vec![GeminiPart {
                text: &request.user_message,
            }],
        });

        let body = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: &request.system_prompt,
                }],
            },
            contents,
            generation_config: GeminiGenerationConfig {
                max_output_tokens: self.config.params.max_tokens,
                temperature: self.config.params.temperature,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let response = self
            .send(
                self.client
                    .post(&url)
                    .header("x-goog-api-key", &self.config.api_key),
                &body,
            )
            .await?;

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::NetworkFailure(format!("malformed response: {}", e)))?;

        let text = parsed.candidates.into_iter().next().map(|candidate| {
            candidate
                .content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        });
        non_empty(text)
    }
}

#[async_trait]
impl GenerationProvider for HostedApiProvider {
    fn name(&self) -> &str {
        &self.config.label
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        let message = match self.config.flavor {
            HostedApiFlavor::OpenAiCompatible => self.generate_openai(request).await?,
            HostedApiFlavor::Gemini => self.generate_gemini(request).await?,
        };
        Ok(GenerationResult::new(message, HOSTED_CONFIDENCE))
    }
}

// -- OpenAI-compatible wire types --

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// -- Gemini wire types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::test_support::spawn_stub;
    use axum::http::{HeaderMap, StatusCode, Uri};
    use axum::routing::post;
    use axum::{Json, Router};
    use curamind_core::types::ConversationTurn;
    use serde_json::{json, Value};

    fn config(flavor: HostedApiFlavor, base_url: String) -> HostedApiConfig {
        HostedApiConfig {
            flavor,
            label: "test".to_string(),
            api_key: "sk-test".to_string(),
            base_url,
            model: "test-model".to_string(),
            params: GenerationParams::default(),
            timeout: Duration::from_secs(5),
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new(
            "be helpful",
            vec![
                ConversationTurn::user("earlier question"),
                ConversationTurn::assistant("earlier answer"),
            ],
            "what about sleep?",
        )
    }

    async fn openai_handler(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer sk-test") {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
        }
        let messages = body["messages"].as_array().cloned().unwrap_or_default();
        let roles: Vec<String> = messages
            .iter()
            .map(|m| m["role"].as_str().unwrap_or_default().to_string())
            .collect();
        let reply = format!("{} | {}", roles.join(","), body["model"].as_str().unwrap_or_default());
        (
            StatusCode::OK,
            Json(json!({"choices": [{"message": {"role": "assistant", "content": reply}}]})),
        )
    }

    #[tokio::test]
    async fn test_openai_maps_first_choice() {
        let base = spawn_stub(Router::new().route("/chat/completions", post(openai_handler))).await;
        let provider =
            HostedApiProvider::new(config(HostedApiFlavor::OpenAiCompatible, format!("{}/", base)))
                .unwrap();

        let result = provider.generate(&request()).await.unwrap();
        assert_eq!(result.message, "system,user,assistant,user | test-model");
        assert_eq!(result.confidence, HOSTED_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_openai_bad_key_is_auth_failure() {
        let base = spawn_stub(Router::new().route("/chat/completions", post(openai_handler))).await;
        let mut cfg = config(HostedApiFlavor::OpenAiCompatible, base);
        cfg.api_key = "wrong".to_string();
        let provider = HostedApiProvider::new(cfg).unwrap();

        let err = provider.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::AuthFailure(_)));
    }

    #[tokio::test]
    async fn test_openai_server_error_is_network_failure() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = spawn_stub(router).await;
        let provider =
            HostedApiProvider::new(config(HostedApiFlavor::OpenAiCompatible, base)).unwrap();

        let err = provider.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::NetworkFailure(_)));
    }

    #[tokio::test]
    async fn test_openai_no_choices_is_empty_completion() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { Json(json!({"choices": []})) }),
        );
        let base = spawn_stub(router).await;
        let provider =
            HostedApiProvider::new(config(HostedApiFlavor::OpenAiCompatible, base)).unwrap();

        let err = provider.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyCompletion));
    }

    #[tokio::test]
    async fn test_openai_null_content_is_empty_completion() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { Json(json!({"choices": [{"message": {"content": null}}]})) }),
        );
        let base = spawn_stub(router).await;
        let provider =
            HostedApiProvider::new(config(HostedApiFlavor::OpenAiCompatible, base)).unwrap();

        let err = provider.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyCompletion));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({"choices": []}))
            }),
        );
        let base = spawn_stub(router).await;
        let mut cfg = config(HostedApiFlavor::OpenAiCompatible, base);
        cfg.timeout = Duration::from_millis(100);
        let provider = HostedApiProvider::new(cfg).unwrap();

        let err = provider.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_failure() {
        // Bind then drop so the port is closed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = HostedApiProvider::new(config(
            HostedApiFlavor::OpenAiCompatible,
            format!("http://{}", addr),
        ))
        .unwrap();

        let err = provider.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::NetworkFailure(_)));
    }

    #[tokio::test]
    async fn test_gemini_request_shape_and_reply() {
        let router = Router::new().fallback(
            |uri: Uri, headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(uri.path(), "/models/test-model:generateContent");
                assert_eq!(
                    headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()),
                    Some("sk-test")
                );
                assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be helpful");
                assert_eq!(body["contents"][1]["role"], "model");
                assert_eq!(body["contents"][2]["parts"][0]["text"], "what about sleep?");
                assert_eq!(body["generationConfig"]["maxOutputTokens"], 120);
                Json(json!({
                    "candidates": [{"content": {"parts": [{"text": "Sleep "}, {"text": "7-9 hours."}]}}]
                }))
            },
        );
        let base = spawn_stub(router).await;
        let provider = HostedApiProvider::new(config(HostedApiFlavor::Gemini, base)).unwrap();

        let result = provider.generate(&request()).await.unwrap();
        assert_eq!(result.message, "Sleep 7-9 hours.");
        assert_eq!(result.confidence, HOSTED_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_gemini_no_candidates_is_empty_completion() {
        let router = Router::new().fallback(|| async { Json(json!({"candidates": []})) });
        let base = spawn_stub(router).await;
        let provider = HostedApiProvider::new(config(HostedApiFlavor::Gemini, base)).unwrap();

        let err = provider.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyCompletion));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let provider = HostedApiProvider::new(config(
            HostedApiFlavor::OpenAiCompatible,
            "http://localhost".to_string(),
        ))
        .unwrap();
        assert!(!format!("{:?}", provider).contains("sk-test"));
    }
}
