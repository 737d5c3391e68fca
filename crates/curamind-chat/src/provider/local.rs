//! In-process text generation with a lazily initialised pipeline.
//!
//! The pipeline is loaded on the first `generate` call. Initialisation is
//! single-flight: concurrent first callers all await the same load, and every
//! later call reuses the loaded pipeline. A failed load is not cached, so the
//! next call tries again.
//!
//! The bundled [`OnnxPipelineLoader`] runs a causal language model exported to
//! ONNX (e.g. GPT-2) when compiled with the `local-model` feature. Without it,
//! loading fails with `InitFailure`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use curamind_core::types::{GenerationRequest, GenerationResult};

use super::{GenerationParams, GenerationProvider};
use crate::error::GenerationError;

/// Declared confidence for replies from the in-process model.
pub const LOCAL_MODEL_CONFIDENCE: f32 = 0.8;

/// A loaded text-generation pipeline.
///
/// Returns the raw model output, which may begin with the prompt itself.
#[async_trait]
pub trait TextPipeline: Send + Sync {
    async fn generate(&self, prompt: &str, max_new_tokens: usize)
        -> Result<String, GenerationError>;
}

/// Produces a [`TextPipeline`]; called at most once per successful load.
#[async_trait]
pub trait PipelineLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn TextPipeline>, GenerationError>;
}

/// Settings for a [`LocalModelProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct LocalModelConfig {
    /// Directory containing `model.onnx` and `tokenizer.json`.
    pub model_dir: PathBuf,
    pub params: GenerationParams,
}

/// Generates replies with an in-process model.
pub struct LocalModelProvider {
    loader: Box<dyn PipelineLoader>,
    pipeline: OnceCell<Arc<dyn TextPipeline>>,
    params: GenerationParams,
}

impl LocalModelProvider {
    /// Provider backed by the ONNX loader for `config.model_dir`.
    pub fn new(config: LocalModelConfig) -> Self {
        Self::with_loader(OnnxPipelineLoader::new(config.model_dir), config.params)
    }

    pub fn with_loader(loader: impl PipelineLoader + 'static, params: GenerationParams) -> Self {
        Self {
            loader: Box::new(loader),
            pipeline: OnceCell::new(),
            params,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.pipeline.initialized()
    }

    async fn pipeline(&self) -> Result<&Arc<dyn TextPipeline>, GenerationError> {
        self.pipeline
            .get_or_try_init(|| async {
                tracing::info!("Initialising local generation pipeline");
                let pipeline = self.loader.load().await?;
                tracing::info!("Local generation pipeline ready");
                Ok::<_, GenerationError>(pipeline)
            })
            .await
    }
}

/// Render the conversation as a plain completion prompt.
fn build_prompt(request: &GenerationRequest) -> String {
    let mut prompt = String::with_capacity(request.system_prompt.len() + request.user_message.len() + 64);
    prompt.push_str(&request.system_prompt);
    prompt.push_str("\n\n");
    for turn in &request.history {
        prompt.push_str(turn.role.as_str());
        prompt.push_str(": ");
        prompt.push_str(&turn.content);
        prompt.push('\n');
    }
    prompt.push_str("user: ");
    prompt.push_str(&request.user_message);
    prompt.push_str("\nassistant:");
    prompt
}

/// Remove the echoed prompt from the start of the raw output.
fn strip_prompt<'a>(raw: &'a str, prompt: &str) -> &'a str {
    raw.strip_prefix(prompt).unwrap_or(raw).trim()
}

#[async_trait]
impl GenerationProvider for LocalModelProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        let pipeline = self.pipeline().await?;
        let prompt = build_prompt(request);
        let raw = pipeline
            .generate(&prompt, self.params.max_tokens as usize)
            .await?;

        let reply = strip_prompt(&raw, &prompt);
        if reply.is_empty() {
            return Err(GenerationError::EmptyCompletion);
        }
        Ok(GenerationResult::new(reply, LOCAL_MODEL_CONFIDENCE))
    }
}

/// Loads an ONNX causal language model and its tokenizer from a directory.
#[derive(Debug, Clone)]
pub struct OnnxPipelineLoader {
    model_dir: PathBuf,
}

impl OnnxPipelineLoader {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }
}

#[cfg(feature = "local-model")]
#[async_trait]
impl PipelineLoader for OnnxPipelineLoader {
    async fn load(&self) -> Result<Arc<dyn TextPipeline>, GenerationError> {
        let dir = self.model_dir.clone();
        let pipeline = tokio::task::spawn_blocking(move || onnx::OnnxTextPipeline::from_directory(&dir))
            .await
            .map_err(|e| GenerationError::InitFailure(format!("loader task failed: {}", e)))??;
        Ok(Arc::new(pipeline))
    }
}

#[cfg(not(feature = "local-model"))]
#[async_trait]
impl PipelineLoader for OnnxPipelineLoader {
    async fn load(&self) -> Result<Arc<dyn TextPipeline>, GenerationError> {
        tracing::warn!("Local model requested but built without the `local-model` feature");
        Err(GenerationError::InitFailure(format!(
            "local model support not compiled in; cannot load {}",
            self.model_dir.display()
        )))
    }
}

#[cfg(feature = "local-model")]
mod onnx {
    //! Greedy decoding over an ONNX causal LM (inputs: `input_ids`,
    //! `attention_mask`; first output: logits `[batch, seq, vocab]`).

    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use ort::session::Session;
    use ort::value::TensorRef;
    use tokenizers::Tokenizer;

    use super::TextPipeline;
    use crate::error::GenerationError;

    const END_OF_TEXT: &str = "<|endoftext|>";

    struct Inner {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        eos_token_id: Option<u32>,
    }

    pub(super) struct OnnxTextPipeline {
        inner: Arc<Inner>,
    }

    impl OnnxTextPipeline {
        pub(super) fn from_directory(dir: &Path) -> Result<Self, GenerationError> {
            let model_path = dir.join("model.onnx");
            let tokenizer_path = dir.join("tokenizer.json");
            if !model_path.exists() {
                return Err(GenerationError::InitFailure(format!(
                    "ONNX model not found at {}",
                    model_path.display()
                )));
            }
            if !tokenizer_path.exists() {
                return Err(GenerationError::InitFailure(format!(
                    "Tokenizer not found at {}",
                    tokenizer_path.display()
                )));
            }

            let session = Session::builder()
                .map_err(|e| GenerationError::InitFailure(format!("ONNX session builder: {}", e)))?
                .commit_from_file(&model_path)
                .map_err(|e| GenerationError::InitFailure(format!("ONNX load model: {}", e)))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| GenerationError::InitFailure(format!("Failed to load tokenizer: {}", e)))?;
            let eos_token_id = tokenizer.token_to_id(END_OF_TEXT);

            tracing::info!(model = %model_path.display(), "Loaded ONNX text generation model");

            Ok(Self {
                inner: Arc::new(Inner {
                    session: Mutex::new(session),
                    tokenizer,
                    eos_token_id,
                }),
            })
        }
    }

    impl Inner {
        fn next_token(&self, ids: &[i64]) -> Result<u32, GenerationError> {
            let seq_len = ids.len();
            let ids_array = ndarray::Array2::from_shape_vec((1, seq_len), ids.to_vec())
                .map_err(|e| GenerationError::InferenceFailure(format!("input_ids array: {}", e)))?;
            let mask_array = ndarray::Array2::<i64>::ones((1, seq_len));

            let ids_ref = TensorRef::from_array_view(&ids_array)
                .map_err(|e| GenerationError::InferenceFailure(format!("TensorRef input_ids: {}", e)))?;
            let mask_ref = TensorRef::from_array_view(&mask_array).map_err(|e| {
                GenerationError::InferenceFailure(format!("TensorRef attention_mask: {}", e))
            })?;

            let mut session = self
                .session
                .lock()
                .map_err(|e| GenerationError::InferenceFailure(format!("Session lock poisoned: {}", e)))?;
            let outputs = session
                .run(ort::inputs![ids_ref, mask_ref])
                .map_err(|e| GenerationError::InferenceFailure(format!("ONNX inference failed: {}", e)))?;

            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| GenerationError::InferenceFailure(format!("Extract logits: {}", e)))?;

            let vocab = shape.iter().last().copied().unwrap_or(0).max(0) as usize;
            if vocab == 0 || data.len() < seq_len * vocab {
                return Err(GenerationError::InferenceFailure(format!(
                    "Unexpected logits shape: {:?}",
                    shape.iter().collect::<Vec<_>>()
                )));
            }

            let last = &data[(seq_len - 1) * vocab..seq_len * vocab];
            let (best, _) = last
                .iter()
                .enumerate()
                .fold((0usize, f32::NEG_INFINITY), |acc, (i, &v)| {
                    if v > acc.1 {
                        (i, v)
                    } else {
                        acc
                    }
                });
            Ok(best as u32)
        }

        fn generate_sync(&self, prompt: &str, max_new_tokens: usize) -> Result<String, GenerationError> {
            let encoding = self
                .tokenizer
                .encode(prompt, false)
                .map_err(|e| GenerationError::InferenceFailure(format!("Tokenization failed: {}", e)))?;
            let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
            if ids.is_empty() {
                return Err(GenerationError::InferenceFailure("empty prompt".to_string()));
            }

            for _ in 0..max_new_tokens {
                let next = self.next_token(&ids)?;
                if Some(next) == self.eos_token_id {
                    break;
                }
                ids.push(next as i64);
            }

            let generated = new_token_ids(&ids, encoding.len());
            self.tokenizer
                .decode(&generated, true)
                .map_err(|e| GenerationError::InferenceFailure(format!("Decoding failed: {}", e)))
        }
    }

    /// Ids produced after the `prompt_len` prompt tokens.
    fn new_token_ids(ids: &[i64], prompt_len: usize) -> Vec<u32> {
        ids.iter().skip(prompt_len).map(|&id| id as u32).collect()
    }

    #[async_trait]
    impl TextPipeline for OnnxTextPipeline {
        async fn generate(
            &self,
            prompt: &str,
            max_new_tokens: usize,
        ) -> Result<String, GenerationError> {
            let inner = Arc::clone(&self.inner);
            let prompt = prompt.to_string();
            tokio::task::spawn_blocking(move || inner.generate_sync(&prompt, max_new_tokens))
                .await
                .map_err(|e| GenerationError::InferenceFailure(format!("inference task failed: {}", e)))?
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_only_generated_ids_are_decoded() {
            assert_eq!(new_token_ids(&[11, 12, 13, 40, 41], 3), vec![40, 41]);
            assert!(new_token_ids(&[11, 12, 13], 3).is_empty());
        }
    }
}
