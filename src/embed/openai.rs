//! `OpenAI` embeddings implementation using the `async-openai` crate.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateEmbeddingRequest, EmbeddingInput};
use async_trait::async_trait;

use super::{EmbeddingProvider, clean_text};
use crate::config::RagConfig;
use crate::error::{RagError, Result};

/// `OpenAI` embedding provider.
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbedder {
    /// Creates a new embedder from configuration.
    #[must_use]
    pub fn new(config: &RagConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);

        if let Some(ref base_url) = config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        Self {
            client: Client::with_config(openai_config),
            model: config.embed_model.clone(),
        }
    }

    fn request(&self, input: EmbeddingInput) -> CreateEmbeddingRequest {
        CreateEmbeddingRequest {
            model: self.model.clone(),
            input,
            encoding_format: None,
            user: None,
            dimensions: None,
        }
    }
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let cleaned = clean_text(text)?;

        let response = self
            .client
            .embeddings()
            .create(self.request(EmbeddingInput::String(cleaned)))
            .await
            .map_err(|e| RagError::ApiRequest {
                message: e.to_string(),
                status: None,
            })?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| RagError::ResponseParse {
                message: "embedding response contained no data".to_string(),
                content: String::new(),
            })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let cleaned: Vec<String> = texts
            .iter()
            .map(|t| clean_text(t))
            .collect::<Result<_>>()?;

        let response = self
            .client
            .embeddings()
            .create(self.request(EmbeddingInput::StringArray(cleaned)))
            .await
            .map_err(|e| RagError::ApiRequest {
                message: e.to_string(),
                status: None,
            })?;

        if response.data.len() != texts.len() {
            return Err(RagError::ResponseParse {
                message: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    response.data.len()
                ),
                content: String::new(),
            });
        }

        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}
