//! Configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment
//! variables → defaults.

use crate::error::{RagError, Result};

/// Default maximum tokens for a chat answer.
const DEFAULT_ANSWER_MAX_TOKENS: u32 = 400;
/// Default maximum tokens for a query rewrite completion.
const DEFAULT_REWRITE_MAX_TOKENS: u32 = 256;
/// Default character cap applied to a rewritten query.
const DEFAULT_REWRITE_MAX_CHARS: usize = 500;

/// Configuration for the retrieval-augmented chat pipeline.
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model used for the final chat answer.
    pub chat_model: String,
    /// Model used by the query rewriter.
    pub rewrite_model: String,
    /// Model used by the LLM-structured reranker.
    pub rerank_model: String,
    /// Embedding model for ingestion and query vectors.
    pub embed_model: String,
    /// Maximum tokens for the chat answer.
    pub answer_max_tokens: u32,
    /// Maximum tokens for the rewrite completion.
    pub rewrite_max_tokens: u32,
    /// Character cap applied to rewritten queries.
    pub rewrite_max_chars: usize,
}

impl RagConfig {
    /// Creates a new builder for `RagConfig`.
    #[must_use]
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    chat_model: Option<String>,
    rewrite_model: Option<String>,
    rerank_model: Option<String>,
    embed_model: Option<String>,
    answer_max_tokens: Option<u32>,
    rewrite_max_tokens: Option<u32>,
    rewrite_max_chars: Option<usize>,
}

impl RagConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("RAG_PROVIDER").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY")
                .or_else(|_| std::env::var("RAG_API_KEY"))
                .ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("OPENAI_BASE_URL")
                .or_else(|_| std::env::var("RAG_BASE_URL"))
                .ok();
        }
        if self.chat_model.is_none() {
            self.chat_model = std::env::var("RAG_CHAT_MODEL").ok();
        }
        if self.rewrite_model.is_none() {
            self.rewrite_model = std::env::var("RAG_REWRITE_MODEL").ok();
        }
        if self.rerank_model.is_none() {
            self.rerank_model = std::env::var("RAG_RERANK_MODEL").ok();
        }
        if self.embed_model.is_none() {
            self.embed_model = std::env::var("RAG_EMBED_MODEL").ok();
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the chat answer model.
    #[must_use]
    pub fn chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = Some(model.into());
        self
    }

    /// Sets the query rewrite model.
    #[must_use]
    pub fn rewrite_model(mut self, model: impl Into<String>) -> Self {
        self.rewrite_model = Some(model.into());
        self
    }

    /// Sets the reranker model.
    #[must_use]
    pub fn rerank_model(mut self, model: impl Into<String>) -> Self {
        self.rerank_model = Some(model.into());
        self
    }

    /// Sets the embedding model.
    #[must_use]
    pub fn embed_model(mut self, model: impl Into<String>) -> Self {
        self.embed_model = Some(model.into());
        self
    }

    /// Sets the maximum tokens for the chat answer.
    #[must_use]
    pub const fn answer_max_tokens(mut self, n: u32) -> Self {
        self.answer_max_tokens = Some(n);
        self
    }

    /// Sets the maximum tokens for the rewrite completion.
    #[must_use]
    pub const fn rewrite_max_tokens(mut self, n: u32) -> Self {
        self.rewrite_max_tokens = Some(n);
        self
    }

    /// Sets the character cap for rewritten queries.
    #[must_use]
    pub const fn rewrite_max_chars(mut self, n: usize) -> Self {
        self.rewrite_max_chars = Some(n);
        self
    }

    /// Builds the [`RagConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ApiKeyMissing`] if no API key was set.
    pub fn build(self) -> Result<RagConfig> {
        let api_key = self.api_key.ok_or(RagError::ApiKeyMissing)?;

        Ok(RagConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            chat_model: self.chat_model.unwrap_or_else(|| "gpt-4o".to_string()),
            rewrite_model: self
                .rewrite_model
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            rerank_model: self
                .rerank_model
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            embed_model: self
                .embed_model
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            answer_max_tokens: self.answer_max_tokens.unwrap_or(DEFAULT_ANSWER_MAX_TOKENS),
            rewrite_max_tokens: self
                .rewrite_max_tokens
                .unwrap_or(DEFAULT_REWRITE_MAX_TOKENS),
            rewrite_max_chars: self
                .rewrite_max_chars
                .unwrap_or(DEFAULT_REWRITE_MAX_CHARS),
        })
    }
}
