//! Embedding collaborator abstraction.
//!
//! Text goes in, a fixed-length vector comes out. Dimensionality is
//! fixed per embedding model and is the store's concern, not ours.

mod openai;

pub use openai::OpenAiEmbedder;

use async_trait::async_trait;

use crate::error::{RagError, Result};

/// Trait for embedding provider backends.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &'static str;

    /// Returns the embedding vector for a single text.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyInput`] if the text is empty after
    /// trimming, or [`RagError::ApiRequest`] on transport failures.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Returns embeddings for a sequence of texts, in order.
    ///
    /// The default implementation embeds sequentially; backends with a
    /// batch endpoint override it.
    ///
    /// # Errors
    ///
    /// Fails on the first text that fails to embed.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Normalizes text for embedding: newlines become spaces, outer
/// whitespace is trimmed.
///
/// # Errors
///
/// Returns [`RagError::EmptyInput`] when nothing remains after
/// trimming.
pub(crate) fn clean_text(text: &str) -> Result<String> {
    let cleaned = text.replace('\n', " ").trim().to_string();
    if cleaned.is_empty() {
        return Err(RagError::EmptyInput {
            what: "embedding input",
        });
    }
    Ok(cleaned)
}
