//! Vector store collaborator abstraction.
//!
//! The store is an external service from the pipeline's point of view:
//! this module defines only the contracts (insert-with-dedup,
//! nearest-vector search, keyword search, hybrid search) plus the
//! passage and candidate types that flow through them. An in-memory
//! reference implementation lives in [`memory`].

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A passage as stored and retrieved.
///
/// Equality over all textual fields is the dedup key for
/// [`VectorStore::insert_if_absent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Passage {
    /// A question/answer pair from a FAQ corpus.
    Qa {
        /// The question text.
        question: String,
        /// The answer text.
        answer: String,
    },
    /// A span of running text (e.g. a story part).
    Part {
        /// The span text.
        part: String,
    },
}

impl Passage {
    /// Renders the passage as scoring/embedding text: `"Q: …\nA: …"`
    /// for pairs, the raw span for parts.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Qa { question, answer } => format!("Q: {question}\nA: {answer}"),
            Self::Part { part } => part.clone(),
        }
    }
}

/// The first-pass retrieval score attached to a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalScore {
    /// Vector search distance; lower is closer.
    Distance(f64),
    /// Keyword or hybrid relevance score; higher is better.
    Relevance(f64),
}

/// A retrieved passage with its score and source identifier.
///
/// Candidates are ephemeral: created per query, discarded after the
/// turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The retrieved passage.
    pub passage: Passage,
    /// First-pass retrieval score.
    pub score: RetrievalScore,
    /// Identifier of the backing record (e.g. a database row id).
    pub source_id: String,
}

/// Trait for vector store backends.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Inserts a passage with its vector unless an identical record
    /// already exists (exact match on all textual fields).
    ///
    /// Returns the new record's id, or `None` when it already existed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::RagError::Store`] on backend failures.
    async fn insert_if_absent(&self, passage: &Passage, vector: &[f32])
    -> Result<Option<String>>;

    /// Nearest-vector search, ordered by ascending distance.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::RagError::Store`] on backend failures.
    async fn vector_search(&self, vector: &[f32], limit: usize) -> Result<Vec<Candidate>>;

    /// Keyword (BM25-style) search, ordered by descending score.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::RagError::Store`] on backend failures.
    async fn keyword_search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>>;

    /// Hybrid search blending keyword and vector signals:
    /// `score = alpha * keyword + (1 - alpha) * vector`, with
    /// `alpha` in `[0, 1]`. With no vector, keyword-only weighting
    /// applies per `alpha`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::RagError::InvalidAlpha`] for an
    /// out-of-range `alpha`, or [`crate::error::RagError::Store`] on
    /// backend failures.
    async fn hybrid_search(
        &self,
        query: &str,
        vector: Option<&[f32]>,
        alpha: f64,
        limit: usize,
    ) -> Result<Vec<Candidate>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passage_render_qa() {
        let p = Passage::Qa {
            question: "What?".to_string(),
            answer: "That.".to_string(),
        };
        assert_eq!(p.render(), "Q: What?\nA: That.");
    }

    #[test]
    fn test_passage_render_part() {
        let p = Passage::Part {
            part: "Once upon a time".to_string(),
        };
        assert_eq!(p.render(), "Once upon a time");
    }

    #[test]
    fn test_passage_equality_is_field_exact() {
        let a = Passage::Qa {
            question: "q".to_string(),
            answer: "a".to_string(),
        };
        let b = Passage::Qa {
            question: "q".to_string(),
            answer: "a".to_string(),
        };
        let c = Passage::Qa {
            question: "q".to_string(),
            answer: "a ".to_string(),
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
