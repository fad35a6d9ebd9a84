//! Second-pass reranking of first-pass retrieval candidates.
//!
//! Two interchangeable strategies share one contract:
//!
//! ```text
//!                 ┌──────────────────────────────────┐
//!                 │          Reranker trait           │
//!                 │ rerank(query, candidates, top_r)  │
//!                 └────────────────┬─────────────────┘
//!                                  │
//!              ┌───────────────────┴───────────────────┐
//!              ▼                                       ▼
//!   ┌─────────────────────┐                 ┌────────────────────┐
//!   │ CrossEncoderReranker │                 │    LlmReranker     │
//!   │ (pairwise scorer)    │                 │ (forced tool call) │
//!   └─────────────────────┘                 └────────────────────┘
//! ```
//!
//! Reranking never errors: scorer failures degrade to zero scores and
//! the original retrieval order, observable only in logs. An empty
//! candidate list short-circuits without touching the scorer.

mod cross_encoder;
mod llm;

pub use cross_encoder::{CrossEncoderReranker, PairwiseScorer};
pub use llm::LlmReranker;

use async_trait::async_trait;

use crate::store::Candidate;

/// A candidate with its second-pass relevance score.
#[derive(Debug, Clone)]
pub struct RerankedResult {
    /// The surviving candidate.
    pub candidate: Candidate,
    /// Second-pass relevance score (higher is more relevant).
    pub relevance: f64,
    /// Position of the candidate in the original retrieval order.
    pub index: usize,
}

/// Trait for reranking strategies.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Strategy name for logging.
    fn name(&self) -> &'static str;

    /// Returns the best `top_r` candidates, ordered most relevant
    /// first. Infallible by contract; failures degrade internally.
    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_r: usize,
    ) -> Vec<RerankedResult>;
}
