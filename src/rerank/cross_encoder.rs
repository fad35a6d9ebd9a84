//! Pairwise cross-encoder reranking.
//!
//! Each `(query, passage)` pair is scored independently by an injected
//! [`PairwiseScorer`] collaborator (typically a hosted cross-encoder
//! model); candidates are then sorted by score descending. The sort is
//! stable, so exact ties keep their original retrieval order.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::{RerankedResult, Reranker};
use crate::error::Result;
use crate::store::Candidate;

/// Collaborator that scores query/passage pairs.
///
/// Higher scores mean more relevant. Implementations batch over all
/// passages for one query and return one score per passage, in order.
#[async_trait]
pub trait PairwiseScorer: Send + Sync {
    /// Scorer name for logging.
    fn name(&self) -> &'static str;

    /// Returns one relevance score per passage, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::RagError`] on transport or model
    /// failures; the reranker degrades these to zero scores.
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>>;
}

/// Reranker backed by a pairwise cross-encoder scorer.
pub struct CrossEncoderReranker {
    scorer: Arc<dyn PairwiseScorer>,
}

impl CrossEncoderReranker {
    /// Creates a reranker around the given scorer.
    #[must_use]
    pub fn new(scorer: Arc<dyn PairwiseScorer>) -> Self {
        Self { scorer }
    }
}

impl std::fmt::Debug for CrossEncoderReranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossEncoderReranker")
            .field("scorer", &self.scorer.name())
            .finish()
    }
}

#[async_trait]
impl Reranker for CrossEncoderReranker {
    fn name(&self) -> &'static str {
        "cross-encoder"
    }

    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_r: usize,
    ) -> Vec<RerankedResult> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let passages: Vec<String> = candidates.iter().map(|c| c.passage.render()).collect();

        let scores = match self.scorer.score(query, &passages).await {
            Ok(scores) => scores,
            Err(error) => {
                warn!(%error, scorer = self.scorer.name(), "pairwise scoring failed, degrading to zero scores");
                Vec::new()
            }
        };

        let mut scored: Vec<RerankedResult> = candidates
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| RerankedResult {
                candidate,
                relevance: scores.get(index).copied().map_or(0.0, f64::from),
                index,
            })
            .collect();

        // Stable sort: exact ties keep their retrieval order.
        scored.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        scored.truncate(top_r);
        scored
    }
}
