//! In-memory [`VectorStore`] implementation for tests and the
//! self-contained demo binary.
//!
//! Brute-force cosine distance over all stored vectors; keyword search
//! is a term-overlap score (no FTS index). Good enough for a corpus of
//! FAQ pairs and story parts, useless at scale — production deployments
//! point the traits at a hosted store.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Candidate, Passage, RetrievalScore, VectorStore};
use crate::error::{RagError, Result};

struct Row {
    id: String,
    passage: Passage,
    vector: Vec<f32>,
}

/// In-memory vector store.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Row>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.rows.lock().map_or(0, |rows| rows.len())
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("rows", &self.len())
            .finish()
    }
}

fn cosine_sim(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        f64::from(dot / (mag_a * mag_b))
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Fraction of query terms present in the passage.
fn keyword_score(query_terms: &HashSet<String>, passage: &Passage) -> f64 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let doc_terms = terms(&passage.render());
    #[allow(clippy::cast_precision_loss)]
    let score = query_terms.intersection(&doc_terms).count() as f64 / query_terms.len() as f64;
    score
}

/// Cosine similarity mapped onto `[0, 1]` for blending.
fn vector_score(query: &[f32], row: &[f32]) -> f64 {
    cosine_sim(query, row).clamp(0.0, 1.0)
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn insert_if_absent(
        &self,
        passage: &Passage,
        vector: &[f32],
    ) -> Result<Option<String>> {
        let mut rows = self.rows.lock().map_err(|_| RagError::Store {
            message: "store lock poisoned".to_string(),
        })?;

        if rows.iter().any(|row| row.passage == *passage) {
            return Ok(None);
        }

        let id = format!("rec-{}", rows.len() + 1);
        rows.push(Row {
            id: id.clone(),
            passage: passage.clone(),
            vector: vector.to_vec(),
        });
        Ok(Some(id))
    }

    async fn vector_search(&self, vector: &[f32], limit: usize) -> Result<Vec<Candidate>> {
        let rows = self.rows.lock().map_err(|_| RagError::Store {
            message: "store lock poisoned".to_string(),
        })?;

        let mut hits: Vec<Candidate> = rows
            .iter()
            .map(|row| Candidate {
                passage: row.passage.clone(),
                score: RetrievalScore::Distance(1.0 - cosine_sim(vector, &row.vector)),
                source_id: row.id.clone(),
            })
            .collect();

        hits.sort_by(|a, b| match (&a.score, &b.score) {
            (RetrievalScore::Distance(x), RetrievalScore::Distance(y)) => x.total_cmp(y),
            _ => std::cmp::Ordering::Equal,
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn keyword_search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>> {
        let rows = self.rows.lock().map_err(|_| RagError::Store {
            message: "store lock poisoned".to_string(),
        })?;

        let query_terms = terms(query);
        let mut hits: Vec<Candidate> = rows
            .iter()
            .filter_map(|row| {
                let score = keyword_score(&query_terms, &row.passage);
                (score > 0.0).then(|| Candidate {
                    passage: row.passage.clone(),
                    score: RetrievalScore::Relevance(score),
                    source_id: row.id.clone(),
                })
            })
            .collect();

        hits.sort_by(|a, b| match (&a.score, &b.score) {
            (RetrievalScore::Relevance(x), RetrievalScore::Relevance(y)) => y.total_cmp(x),
            _ => std::cmp::Ordering::Equal,
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn hybrid_search(
        &self,
        query: &str,
        vector: Option<&[f32]>,
        alpha: f64,
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(RagError::InvalidAlpha { alpha });
        }

        let rows = self.rows.lock().map_err(|_| RagError::Store {
            message: "store lock poisoned".to_string(),
        })?;

        let query_terms = terms(query);
        let mut hits: Vec<Candidate> = rows
            .iter()
            .map(|row| {
                let keyword = keyword_score(&query_terms, &row.passage);
                let semantic = vector.map_or(0.0, |v| vector_score(v, &row.vector));
                Candidate {
                    passage: row.passage.clone(),
                    score: RetrievalScore::Relevance(
                        alpha.mul_add(keyword, (1.0 - alpha) * semantic),
                    ),
                    source_id: row.id.clone(),
                }
            })
            .collect();

        hits.sort_by(|a, b| match (&a.score, &b.score) {
            (RetrievalScore::Relevance(x), RetrievalScore::Relevance(y)) => y.total_cmp(x),
            _ => std::cmp::Ordering::Equal,
        });
        hits.truncate(limit);
        Ok(hits)
    }
}
