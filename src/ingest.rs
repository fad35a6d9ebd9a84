//! Corpus ingestion pipelines.
//!
//! Chunk → embed → dedup-insert, sequentially, one chunk at a time.
//! FAQ documents go through the QA parser; story text goes through the
//! fixed-size or overlapping span chunker. Re-ingesting an identical
//! corpus is a no-op thanks to the store's exact-match dedup.

use std::sync::Arc;

use tracing::{debug, info};

use crate::chunk::Chunker;
use crate::chunk::qa::parse_qa_pairs;
use crate::embed::EmbeddingProvider;
use crate::error::Result;
use crate::store::{Passage, VectorStore};

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Chunks processed (parsed/sliced and embedded).
    pub processed: usize,
    /// Records actually inserted.
    pub inserted: usize,
    /// Records skipped because an identical one already existed.
    pub deduplicated: usize,
}

/// Ingests chunked corpora into a vector store.
pub struct Ingester {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl Ingester {
    /// Creates an ingester over the given collaborators.
    #[must_use]
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Parses a FAQ document into Q/A pairs, embeds each pair's
    /// combined text, and inserts with dedup. Honors an optional limit
    /// on the number of pairs.
    ///
    /// # Errors
    ///
    /// Propagates embedding and store failures.
    pub async fn ingest_faq(&self, text: &str, limit: Option<usize>) -> Result<IngestReport> {
        let pairs = parse_qa_pairs(text);
        let take = limit.unwrap_or(pairs.len());

        let mut report = IngestReport::default();
        for pair in pairs.iter().take(take) {
            let vector = self.embedder.embed(&pair.chunk_text()).await?;
            let passage = Passage::Qa {
                question: pair.question.clone(),
                answer: pair.answer.clone(),
            };
            self.record(&passage, &vector, &mut report).await?;
        }
        info!(
            processed = report.processed,
            inserted = report.inserted,
            "FAQ ingestion complete"
        );
        Ok(report)
    }

    /// Slices story text into span chunks (fixed-size, or overlapping
    /// when `overlap` is set), embeds each, and inserts with dedup.
    ///
    /// # Errors
    ///
    /// Propagates embedding and store failures.
    pub async fn ingest_story(
        &self,
        text: &str,
        chunker: &Chunker,
        overlap: bool,
        limit: Option<usize>,
    ) -> Result<IngestReport> {
        let chunks: Vec<crate::chunk::Chunk> = if overlap {
            chunker.overlapping(text).collect()
        } else {
            chunker.fixed(text).collect()
        };
        let take = limit.unwrap_or(chunks.len());

        let mut report = IngestReport::default();
        for chunk in chunks.iter().take(take) {
            let vector = self.embedder.embed(&chunk.text).await?;
            let passage = Passage::Part {
                part: chunk.text.clone(),
            };
            self.record(&passage, &vector, &mut report).await?;
        }
        info!(
            processed = report.processed,
            inserted = report.inserted,
            overlap,
            "story ingestion complete"
        );
        Ok(report)
    }

    async fn record(
        &self,
        passage: &Passage,
        vector: &[f32],
        report: &mut IngestReport,
    ) -> Result<()> {
        report.processed += 1;
        match self.store.insert_if_absent(passage, vector).await? {
            Some(id) => {
                debug!(%id, "inserted record");
                report.inserted += 1;
            }
            None => report.deduplicated += 1,
        }
        Ok(())
    }
}

impl std::fmt::Debug for Ingester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingester")
            .field("embedder", &self.embedder.name())
            .finish_non_exhaustive()
    }
}
