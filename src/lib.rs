//! Retrieval-augmented chat core.
//!
//! Answers natural-language questions over a small corpus (agreement
//! FAQs, story text) by retrieving relevant passages and feeding them
//! to a language model. The crate implements the retrieval-decision
//! layer; hosted services sit behind traits:
//!
//! - Text chunking: fixed-size and overlapping span chunkers, plus a
//!   state-machine parser for "Question/Answer" formatted documents
//!   ([`chunk`])
//! - Conversational query rewriting ([`rewrite`])
//! - Candidate reranking: pairwise cross-encoder and LLM-structured
//!   scoring ([`rerank`])
//! - A per-session conversation orchestrator ([`session`])
//!
//! # Architecture
//!
//! ```text
//! user message → ChatSession
//!   ├── QueryRewriter   → standalone query        (LlmProvider)
//!   ├── embed + search  → N candidates            (EmbeddingProvider, VectorStore)
//!   ├── Reranker        → top R candidates        (optional)
//!   └── chat completion → assistant reply         (LlmProvider)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ragcore_rs::{ChatSession, RagConfig, RetrievalStrategy};
//!
//! let config = RagConfig::from_env()?;
//! let mut session = ChatSession::new(provider, embedder, store, &config,
//!     RetrievalStrategy::reranked_multi_hit());
//! let answer = session.ask("What uptime does the agreement promise?").await?;
//! ```

pub mod chunk;
pub mod cli;
pub mod config;
pub mod embed;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod rerank;
pub mod rewrite;
pub mod session;
pub mod store;

pub use chunk::qa::{QaPair, QaParser, parse_qa_pairs};
pub use chunk::{Chunk, ChunkStrategy, Chunker};
pub use config::RagConfig;
pub use embed::{EmbeddingProvider, OpenAiEmbedder};
pub use error::{RagError, Result};
pub use ingest::{IngestReport, Ingester};
pub use llm::{
    ChatMessage, ChatRequest, ChatResponse, LlmProvider, OpenAiProvider, Role, TokenUsage,
    ToolCall, ToolDefinition, create_provider,
};
pub use rerank::{CrossEncoderReranker, LlmReranker, PairwiseScorer, RerankedResult, Reranker};
pub use rewrite::QueryRewriter;
pub use session::{ChatSession, RetrievalStrategy};
pub use store::{Candidate, MemoryStore, Passage, RetrievalScore, VectorStore};
