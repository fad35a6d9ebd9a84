//! Conversation orchestrator.
//!
//! One [`ChatSession`] per chat session, owning its history
//! exclusively. Each user message runs the full pipeline: append to
//! history → rewrite into a standalone query → embed + retrieve →
//! optional rerank → context-block assembly → chat completion →
//! append the reply.
//!
//! Failures in the middle stages never abort a turn (an empty context
//! block is a valid outcome, visible only in logs). The terminal chat
//! completion is the one call whose error propagates — there is no
//! meaningful fallback for "no answer".

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::RagConfig;
use crate::embed::EmbeddingProvider;
use crate::error::Result;
use crate::llm::message::{
    ChatMessage, ChatRequest, assistant_message, system_message, user_message,
};
use crate::llm::provider::LlmProvider;
use crate::rerank::Reranker;
use crate::rewrite::QueryRewriter;
use crate::store::{Candidate, Passage, VectorStore};

/// Sampling temperature for the final answer.
const ANSWER_TEMPERATURE: f32 = 0.2;

/// System prompt for the agreement-FAQ deployment variants.
pub const AGREEMENT_SYSTEM_PROMPT: &str = "You are Agreement Specialist, a helpful and friendly assistant for agreement-related queries between parties. \
     Speak naturally and conversationally. Integrate any provided context seamlessly without saying phrases like 'based on the provided context' or 'the document says'. \
     Answer clearly, be concise, and when helpful, cite concrete details (figures, clauses, timeframes) directly. \
     If the context is insufficient, ask a focused clarifying question or state what is missing, without referencing retrieval mechanics.";

/// System prompt for the story deployment variant.
pub const STORY_SYSTEM_PROMPT: &str = "You are Story Specialist, a helpful and friendly assistant for story-related queries. \
     Speak naturally and conversationally. Integrate any provided story context seamlessly without saying phrases like 'based on the provided context' or 'the story says'. \
     Answer clearly, be concise, and when helpful, cite specific details, characters, or plot points directly. \
     If the context is insufficient, ask a focused clarifying question or state what is missing, without referencing retrieval mechanics.";

/// How a session retrieves and cuts down candidates each turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetrievalStrategy {
    /// Vector search, keep only the closest hit.
    TopOne {
        /// Results requested from the store.
        limit: usize,
    },
    /// Vector search, keep every hit.
    MultiHit {
        /// Results requested from the store.
        limit: usize,
    },
    /// Vector search wide, then rerank down to a handful.
    RerankedMultiHit {
        /// Results requested from the store.
        limit: usize,
        /// Survivors after reranking.
        top_r: usize,
    },
    /// Hybrid keyword/vector search over overlap-chunked parts.
    HybridOverlap {
        /// Blending weight (`0` = pure keyword, `1` = pure vector).
        alpha: f64,
        /// Results requested from the store.
        limit: usize,
    },
}

impl RetrievalStrategy {
    /// Top-1 FAQ lookup.
    #[must_use]
    pub const fn top_one() -> Self {
        Self::TopOne { limit: 3 }
    }

    /// Multi-hit FAQ lookup (top 15).
    #[must_use]
    pub const fn multi_hit() -> Self {
        Self::MultiHit { limit: 15 }
    }

    /// Multi-hit FAQ lookup reranked down to 3.
    #[must_use]
    pub const fn reranked_multi_hit() -> Self {
        Self::RerankedMultiHit { limit: 15, top_r: 3 }
    }

    /// Hybrid story search (alpha 0.5, top 7).
    #[must_use]
    pub const fn hybrid_overlap() -> Self {
        Self::HybridOverlap {
            alpha: 0.5,
            limit: 7,
        }
    }

    /// The fixed system prompt for this deployment variant.
    #[must_use]
    pub const fn system_prompt(&self) -> &'static str {
        match self {
            Self::TopOne { .. } | Self::MultiHit { .. } | Self::RerankedMultiHit { .. } => {
                AGREEMENT_SYSTEM_PROMPT
            }
            Self::HybridOverlap { .. } => STORY_SYSTEM_PROMPT,
        }
    }
}

/// A chat session over a retrieval corpus.
///
/// `ask` takes `&mut self`: the history is owned by exactly one
/// session and never shared across turns or sessions.
pub struct ChatSession {
    provider: Arc<dyn LlmProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    reranker: Option<Arc<dyn Reranker>>,
    rewriter: QueryRewriter,
    strategy: RetrievalStrategy,
    chat_model: String,
    answer_max_tokens: u32,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    /// Creates a session with its history seeded with the variant's
    /// system prompt.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        config: &RagConfig,
        strategy: RetrievalStrategy,
    ) -> Self {
        Self {
            provider,
            embedder,
            store,
            reranker: None,
            rewriter: QueryRewriter::new(config),
            strategy,
            chat_model: config.chat_model.clone(),
            answer_max_tokens: config.answer_max_tokens,
            history: vec![system_message(strategy.system_prompt())],
        }
    }

    /// Attaches a reranking engine, used by the
    /// [`RetrievalStrategy::RerankedMultiHit`] variant.
    #[must_use]
    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// The conversation history (first turn is always the system
    /// prompt).
    #[must_use]
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Processes one user message and returns the assistant's reply.
    ///
    /// # Errors
    ///
    /// Propagates only the terminal chat-completion failure; rewrite,
    /// retrieval, and reranking failures degrade internally.
    pub async fn ask(&mut self, message: &str) -> Result<String> {
        self.history.push(user_message(message));

        let rewritten = {
            let query = self.rewriter.rewrite(&*self.provider, &self.history).await;
            if query.is_empty() {
                message.to_string()
            } else {
                query
            }
        };
        debug!(query = %rewritten, "standalone query");

        let candidates = self.retrieve(&rewritten).await;
        let survivors = self.select(&rewritten, candidates).await;
        debug!(survivors = survivors.len(), "context candidates");

        // The context block rides along for this call only; it is
        // never persisted into history.
        let mut messages = self.history.clone();
        let context = self.context_block(&survivors);
        if !context.is_empty() {
            messages.push(system_message(&context));
        }

        let request = ChatRequest {
            model: self.chat_model.clone(),
            messages,
            temperature: Some(ANSWER_TEMPERATURE),
            max_tokens: Some(self.answer_max_tokens),
            tools: Vec::new(),
            tool_choice: None,
        };

        let response = self.provider.chat(&request).await?;
        let answer = response.content.trim().to_string();
        self.history.push(assistant_message(&answer));
        Ok(answer)
    }

    /// First-pass retrieval per the strategy. Failures degrade to an
    /// empty candidate list.
    async fn retrieve(&self, query: &str) -> Vec<Candidate> {
        let result = match self.strategy {
            RetrievalStrategy::TopOne { limit }
            | RetrievalStrategy::MultiHit { limit }
            | RetrievalStrategy::RerankedMultiHit { limit, .. } => {
                match self.embedder.embed(query).await {
                    Ok(vector) => self.store.vector_search(&vector, limit).await,
                    Err(error) => Err(error),
                }
            }
            RetrievalStrategy::HybridOverlap { alpha, limit } => {
                // Hybrid search still works keyword-only if the
                // embedding call fails.
                let vector = match self.embedder.embed(query).await {
                    Ok(vector) => Some(vector),
                    Err(error) => {
                        warn!(%error, "query embedding failed, hybrid search degrades to keyword-only");
                        None
                    }
                };
                self.store
                    .hybrid_search(query, vector.as_deref(), alpha, limit)
                    .await
            }
        };

        match result {
            Ok(candidates) => candidates,
            Err(error) => {
                warn!(%error, "retrieval failed, continuing with empty context");
                Vec::new()
            }
        }
    }

    /// Cuts the candidate set down per the strategy.
    async fn select(&self, query: &str, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        match self.strategy {
            RetrievalStrategy::TopOne { .. } => {
                candidates.truncate(1);
                candidates
            }
            RetrievalStrategy::MultiHit { .. } | RetrievalStrategy::HybridOverlap { .. } => {
                candidates
            }
            RetrievalStrategy::RerankedMultiHit { top_r, .. } => {
                if let Some(reranker) = &self.reranker {
                    reranker
                        .rerank(query, candidates, top_r)
                        .await
                        .into_iter()
                        .map(|r| r.candidate)
                        .collect()
                } else {
                    warn!("no reranker attached, truncating candidates instead");
                    candidates.truncate(top_r);
                    candidates
                }
            }
        }
    }

    /// One formatted block per surviving candidate, under a
    /// variant-specific header.
    fn context_block(&self, candidates: &[Candidate]) -> String {
        if candidates.is_empty() {
            return String::new();
        }

        match self.strategy {
            RetrievalStrategy::TopOne { .. } => {
                let top = &candidates[0];
                format!(
                    "Relevant context from FAQ (top match):\n{}",
                    top.passage.render()
                )
            }
            RetrievalStrategy::MultiHit { .. } => Self::numbered_block(
                "Relevant context from FAQ (multiple matches):",
                candidates,
            ),
            RetrievalStrategy::RerankedMultiHit { top_r, .. } => Self::numbered_block(
                &format!("Relevant context from FAQ (re-ranked top-{top_r}):"),
                candidates,
            ),
            RetrievalStrategy::HybridOverlap { .. } => {
                Self::numbered_block("Relevant story context:", candidates)
            }
        }
    }

    fn numbered_block(header: &str, candidates: &[Candidate]) -> String {
        let mut lines = vec![header.to_string()];
        for (i, candidate) in candidates.iter().enumerate() {
            let entry = match &candidate.passage {
                Passage::Qa { question, answer } => {
                    format!("[{}] Q: {question}\n    A: {answer}", i + 1)
                }
                Passage::Part { part } => format!("[{}] {part}", i + 1),
            };
            lines.push(entry);
        }
        lines.join("\n")
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("provider", &self.provider.name())
            .field("strategy", &self.strategy)
            .field("turns", &self.history.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::RagError;
    use crate::llm::message::{ChatResponse, Role, TokenUsage};
    use crate::rerank::RerankedResult;
    use crate::store::MemoryStore;

    /// Provider stub replaying a script of responses, recording every
    /// request it receives.
    struct ScriptedProvider {
        script: Mutex<VecDeque<Result<String>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<String>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn request(&self, index: usize) -> ChatRequest {
            self.requests
                .lock()
                .map(|r| r.get(index).cloned())
                .ok()
                .flatten()
                .unwrap_or_else(|| unreachable!())
        }

        fn request_count(&self) -> usize {
            self.requests.lock().map_or(0, |r| r.len())
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            let next = self
                .script
                .lock()
                .ok()
                .and_then(|mut s| s.pop_front())
                .unwrap_or_else(|| Ok("default".to_string()));
            next.map(|content| ChatResponse {
                content,
                usage: TokenUsage::default(),
                tool_calls: Vec::new(),
                finish_reason: Some("stop".to_string()),
            })
        }
    }

    struct StubEmbedder {
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if self.fail {
                return Err(RagError::ApiRequest {
                    message: "embedder down".to_string(),
                    status: None,
                });
            }
            crate::embed::clean_text(text)?;
            Ok(vec![1.0, 0.0])
        }
    }

    /// Reranker stub that reverses the candidates.
    struct ReversingReranker;

    #[async_trait]
    impl Reranker for ReversingReranker {
        fn name(&self) -> &'static str {
            "reversing"
        }

        async fn rerank(
            &self,
            _query: &str,
            candidates: Vec<Candidate>,
            top_r: usize,
        ) -> Vec<RerankedResult> {
            let mut results: Vec<RerankedResult> = candidates
                .into_iter()
                .enumerate()
                .map(|(index, candidate)| RerankedResult {
                    candidate,
                    relevance: 1.0,
                    index,
                })
                .collect();
            results.reverse();
            results.truncate(top_r);
            results
        }
    }

    fn config() -> RagConfig {
        RagConfig::builder()
            .api_key("test")
            .build()
            .unwrap_or_else(|_| unreachable!())
    }

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for (question, answer) in [
            ("What is the uptime guarantee?", "99.5 percent monthly."),
            ("Can the agreement be terminated early?", "Yes, with notice."),
            ("Which law governs?", "The laws of the host state."),
        ] {
            store
                .insert_if_absent(
                    &Passage::Qa {
                        question: question.to_string(),
                        answer: answer.to_string(),
                    },
                    &[1.0, 0.0],
                )
                .await
                .unwrap_or_default();
        }
        store
    }

    fn session_with(
        provider: Arc<ScriptedProvider>,
        store: Arc<MemoryStore>,
        strategy: RetrievalStrategy,
    ) -> ChatSession {
        ChatSession::new(
            provider,
            Arc::new(StubEmbedder { fail: false }),
            store,
            &config(),
            strategy,
        )
    }

    #[tokio::test]
    async fn test_history_starts_with_system_prompt() {
        let provider = Arc::new(ScriptedProvider::new(Vec::new()));
        let session = session_with(
            provider,
            Arc::new(MemoryStore::new()),
            RetrievalStrategy::top_one(),
        );
        let history = session.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::System);
        assert_eq!(history[0].content, AGREEMENT_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_ask_appends_user_and_assistant_turns() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("uptime guarantee".to_string()),
            Ok("  It guarantees 99.5 percent.  ".to_string()),
        ]));
        let mut session = session_with(
            Arc::clone(&provider),
            seeded_store().await,
            RetrievalStrategy::multi_hit(),
        );

        let answer = session.ask("What uptime do I get?").await;
        assert_eq!(answer.unwrap_or_default(), "It guarantees 99.5 percent.");

        let history = session.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[1].role, Role::User);
        assert_eq!(history[1].content, "What uptime do I get?");
        assert_eq!(history[2].role, Role::Assistant);
        assert_eq!(history[2].content, "It guarantees 99.5 percent.");
    }

    #[tokio::test]
    async fn test_context_block_sent_but_not_persisted() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("uptime".to_string()),
            Ok("answer".to_string()),
        ]));
        let mut session = session_with(
            Arc::clone(&provider),
            seeded_store().await,
            RetrievalStrategy::multi_hit(),
        );
        session.ask("What uptime do I get?").await.unwrap_or_default();

        // Second chat request is the answer call.
        let answer_request = provider.request(1);
        let last = answer_request
            .messages
            .last()
            .unwrap_or_else(|| unreachable!());
        assert_eq!(last.role, Role::System);
        assert!(last.content.starts_with("Relevant context from FAQ (multiple matches):"));
        assert!(last.content.contains("[1] Q:"));

        // The context turn is not in the persisted history.
        assert!(session.history().iter().all(|m| !m.content.contains("Relevant context")));
    }

    #[tokio::test]
    async fn test_top_one_keeps_single_candidate() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("uptime".to_string()),
            Ok("answer".to_string()),
        ]));
        let mut session = session_with(
            Arc::clone(&provider),
            seeded_store().await,
            RetrievalStrategy::top_one(),
        );
        session.ask("What uptime do I get?").await.unwrap_or_default();

        let answer_request = provider.request(1);
        let last = answer_request
            .messages
            .last()
            .unwrap_or_else(|| unreachable!());
        assert!(last.content.starts_with("Relevant context from FAQ (top match):"));
        assert!(!last.content.contains("[2]"));
    }

    #[tokio::test]
    async fn test_reranked_variant_applies_reranker() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("uptime".to_string()),
            Ok("answer".to_string()),
        ]));
        let mut session = session_with(
            Arc::clone(&provider),
            seeded_store().await,
            RetrievalStrategy::RerankedMultiHit { limit: 15, top_r: 2 },
        )
        .with_reranker(Arc::new(ReversingReranker));
        session.ask("What uptime do I get?").await.unwrap_or_default();

        let answer_request = provider.request(1);
        let last = answer_request
            .messages
            .last()
            .unwrap_or_else(|| unreachable!());
        assert!(last.content.starts_with("Relevant context from FAQ (re-ranked top-2):"));
        // Two survivors, reversed by the stub reranker.
        assert!(last.content.contains("[1]"));
        assert!(last.content.contains("[2]"));
        assert!(!last.content.contains("[3]"));
    }

    #[tokio::test]
    async fn test_reranked_variant_without_reranker_truncates() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("uptime".to_string()),
            Ok("answer".to_string()),
        ]));
        let mut session = session_with(
            Arc::clone(&provider),
            seeded_store().await,
            RetrievalStrategy::RerankedMultiHit { limit: 15, top_r: 1 },
        );
        session.ask("What uptime do I get?").await.unwrap_or_default();

        let answer_request = provider.request(1);
        let last = answer_request
            .messages
            .last()
            .unwrap_or_else(|| unreachable!());
        assert!(last.content.contains("[1]"));
        assert!(!last.content.contains("[2]"));
    }

    #[tokio::test]
    async fn test_embedder_failure_means_empty_context_not_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("uptime".to_string()),
            Ok("best-effort answer".to_string()),
        ]));
        let mut session = ChatSession::new(
            Arc::clone(&provider) as Arc<dyn LlmProvider>,
            Arc::new(StubEmbedder { fail: true }),
            seeded_store().await,
            &config(),
            RetrievalStrategy::multi_hit(),
        );

        let answer = session.ask("What uptime do I get?").await;
        assert_eq!(answer.unwrap_or_default(), "best-effort answer");

        // No context system turn was attached to the answer call.
        let answer_request = provider.request(1);
        let last = answer_request
            .messages
            .last()
            .unwrap_or_else(|| unreachable!());
        assert_eq!(last.role, Role::User);
    }

    #[tokio::test]
    async fn test_rewrite_failure_is_invisible_to_caller() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(RagError::ApiRequest {
                message: "rewrite model down".to_string(),
                status: Some(500),
            }),
            Ok("still answered".to_string()),
        ]));
        let mut session = session_with(
            Arc::clone(&provider),
            seeded_store().await,
            RetrievalStrategy::multi_hit(),
        );

        let answer = session.ask("What uptime do I get?").await;
        assert_eq!(answer.unwrap_or_default(), "still answered");
        assert_eq!(provider.request_count(), 2);
    }

    #[tokio::test]
    async fn test_terminal_chat_failure_propagates() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("uptime".to_string()),
            Err(RagError::ApiRequest {
                message: "chat model down".to_string(),
                status: Some(503),
            }),
        ]));
        let mut session = session_with(
            Arc::clone(&provider),
            seeded_store().await,
            RetrievalStrategy::multi_hit(),
        );

        let result = session.ask("What uptime do I get?").await;
        assert!(matches!(result, Err(RagError::ApiRequest { .. })));

        // The user turn stays; no assistant turn was appended.
        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, Role::User);
    }

    #[tokio::test]
    async fn test_hybrid_variant_uses_story_prompt_and_parts() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_if_absent(
                &Passage::Part {
                    part: "The dragon guarded the old bridge.".to_string(),
                },
                &[1.0, 0.0],
            )
            .await
            .unwrap_or_default();

        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("dragon bridge".to_string()),
            Ok("It guarded the bridge.".to_string()),
        ]));
        let mut session = session_with(
            Arc::clone(&provider),
            store,
            RetrievalStrategy::hybrid_overlap(),
        );
        assert_eq!(session.history()[0].content, STORY_SYSTEM_PROMPT);

        session.ask("What did the dragon do?").await.unwrap_or_default();

        let answer_request = provider.request(1);
        let last = answer_request
            .messages
            .last()
            .unwrap_or_else(|| unreachable!());
        assert!(last.content.starts_with("Relevant story context:"));
        assert!(last.content.contains("[1] The dragon guarded the old bridge."));
    }

    #[tokio::test]
    async fn test_answer_request_parameters() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("uptime".to_string()),
            Ok("answer".to_string()),
        ]));
        let mut session = session_with(
            Arc::clone(&provider),
            seeded_store().await,
            RetrievalStrategy::multi_hit(),
        );
        session.ask("What uptime do I get?").await.unwrap_or_default();

        let answer_request = provider.request(1);
        assert_eq!(answer_request.model, "gpt-4o");
        assert_eq!(answer_request.temperature, Some(ANSWER_TEMPERATURE));
        assert_eq!(answer_request.max_tokens, Some(400));
    }

    #[test]
    fn test_strategy_defaults() {
        assert_eq!(
            RetrievalStrategy::reranked_multi_hit(),
            RetrievalStrategy::RerankedMultiHit { limit: 15, top_r: 3 }
        );
        assert_eq!(
            RetrievalStrategy::multi_hit(),
            RetrievalStrategy::MultiHit { limit: 15 }
        );
        assert!(matches!(
            RetrievalStrategy::hybrid_overlap(),
            RetrievalStrategy::HybridOverlap { limit: 7, .. }
        ));
    }

    // An empty retrieval result (empty corpus) also means no context
    // turn, mirroring the empty-context-is-valid rule.
    #[tokio::test]
    async fn test_empty_corpus_empty_context() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("anything".to_string()),
            Ok("no context answer".to_string()),
        ]));
        let mut session = session_with(
            Arc::clone(&provider),
            Arc::new(MemoryStore::new()),
            RetrievalStrategy::top_one(),
        );
        session.ask("Hello?").await.unwrap_or_default();

        let answer_request = provider.request(1);
        let last = answer_request
            .messages
            .last()
            .unwrap_or_else(|| unreachable!());
        assert_eq!(last.role, Role::User);
    }
}
