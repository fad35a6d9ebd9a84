//! Conversational query rewriting.
//!
//! Turns a multi-turn conversation window into one standalone,
//! context-complete search query suitable for retrieval: pronouns
//! resolved, intent summarized, chit-chat removed.
//!
//! [`QueryRewriter::rewrite`] never fails. Any collaborator failure or
//! empty completion degrades to the most recent user turn's content,
//! so a broken rewrite model costs retrieval quality, not the turn.

use tracing::{debug, warn};

use crate::config::RagConfig;
use crate::llm::message::{ChatRequest, Role, system_message, user_message};
use crate::llm::provider::LlmProvider;

/// Number of trailing turns submitted to the rewrite model. Truncation
/// is a prefix drop, keeping the call size bounded.
const REWRITE_WINDOW: usize = 10;

/// Rewrites conversation history into standalone retrieval queries.
#[derive(Debug, Clone)]
pub struct QueryRewriter {
    model: String,
    max_tokens: u32,
    max_chars: usize,
    system_prompt: String,
}

impl QueryRewriter {
    /// Creates a rewriter from configuration.
    #[must_use]
    pub fn new(config: &RagConfig) -> Self {
        let system_prompt = format!(
            "You are a query rewriting assistant for agreement-related FAQs. \
             Given recent conversation turns, produce ONE standalone, context-complete search query. \
             Resolve pronouns (it/that/they/this), summarize intent, include key entities and constraints, \
             and remove chit-chat. Use concise natural language. Do not add commentary or markdown. \
             Cap the output to <= {} characters. Return ONLY the rewritten query.",
            config.rewrite_max_chars
        );
        Self {
            model: config.rewrite_model.clone(),
            max_tokens: config.rewrite_max_tokens,
            max_chars: config.rewrite_max_chars,
            system_prompt,
        }
    }

    /// Rewrites the conversation into a standalone query.
    ///
    /// Returns an empty string only for an empty history. External
    /// failures never surface: the fallback is the most recent
    /// `user` turn's content (or the last turn's content when no user
    /// turn exists).
    pub async fn rewrite(
        &self,
        provider: &dyn LlmProvider,
        history: &[crate::llm::message::ChatMessage],
    ) -> String {
        if history.is_empty() {
            return String::new();
        }

        let window = &history[history.len().saturating_sub(REWRITE_WINDOW)..];
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                system_message(&self.system_prompt),
                user_message(&Self::flatten(window)),
            ],
            temperature: Some(0.0),
            max_tokens: Some(self.max_tokens),
            tools: Vec::new(),
            tool_choice: None,
        };

        match provider.chat(&request).await {
            Ok(response) => {
                let text = response.content.trim();
                if text.is_empty() {
                    debug!("rewrite returned empty completion, using fallback");
                    Self::fallback(history)
                } else {
                    truncate_chars(text, self.max_chars).trim_end().to_string()
                }
            }
            Err(error) => {
                warn!(%error, "query rewrite failed, falling back to raw user turn");
                Self::fallback(history)
            }
        }
    }

    /// The most recent `user` turn's content, or the last turn's
    /// content when none is tagged `user`.
    fn fallback(history: &[crate::llm::message::ChatMessage]) -> String {
        history
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .or_else(|| history.last())
            .map(|m| m.content.trim().to_string())
            .unwrap_or_default()
    }

    /// Compact plain-text transcript; blank-content turns are skipped.
    fn flatten(window: &[crate::llm::message::ChatMessage]) -> String {
        let mut lines: Vec<String> = Vec::with_capacity(window.len() + 1);
        for msg in window {
            let content = msg.content.trim();
            if content.is_empty() {
                continue;
            }
            let prefix = match msg.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
                Role::System => "System",
            };
            lines.push(format!("{prefix}: {content}"));
        }
        lines.push("\nRewrite the latest user intent above as a standalone search query only.".to_string());
        lines.join("\n")
    }
}

/// Cuts `s` after `max` characters, with no attempt to preserve word
/// boundaries.
fn truncate_chars(s: &str, max: usize) -> &str {
    s.char_indices().nth(max).map_or(s, |(i, _)| &s[..i])
}
