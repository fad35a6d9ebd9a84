//! LLM-structured reranking via a forced tool call.
//!
//! The query and all candidate passages go out in one request. The
//! model is forced to call a `score_passages` tool whose arguments are
//! a strictly typed array of integers on a 0–6 scale, instead of free
//! text — tool-call output is list-decodable or it is worthless.
//!
//! Any failure along that path (call error, no tool call, missing
//! field, not a list, non-integer entry) gives every passage a score of
//! zero. A short array zero-fills its tail. Candidates sort by
//! `(score, -original_index)` descending: higher score wins, and on
//! equal scores the earlier-retrieved candidate wins. That tie-break
//! direction is a contract, not an accident of sort stability.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use async_trait::async_trait;

use super::{RerankedResult, Reranker};
use crate::config::RagConfig;
use crate::llm::message::{ChatRequest, ChatResponse, system_message, user_message};
use crate::llm::provider::LlmProvider;
use crate::llm::tool::ToolDefinition;
use crate::store::Candidate;

/// Name of the forced scoring tool.
const SCORE_TOOL: &str = "score_passages";

/// System prompt for the scoring call.
const SYSTEM_PROMPT: &str = "You are a reranker. Given a user query and a list of candidate passages, \
     assign a single numeric relevance score to each passage reflecting how well it answers the query. \
     Use a 0\u{2013}6 integer scale (0=irrelevant, 6=directly answers with high confidence). \
     Base scoring strictly on semantic relevance and specificity. Return only a JSON list of integers, in order.";

/// Tool definition forcing the structured score array.
fn score_passages_tool() -> ToolDefinition {
    ToolDefinition {
        name: SCORE_TOOL.to_string(),
        description: "Return relevance scores (0-6) for each passage in order.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "scores": {
                    "type": "array",
                    "items": { "type": "integer" },
                    "description": "Array of integers, length equals number of passages."
                }
            },
            "required": ["scores"],
            "additionalProperties": false
        }),
    }
}

/// Reranker that scores all passages in one structured LLM call.
pub struct LlmReranker {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl LlmReranker {
    /// Creates a reranker using the configured rerank model.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, config: &RagConfig) -> Self {
        Self {
            provider,
            model: config.rerank_model.clone(),
        }
    }

    /// Builds the user message: query plus numbered passages.
    fn build_user_message(query: &str, passages: &[String]) -> String {
        let numbered = passages
            .iter()
            .enumerate()
            .map(|(i, p)| format!("[{}]\n{p}", i + 1))
            .collect::<Vec<_>>()
            .join("\n\n");
        format!(
            "Query:\n{query}\n\n\
             Passages (score each on 0\u{2013}6):\n{numbered}\n\n\
             Call the provided tool with an array of integers named 'scores', one per passage, strictly in order."
        )
    }

    /// Extracts integer scores from the forced tool call.
    ///
    /// Returns `None` on any deviation from the contract; the caller
    /// zero-fills.
    fn parse_scores(response: &ChatResponse) -> Option<Vec<i64>> {
        let call = response.tool_calls.iter().find(|c| c.name == SCORE_TOOL)?;
        let args: serde_json::Value = serde_json::from_str(&call.arguments).ok()?;
        args.get("scores")?
            .as_array()?
            .iter()
            .map(serde_json::Value::as_i64)
            .collect()
    }
}

impl std::fmt::Debug for LlmReranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmReranker")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl Reranker for LlmReranker {
    fn name(&self) -> &'static str {
        "llm-structured"
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

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                system_message(SYSTEM_PROMPT),
                user_message(&Self::build_user_message(query, &passages)),
            ],
            temperature: Some(0.0),
            max_tokens: None,
            tools: vec![score_passages_tool()],
            tool_choice: Some(SCORE_TOOL.to_string()),
        };

        let scores = match self.provider.chat(&request).await {
            Ok(response) => Self::parse_scores(&response).unwrap_or_else(|| {
                warn!("score_passages output unusable, zero-filling all scores");
                Vec::new()
            }),
            Err(error) => {
                warn!(%error, "rerank scoring call failed, zero-filling all scores");
                Vec::new()
            }
        };
        debug!(?scores, candidates = candidates.len(), "rerank scores");

        let mut scored: Vec<(i64, RerankedResult)> = candidates
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| {
                let score = scores.get(index).copied().unwrap_or(0);
                (
                    score,
                    RerankedResult {
                        candidate,
                        #[allow(clippy::cast_precision_loss)]
                        relevance: score as f64,
                        index,
                    },
                )
            })
            .collect();

        // (score, -original_index) descending: higher score first, and
        // the earlier-retrieved candidate wins ties.
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.index.cmp(&b.1.index)));
        scored.truncate(top_r);
        scored.into_iter().map(|(_, result)| result).collect()
    }
}
