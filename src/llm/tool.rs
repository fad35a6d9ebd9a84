//! Tool types for structured model output.
//!
//! Provider-agnostic types for tool definitions and calls. Tools are
//! used here to force a strictly parseable response channel (an array
//! of integer scores) out of the reranking model, instead of free text.

use serde::{Deserialize, Serialize};

/// A tool definition that can be sent to an LLM for function-calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match the forced tool choice, if any).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: serde_json::Value,
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (assigned by the provider).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON-encoded arguments for the tool.
    pub arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_definition_serialization() {
        let def = ToolDefinition {
            name: "score_passages".to_string(),
            description: "Return relevance scores".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        };
        let json = serde_json::to_string(&def).unwrap_or_default();
        assert!(json.contains("score_passages"));
        assert!(json.contains("object"));
    }

    #[test]
    fn test_tool_call_serialization() {
        let call = ToolCall {
            id: "call_123".to_string(),
            name: "score_passages".to_string(),
            arguments: r#"{"scores":[3,0,6]}"#.to_string(),
        };
        let json = serde_json::to_string(&call).unwrap_or_default();
        assert!(json.contains("call_123"));
        assert!(json.contains("scores"));
    }
}
