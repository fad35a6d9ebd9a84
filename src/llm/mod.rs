//! Chat-completion collaborator abstraction.
//!
//! Provider-agnostic message and tool types, the [`LlmProvider`] trait,
//! and a name-based factory. The query rewriter, the LLM-structured
//! reranker, and the chat session all talk to the model exclusively
//! through these types.

pub mod client;
pub mod message;
pub mod provider;
pub mod providers;
pub mod tool;

pub use client::create_provider;
pub use message::{
    ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage, assistant_message, system_message,
    user_message,
};
pub use provider::LlmProvider;
pub use providers::OpenAiProvider;
pub use tool::{ToolCall, ToolDefinition};
