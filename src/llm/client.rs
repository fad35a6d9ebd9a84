//! Provider registry and factory.
//!
//! Maps provider names to concrete [`LlmProvider`] implementations.

use crate::config::RagConfig;
use crate::error::RagError;
use crate::llm::provider::LlmProvider;
use crate::llm::providers::OpenAiProvider;

/// Creates an [`LlmProvider`] based on the configured provider name.
///
/// # Supported Providers
///
/// - `"openai"` (default) — OpenAI-compatible APIs via `async-openai`
///
/// # Errors
///
/// Returns [`RagError::UnsupportedProvider`] for unknown provider names.
pub fn create_provider(config: &RagConfig) -> Result<Box<dyn LlmProvider>, RagError> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiProvider::new(config))),
        other => Err(RagError::UnsupportedProvider {
            name: other.to_string(),
        }),
    }
}
