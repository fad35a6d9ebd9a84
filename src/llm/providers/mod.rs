//! Concrete [`LlmProvider`](crate::llm::LlmProvider) implementations.

mod openai;

pub use openai::OpenAiProvider;
