//! Error types for the retrieval-augmented chat core.
//!
//! One enum covers the three failure families: configuration errors
//! (fatal at construction, never recovered), input errors (raised to
//! the caller), and collaborator failures (recovered locally where a
//! fallback is defined, propagated untouched from the terminal
//! chat-completion call).

use thiserror::Error;

/// Result alias using [`RagError`].
pub type Result<T> = std::result::Result<T, RagError>;

/// Errors produced by the retrieval core and its collaborator seams.
#[derive(Debug, Error)]
pub enum RagError {
    /// No API key was provided or found in the environment.
    #[error("API key missing: set OPENAI_API_KEY (or RAG_API_KEY)")]
    ApiKeyMissing,

    /// Unknown LLM provider name.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// The provider name that failed to resolve.
        name: String,
    },

    /// Chunk size must be at least one character.
    #[error("chunk_size must be >= 1, got {chunk_size}")]
    InvalidChunkSize {
        /// The rejected chunk size.
        chunk_size: usize,
    },

    /// Overlap percentage outside `[0, 1)`. At 1.0 or above the
    /// chunker's step becomes non-positive and the scan never advances.
    #[error("overlap_percent must be in [0, 1), got {percent}")]
    InvalidOverlap {
        /// The rejected overlap percentage.
        percent: f64,
    },

    /// Hybrid search blending weight outside `[0, 1]`.
    #[error("alpha must be in [0, 1], got {alpha}")]
    InvalidAlpha {
        /// The rejected blending weight.
        alpha: f64,
    },

    /// Empty input where non-empty text is required.
    #[error("{what} is empty after trimming")]
    EmptyInput {
        /// Which input was empty.
        what: &'static str,
    },

    /// A collaborator API request failed.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Error description from the underlying client.
        message: String,
        /// HTTP status code, when one was received.
        status: Option<u16>,
    },

    /// A vector store operation failed.
    #[error("vector store operation failed: {message}")]
    Store {
        /// Error description from the store backend.
        message: String,
    },

    /// A collaborator response could not be parsed.
    #[error("failed to parse response: {message}")]
    ResponseParse {
        /// What went wrong during parsing.
        message: String,
        /// The unparseable content, kept for diagnostics.
        content: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = RagError::InvalidOverlap { percent: 1.5 };
        assert_eq!(err.to_string(), "overlap_percent must be in [0, 1), got 1.5");

        let err = RagError::EmptyInput {
            what: "embedding input",
        };
        assert_eq!(err.to_string(), "embedding input is empty after trimming");
    }

    #[test]
    fn test_api_request_without_status() {
        let err = RagError::ApiRequest {
            message: "timeout".to_string(),
            status: None,
        };
        assert!(err.to_string().contains("timeout"));
    }
}
