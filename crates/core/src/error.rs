//! Error types for the slotwise domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator boundary has its own error enum.

use thiserror::Error;

/// The top-level error type for context manager operations.
///
/// Collaborator failures are recovered inside the manager and never show up
/// here; see [`RetrievalError`] and [`CompressionError`].
#[derive(Debug, Error)]
pub enum Error {
    // --- Admission ---
    #[error(
        "Cannot admit protected slot: {protected} protected slots already fill capacity {capacity}"
    )]
    ProtectedOverflow { protected: usize, capacity: usize },

    // --- Internal defects ---
    #[error("Invariant violated: {0}")]
    Invariant(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Collaborator errors ---

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("No passage found for query '{query}'")]
    Empty { query: String },

    #[error("Retrieval for '{query}' timed out after {timeout_ms}ms")]
    Timeout { query: String, timeout_ms: u64 },

    #[error("Retrieval backend failed: {0}")]
    Backend(String),

    #[error("No retriever configured")]
    NotConfigured,
}

#[derive(Debug, Clone, Error)]
pub enum CompressionError {
    #[error("Compression invoked on an empty slot group")]
    EmptyInput,

    #[error("Summarizer '{method}' timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },

    #[error("Summarizer '{method}' failed: {reason}")]
    Failed { method: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_error_displays_query() {
        let err = RetrievalError::Timeout {
            query: "red light".into(),
            timeout_ms: 250,
        };
        assert!(err.to_string().contains("red light"));
        assert!(err.to_string().contains("250ms"));
    }

    #[test]
    fn compression_error_displays_method() {
        let err = CompressionError::Failed {
            method: "llm-summary".into(),
            reason: "upstream 503".into(),
        };
        assert!(err.to_string().contains("llm-summary"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn protected_overflow_displays_counts() {
        let err = Error::ProtectedOverflow {
            protected: 3,
            capacity: 3,
        };
        assert!(err.to_string().contains("capacity 3"));
    }
}
