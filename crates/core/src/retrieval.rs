//! Retriever trait: the abstraction over knowledge lookup.
//!
//! A retriever turns a query into one passage of text plus provenance
//! metadata. Ranking quality is entirely the implementation's business; the
//! context manager only wraps the result as a slot.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// A passage returned by a retriever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// The passage text
    pub text: String,

    /// Where the passage came from (document id, source label, score, ...)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub provenance: serde_json::Map<String, serde_json::Value>,
}

impl RetrievedPassage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            provenance: serde_json::Map::new(),
        }
    }

    pub fn with_provenance(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.provenance.insert(key.into(), value.into());
        self
    }

    /// True when the passage carries no usable text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The core Retriever trait.
///
/// Implementations: in-memory keyword knowledge base, fixed passage stub.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// A human-readable name (e.g., "in_memory", "static").
    fn name(&self) -> &str;

    /// Look up a passage for the query.
    async fn retrieve(&self, query: &str) -> std::result::Result<RetrievedPassage, RetrievalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_passage_detection() {
        assert!(RetrievedPassage::new("   \n").is_blank());
        assert!(!RetrievedPassage::new("power module overheating").is_blank());
    }

    #[test]
    fn provenance_serialization() {
        let passage = RetrievedPassage::new("Reconnect to a phone hotspot")
            .with_provenance("doc_id", "faq-102")
            .with_provenance("confidence", 0.88);
        let json = serde_json::to_string(&passage).unwrap();
        assert!(json.contains("faq-102"));
        assert!(json.contains("0.88"));
    }
}
