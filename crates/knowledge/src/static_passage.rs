//! Static retriever: returns one fixed passage for every query.
//!
//! Stands in for a real vector store when exercising the injection path.

use async_trait::async_trait;
use slotwise_core::error::RetrievalError;
use slotwise_core::retrieval::{RetrievedPassage, Retriever};

pub struct StaticRetriever {
    passage: String,
    source: String,
}

impl StaticRetriever {
    pub fn new(passage: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            passage: passage.into(),
            source: source.into(),
        }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    fn name(&self) -> &str {
        "static"
    }

    async fn retrieve(&self, query: &str) -> Result<RetrievedPassage, RetrievalError> {
        if self.passage.trim().is_empty() {
            return Err(RetrievalError::Empty {
                query: query.to_string(),
            });
        }
        Ok(RetrievedPassage::new(self.passage.clone())
            .with_provenance("source", self.source.clone())
            .with_provenance("retriever", "static"))
    }
}
