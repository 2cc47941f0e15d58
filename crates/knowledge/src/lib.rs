//! Retrieval collaborators for slotwise.
//!
//! Two implementations of [`slotwise_core::Retriever`]:
//! - `in_memory`: keyword lookup over a list of knowledge entries
//! - `static_passage`: always returns the same passage (demos and tests)

pub mod in_memory;
pub mod static_passage;

pub use in_memory::{InMemoryKnowledgeBase, KnowledgeEntry};
pub use static_passage::StaticRetriever;
