//! # slotwise Core
//!
//! Domain types, traits, and error definitions for the slotwise context
//! manager. This crate has **zero framework dependencies**. It defines the
//! domain model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Collaborators that sit outside the retention policy (retrieval and
//! summarization) are defined as traits here. Implementations live in their
//! respective crates. This enables:
//! - Swapping a static summarizer for a model-backed one via configuration
//! - Easy testing with scripted collaborators
//! - Clean dependency graph (all crates depend inward on core)

pub mod compression;
pub mod error;
pub mod event;
pub mod retrieval;
pub mod slot;

// Re-export key types at crate root for ergonomics
pub use compression::Summarizer;
pub use error::{CompressionError, Error, Result, RetrievalError};
pub use event::{DomainEvent, EventBus};
pub use retrieval::{RetrievedPassage, Retriever};
pub use slot::{DEFAULT_PRIORITY, Slot, SlotId, SlotRole};
