//! Priority-aware context management for slotwise.
//!
//! Keeps an ordered sequence of slots within a fixed capacity. Protected
//! slots always survive, the most recent turns stay verbatim, and the rest
//! is folded into a summary (or evicted oldest-first when there is nothing
//! worth folding).

pub mod blocks;
pub mod compression;
pub mod manager;
pub mod policy;
pub mod render;
pub mod token;

pub use blocks::{ContextBlock, partition_blocks};
pub use compression::{
    CompressionOperator, ConcatSummarizer, KeywordMergeSummarizer, SemanticGroup, summarizer_for,
};
pub use manager::{ContextManager, ContextStats, OptimizationReport};
pub use policy::{PassAction, Partition, RetentionPolicy};
pub use render::{PromptRole, RenderedMessage};
