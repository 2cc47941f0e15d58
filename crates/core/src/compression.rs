//! Summarizer trait: the text-generation half of compression.
//!
//! The compression operator decides *which* slots are folded into a summary
//! and what the summary slot looks like; a summarizer only decides the
//! summary text. Any strategy qualifies, from string joining to a model
//! call, as long as the text is a total function of the ordered input.

use async_trait::async_trait;

use crate::error::CompressionError;
use crate::slot::Slot;

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Identifier recorded in summary metadata (e.g., "concat", "keyword_merge").
    fn method(&self) -> &str;

    /// Produce summary text for slots given in chronological order.
    ///
    /// Never called with an empty slice.
    async fn summarize(&self, slots: &[Slot]) -> std::result::Result<String, CompressionError>;
}
