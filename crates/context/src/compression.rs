//! Compression operator and the built-in summarizers.
//!
//! The operator folds an ordered group of slots into exactly one summary
//! slot. Summary text comes from a pluggable [`Summarizer`]; the operator
//! owns everything else about the output slot (role, priority, metadata)
//! and bounds the summarizer call with a timeout.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use slotwise_config::CompressionConfig;
use slotwise_core::compression::Summarizer;
use slotwise_core::error::CompressionError;
use slotwise_core::slot::{Slot, SlotRole};

/// Value of the `type` metadata key on every summary slot.
pub const SUMMARY_TYPE: &str = "compressed_summary";

// ── Operator ──────────────────────────────────────────────────────────────

pub struct CompressionOperator {
    summarizer: Arc<dyn Summarizer>,
    summary_priority: i32,
    timeout: Duration,
}

impl CompressionOperator {
    pub fn new(summarizer: Arc<dyn Summarizer>, summary_priority: i32, timeout: Duration) -> Self {
        Self {
            summarizer,
            summary_priority,
            timeout,
        }
    }

    pub fn method(&self) -> &str {
        self.summarizer.method()
    }

    pub fn summary_priority(&self) -> i32 {
        self.summary_priority
    }

    pub(crate) fn set_summarizer(&mut self, summarizer: Arc<dyn Summarizer>) {
        self.summarizer = summarizer;
    }

    /// Fold `slots` (chronological order) into one summary slot.
    pub async fn compress(&self, slots: &[Slot]) -> Result<Slot, CompressionError> {
        let text = self.summarize_bounded(slots).await?;
        Ok(self.summary_slot(text, slots))
    }

    /// Compress a topic group. The topic prefixes the text and is recorded
    /// in metadata.
    pub async fn compress_group(&self, group: &SemanticGroup) -> Result<Slot, CompressionError> {
        let text = self.summarize_bounded(&group.slots).await?;
        let text = format!("[{}] {}", group.topic, text);
        Ok(self
            .summary_slot(text, &group.slots)
            .with_metadata("topic", group.topic.clone()))
    }

    async fn summarize_bounded(&self, slots: &[Slot]) -> Result<String, CompressionError> {
        if slots.is_empty() {
            return Err(CompressionError::EmptyInput);
        }

        tokio::time::timeout(self.timeout, self.summarizer.summarize(slots))
            .await
            .map_err(|_| CompressionError::Timeout {
                method: self.method().to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            })?
    }

    fn summary_slot(&self, text: String, sources: &[Slot]) -> Slot {
        let source_ids: Vec<serde_json::Value> = sources
            .iter()
            .map(|s| serde_json::Value::from(s.id().as_str()))
            .collect();

        Slot::new(text, SlotRole::CompressedSummary)
            .with_priority(self.summary_priority)
            .with_metadata("type", SUMMARY_TYPE)
            .with_metadata("source_count", sources.len())
            .with_metadata("compression_method", self.method().to_string())
            .with_metadata("source_ids", source_ids)
    }
}

/// Build the summarizer named by `compression.method`.
pub fn summarizer_for(config: &CompressionConfig) -> Arc<dyn Summarizer> {
    match config.method.as_str() {
        "keyword_merge" => Arc::new(KeywordMergeSummarizer::default()),
        _ => Arc::new(ConcatSummarizer::default().with_max_chars(config.max_summary_chars)),
    }
}

// ── Semantic groups ───────────────────────────────────────────────────────

/// A topic-tagged group of slots compressed as one unit.
#[derive(Debug, Clone)]
pub struct SemanticGroup {
    pub topic: String,
    pub slots: Vec<Slot>,
}

impl SemanticGroup {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            slots: Vec::new(),
        }
    }

    pub fn add_slot(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// ── Summarizers ───────────────────────────────────────────────────────────

/// Joins contents in order with `" -> "` behind a fixed prefix.
pub struct ConcatSummarizer {
    prefix: String,
    delimiter: String,
    max_chars: usize,
}

impl Default for ConcatSummarizer {
    fn default() -> Self {
        Self {
            prefix: "[Conversation summary] Earlier turns: ".into(),
            delimiter: " -> ".into(),
            max_chars: 0,
        }
    }
}

impl ConcatSummarizer {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Cap the joined text at `max_chars` characters (0 = no cap).
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }
}

#[async_trait]
impl Summarizer for ConcatSummarizer {
    fn method(&self) -> &str {
        "concat"
    }

    async fn summarize(&self, slots: &[Slot]) -> Result<String, CompressionError> {
        let joined = slots
            .iter()
            .map(|s| s.content())
            .collect::<Vec<_>>()
            .join(&self.delimiter);
        Ok(format!("{}{}", self.prefix, truncate_chars(&joined, self.max_chars)))
    }
}

/// Splits contents into clauses, de-duplicates them, and joins them sorted.
pub struct KeywordMergeSummarizer {
    prefix: String,
}

impl Default for KeywordMergeSummarizer {
    fn default() -> Self {
        Self {
            prefix: "[Merged context] ".into(),
        }
    }
}

#[async_trait]
impl Summarizer for KeywordMergeSummarizer {
    fn method(&self) -> &str {
        "keyword_merge"
    }

    async fn summarize(&self, slots: &[Slot]) -> Result<String, CompressionError> {
        let clauses: BTreeSet<&str> = slots
            .iter()
            .flat_map(|s| s.content().split([',', '，', ';', '；']))
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        let merged = clauses.into_iter().collect::<Vec<_>>().join("; ");
        Ok(format!("{}{}", self.prefix, merged))
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return text.to_string();
    }
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
