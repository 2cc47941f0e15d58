//! In-memory knowledge base: keyword lookup for demos, tests, and small
//! static FAQ sets.
//!
//! Scoring is deliberately simple: each lowercase query term found in an
//! entry's content or tags counts once. The best-scoring entry wins; ties go
//! to the entry inserted first.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use slotwise_core::error::RetrievalError;
use slotwise_core::retrieval::{RetrievedPassage, Retriever};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A single knowledge entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Document identifier (generated when empty)
    #[serde(default)]
    pub id: String,

    /// The passage text
    pub content: String,

    /// Human-readable source label (filename, URL, etc.)
    #[serde(default = "default_source")]
    pub source: String,

    /// Extra match terms
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

fn default_source() -> String {
    "knowledge_base".into()
}

impl KnowledgeEntry {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            source: source.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    fn score(&self, terms: &[String]) -> usize {
        let content = self.content.to_lowercase();
        terms
            .iter()
            .filter(|term| {
                content.contains(term.as_str())
                    || self.tags.iter().any(|t| t.to_lowercase() == **term)
            })
            .count()
    }
}

/// A knowledge base that keeps its entries in a Vec.
pub struct InMemoryKnowledgeBase {
    entries: Arc<RwLock<Vec<KnowledgeEntry>>>,
}

impl InMemoryKnowledgeBase {
    pub fn new() -> Self {
        Self::with_entries(Vec::new())
    }

    pub fn with_entries(entries: Vec<KnowledgeEntry>) -> Self {
        let entries = entries.into_iter().map(with_id).collect();
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Load entries from a JSON array of [`KnowledgeEntry`] objects.
    pub fn from_json_file(path: &Path) -> Result<Self, RetrievalError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RetrievalError::Backend(format!("failed to read {}: {e}", path.display()))
        })?;
        let entries: Vec<KnowledgeEntry> = serde_json::from_str(&content).map_err(|e| {
            RetrievalError::Backend(format!("failed to parse {}: {e}", path.display()))
        })?;
        tracing::debug!(entries = entries.len(), path = %path.display(), "Loaded knowledge file");
        Ok(Self::with_entries(entries))
    }

    /// Add an entry, returning its id.
    pub async fn insert(&self, entry: KnowledgeEntry) -> String {
        let entry = with_id(entry);
        let id = entry.id.clone();
        self.entries.write().await.push(entry);
        id
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryKnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

fn with_id(mut entry: KnowledgeEntry) -> KnowledgeEntry {
    if entry.id.is_empty() {
        entry.id = Uuid::new_v4().to_string();
    }
    entry
}

fn query_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[async_trait]
impl Retriever for InMemoryKnowledgeBase {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn retrieve(&self, query: &str) -> Result<RetrievedPassage, RetrievalError> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Err(RetrievalError::Empty {
                query: query.to_string(),
            });
        }

        let entries = self.entries.read().await;
        let mut best: Option<(&KnowledgeEntry, usize)> = None;
        for entry in entries.iter() {
            let score = entry.score(&terms);
            if score > 0 && best.is_none_or(|(_, top)| score > top) {
                best = Some((entry, score));
            }
        }

        let (entry, score) = best.ok_or_else(|| RetrievalError::Empty {
            query: query.to_string(),
        })?;

        Ok(RetrievedPassage::new(entry.content.clone())
            .with_provenance("source", entry.source.clone())
            .with_provenance("document_id", entry.id.clone())
            .with_provenance("matched_terms", score)
            .with_provenance("retriever", "in_memory"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn hardware_kb() -> InMemoryKnowledgeBase {
        InMemoryKnowledgeBase::with_entries(vec![
            KnowledgeEntry::new(
                "A flashing red light usually means the power module is overheating. Power off and let it rest for 10 minutes.",
                "repair_manual.md",
            )
            .with_tags(&["overheat"]),
            KnowledgeEntry::new(
                "If the status light keeps flashing red on a router, test the network module over a phone hotspot.",
                "faq_doc_v3.md",
            ),
            KnowledgeEntry::new(
                "Cleaning the cooling fan reduces noise on laptops.",
                "laptop_care.md",
            ),
        ])
    }

    #[tokio::test]
    async fn best_match_wins() {
        let kb = hardware_kb();
        let passage = kb.retrieve("red light power").await.unwrap();
        assert!(passage.text.contains("power module"));
        assert_eq!(passage.provenance["source"], "repair_manual.md");
        assert_eq!(passage.provenance["matched_terms"], 3);
    }

    #[tokio::test]
    async fn ties_go_to_first_inserted() {
        let kb = hardware_kb();
        let passage = kb.retrieve("flashing").await.unwrap();
        assert_eq!(passage.provenance["source"], "repair_manual.md");
    }

    #[tokio::test]
    async fn tags_count_as_matches() {
        let kb = hardware_kb();
        let passage = kb.retrieve("overheat").await.unwrap();
        assert_eq!(passage.provenance["source"], "repair_manual.md");
    }

    #[tokio::test]
    async fn no_match_is_empty_error() {
        let kb = hardware_kb();
        let err = kb.retrieve("printer toner").await.unwrap_err();
        assert!(matches!(err, RetrievalError::Empty { .. }));
    }

    #[tokio::test]
    async fn blank_query_is_empty_error() {
        let kb = hardware_kb();
        assert!(kb.retrieve("  ?! ").await.is_err());
    }

    #[tokio::test]
    async fn insert_assigns_id() {
        let kb = InMemoryKnowledgeBase::new();
        assert!(kb.is_empty().await);
        let mut entry = KnowledgeEntry::new("Firmware 2.1 fixes pairing", "release_notes.md");
        entry.id.clear();
        let id = kb.insert(entry).await;
        assert!(!id.is_empty());
        assert_eq!(kb.len().await, 1);
    }

    #[tokio::test]
    async fn loads_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"[{{"content": "Reset the router by holding the button for 10 seconds", "source": "faq-7"}}]"#
        )
        .unwrap();

        let kb = InMemoryKnowledgeBase::from_json_file(file.path()).unwrap();
        let passage = kb.retrieve("reset router").await.unwrap();
        assert_eq!(passage.provenance["source"], "faq-7");
        assert!(!passage.provenance["document_id"].as_str().unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_backend_error() {
        let err = InMemoryKnowledgeBase::from_json_file(Path::new("/nonexistent/kb.json"))
            .err()
            .unwrap();
        assert!(matches!(err, RetrievalError::Backend(_)));
    }
}
