//! Slot domain types.
//!
//! A slot is one discrete unit of conversational context: a user or agent
//! turn, a retrieved fact, a system instruction, or a compression summary.
//! Content, role, identity and creation order are fixed at construction;
//! only priority and metadata can change afterwards.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Priority given to slots that don't ask for one.
pub const DEFAULT_PRIORITY: i32 = 1;

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(String);

impl SlotId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SlotId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who or what produced a slot. The set is open: unknown tags are kept
/// verbatim in [`SlotRole::Other`].
///
/// Roles only affect rendering. The retention policy never looks at them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SlotRole {
    /// The end user
    User,
    /// The assistant / agent
    Agent,
    /// System instructions
    System,
    /// Passage injected by a retrieval collaborator
    Retrieved,
    /// Output of the compression operator
    CompressedSummary,
    /// Any other tag
    Other(String),
}

impl SlotRole {
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
            Self::System => "system",
            Self::Retrieved => "retrieved",
            Self::CompressedSummary => "compressed_summary",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for SlotRole {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "user" => Self::User,
            "agent" | "assistant" => Self::Agent,
            "system" => Self::System,
            "retrieved" | "retrieved_knowledge" => Self::Retrieved,
            "compressed_summary" => Self::CompressedSummary,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for SlotRole {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<SlotRole> for String {
    fn from(role: SlotRole) -> Self {
        match role {
            SlotRole::Other(tag) => tag,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for SlotRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of context held by the context manager.
///
/// Equality is identity: two slots are equal only when they share an id,
/// regardless of content.
#[derive(Debug, Clone, Serialize)]
pub struct Slot {
    id: SlotId,
    content: String,
    role: SlotRole,
    priority: i32,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    metadata: serde_json::Map<String, serde_json::Value>,
    created_at: DateTime<Utc>,
    /// Process-wide creation counter; strictly increasing.
    sequence: u64,
}

impl Slot {
    /// Create a slot with the default priority and no metadata.
    pub fn new(content: impl Into<String>, role: impl Into<SlotRole>) -> Self {
        Self {
            id: SlotId::new(),
            content: content.into(),
            role: role.into(),
            priority: DEFAULT_PRIORITY,
            metadata: serde_json::Map::new(),
            created_at: Utc::now(),
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, SlotRole::User)
    }

    /// Create an agent turn.
    pub fn agent(content: impl Into<String>) -> Self {
        Self::new(content, SlotRole::Agent)
    }

    /// Create a system slot. Priority stays at the default; callers that
    /// want it protected raise it with [`Slot::with_priority`].
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(content, SlotRole::System)
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Merge a whole map into the metadata. Existing keys are overwritten.
    pub fn with_metadata_map(mut self, map: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata.extend(map);
        self
    }

    pub fn id(&self) -> &SlotId {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn role(&self) -> &SlotRole {
        &self.role
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn metadata(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.metadata
    }

    /// Look up a metadata value as a string.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    pub fn metadata_mut(&mut self) -> &mut serde_json::Map<String, serde_json::Value> {
        &mut self.metadata
    }
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Slot {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_slot_has_defaults() {
        let slot = Slot::user("my machine is beeping");
        assert_eq!(slot.role(), &SlotRole::User);
        assert_eq!(slot.priority(), DEFAULT_PRIORITY);
        assert!(slot.metadata().is_empty());
        assert!(!slot.id().as_str().is_empty());
    }

    #[test]
    fn content_equal_slots_are_distinct() {
        let a = Slot::user("same text");
        let b = Slot::user("same text");
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn sequence_is_strictly_increasing() {
        let first = Slot::agent("one");
        let second = Slot::agent("two");
        assert!(second.sequence() > first.sequence());
        assert!(second.created_at() >= first.created_at());
    }

    #[test]
    fn builder_sets_priority_and_metadata() {
        let slot = Slot::system("be concise")
            .with_priority(100)
            .with_metadata("type", "system_instruction")
            .with_metadata("confidence", 0.94);
        assert_eq!(slot.priority(), 100);
        assert_eq!(slot.metadata_str("type"), Some("system_instruction"));
        assert_eq!(slot.metadata()["confidence"], serde_json::json!(0.94));
    }

    #[test]
    fn metadata_map_merges_over_existing_keys() {
        let mut map = serde_json::Map::new();
        map.insert("source".into(), "faq".into());
        map.insert("doc_id".into(), "faq-102".into());
        let slot = Slot::new("passage", SlotRole::Retrieved)
            .with_metadata("source", "vector_db")
            .with_metadata_map(map);
        assert_eq!(slot.metadata_str("source"), Some("faq"));
        assert_eq!(slot.metadata_str("doc_id"), Some("faq-102"));
    }

    #[test]
    fn role_tags_roundtrip_through_strings() {
        for tag in ["user", "agent", "system", "retrieved", "compressed_summary"] {
            let role = SlotRole::from(tag);
            assert_eq!(String::from(role), tag);
        }
        assert_eq!(SlotRole::from("assistant"), SlotRole::Agent);
        assert_eq!(
            SlotRole::from("interviewer"),
            SlotRole::Other("interviewer".into())
        );
        assert_eq!(SlotRole::from("interviewer").as_str(), "interviewer");
    }

    #[test]
    fn slot_serializes_role_as_plain_tag() {
        let slot = Slot::new("summary", SlotRole::CompressedSummary).with_priority(50);
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["role"], "compressed_summary");
        assert_eq!(json["priority"], 50);
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn mutators_touch_only_priority_and_metadata() {
        let mut slot = Slot::user("hello");
        let id = slot.id().clone();
        slot.set_priority(7);
        slot.metadata_mut().insert("channel".into(), "web_form".into());
        assert_eq!(slot.priority(), 7);
        assert_eq!(slot.metadata_str("channel"), Some("web_form"));
        assert_eq!(slot.id(), &id);
        assert_eq!(slot.content(), "hello");
    }
}
