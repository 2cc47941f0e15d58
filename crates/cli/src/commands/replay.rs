//! `slotwise replay`: Feed a JSON transcript through a context manager.
//!
//! The file is a JSON array of steps:
//!
//! ```json
//! [
//!   {"kind": "slot", "role": "user", "content": "It keeps beeping"},
//!   {"kind": "slot", "role": "system", "content": "Never share serials", "priority": 100},
//!   {"kind": "retrieve", "query": "beeping"}
//! ]
//! ```
//!
//! `retrieve` steps need `retrieval.knowledge_file` in the config; without
//! it they are skipped.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use slotwise_context::ContextManager;
use slotwise_core::error::Error;
use slotwise_core::slot::Slot;
use slotwise_knowledge::InMemoryKnowledgeBase;

use super::{load_config, print_status};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptStep {
    Slot {
        role: String,
        content: String,
        #[serde(default)]
        priority: Option<i32>,
        #[serde(default)]
        metadata: serde_json::Map<String, serde_json::Value>,
    },
    Retrieve {
        query: String,
    },
}

/// Counters for one replay run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub admitted: usize,
    pub injected: usize,
    pub rejected: usize,
    pub compressed: usize,
    pub evicted: usize,
}

pub async fn run(path: &Path, capacity: Option<usize>, transcript: bool) -> anyhow::Result<()> {
    let config = load_config(capacity)?;
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let steps = parse_steps(&raw)?;
    tracing::info!(steps = steps.len(), file = %path.display(), "Replaying transcript");

    let mut manager = ContextManager::new(&config)?;
    if let Some(knowledge_file) = &config.retrieval.knowledge_file {
        let knowledge = InMemoryKnowledgeBase::from_json_file(knowledge_file)?;
        manager = manager.with_retriever(Arc::new(knowledge));
    }

    let outcome = apply(&manager, &steps, config.context.default_priority).await?;
    tracing::info!(
        admitted = outcome.admitted,
        injected = outcome.injected,
        rejected = outcome.rejected,
        compressed = outcome.compressed,
        evicted = outcome.evicted,
        "Replay finished"
    );

    if transcript {
        for line in manager.render_transcript().await {
            println!("{line}");
        }
    } else {
        print_status(&manager).await;
        println!("{}", serde_json::to_string_pretty(&manager.render().await)?);
    }

    Ok(())
}

pub fn parse_steps(raw: &str) -> Result<Vec<TranscriptStep>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Apply steps in order. A protected slot that would overflow capacity is
/// reported and skipped; the replay carries on.
pub async fn apply(
    manager: &ContextManager,
    steps: &[TranscriptStep],
    default_priority: i32,
) -> anyhow::Result<ReplayOutcome> {
    let mut outcome = ReplayOutcome::default();

    for (n, step) in steps.iter().enumerate() {
        match step {
            TranscriptStep::Slot {
                role,
                content,
                priority,
                metadata,
            } => {
                let slot = Slot::new(content.clone(), role.as_str())
                    .with_priority(priority.unwrap_or(default_priority))
                    .with_metadata_map(metadata.clone());
                match manager.add(slot).await {
                    Ok(report) => {
                        outcome.admitted += 1;
                        outcome.compressed += report.compressed;
                        outcome.evicted += report.evicted.len();
                    }
                    Err(e @ Error::ProtectedOverflow { .. }) => {
                        tracing::warn!(step = n, error = %e, "Skipping step");
                        outcome.rejected += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            TranscriptStep::Retrieve { query } => {
                if manager.inject_retrieved_knowledge(query).await?.is_some() {
                    outcome.injected += 1;
                }
            }
        }
    }

    Ok(outcome)
}
