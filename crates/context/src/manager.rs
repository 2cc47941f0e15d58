//! Context manager: owns the slot sequence and keeps it within capacity.
//!
//! Every insertion runs the optimization cycle until the sequence fits:
//!
//! 1. Partition into protected / recent / middle (see [`crate::policy`])
//! 2. Two or more middle slots → compress them into one summary and rebuild
//!    as protected ++ [summary] ++ recent
//! 3. Otherwise evict the oldest non-protected slot
//!
//! The sequence lives behind one `RwLock`. `add` holds the write half for
//! the whole cycle (including the awaited summarizer call) and works on a
//! copy that is committed only once the cycle finishes, so readers never see
//! a half-rebuilt sequence and a cancelled `add` changes nothing. Retrieval
//! runs before the lock is taken.
//!
//! Collaborator failures never reach the caller: a failed or slow
//! retrieval injects nothing, and a failed summarizer degrades that pass to
//! eviction.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use slotwise_config::{AppConfig, ConfigError};
use slotwise_core::compression::Summarizer;
use slotwise_core::error::{Error, Result, RetrievalError};
use slotwise_core::event::{DomainEvent, EventBus};
use slotwise_core::retrieval::Retriever;
use slotwise_core::slot::{Slot, SlotId, SlotRole};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::blocks::{self, ContextBlock};
use crate::compression::{self, CompressionOperator};
use crate::policy::{self, PassAction, RetentionPolicy};
use crate::render::{self, RenderedMessage};
use crate::token;

// ── Types ─────────────────────────────────────────────────────────────────

/// What the optimization cycle did for one `add`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizationReport {
    /// Passes run (0 when the sequence already fit).
    pub passes: usize,
    /// Source slots folded into summaries.
    pub compressed: usize,
    /// Summary slots produced.
    pub summaries: Vec<SlotId>,
    /// Slots dropped by the FIFO fallback.
    pub evicted: Vec<SlotId>,
}

impl OptimizationReport {
    pub fn is_noop(&self) -> bool {
        self.passes == 0
    }
}

/// Point-in-time statistics about the managed sequence.
#[derive(Debug, Clone, Serialize)]
pub struct ContextStats {
    pub slot_count: usize,
    pub capacity: usize,
    /// Slot count as a percentage of capacity (0.0–100.0).
    pub utilization_pct: f32,
    pub protected: usize,
    /// Heuristic token estimate of the rendered prompt.
    pub estimated_tokens: usize,
    pub compressions: u64,
    pub evictions: u64,
}

struct ContextState {
    slots: Vec<Slot>,
    compressions: u64,
    evictions: u64,
}

/// Working copy for one optimization cycle. Events are held back until the
/// result is committed.
struct Cycle {
    slots: Vec<Slot>,
    report: OptimizationReport,
    events: Vec<DomainEvent>,
}

impl Cycle {
    fn new(slots: Vec<Slot>, admitted: DomainEvent) -> Self {
        Self {
            slots,
            report: OptimizationReport::default(),
            events: vec![admitted],
        }
    }

    fn evict(&mut self, idx: usize) {
        let victim = self.slots.remove(idx);
        warn!(
            slot_id = %victim.id(),
            role = %victim.role(),
            "Evicted oldest non-protected slot"
        );
        self.events.push(DomainEvent::SlotEvicted {
            slot_id: victim.id().to_string(),
            role: victim.role().to_string(),
            timestamp: Utc::now(),
        });
        self.report.evicted.push(victim.id().clone());
    }
}

// ── Manager ───────────────────────────────────────────────────────────────

pub struct ContextManager {
    state: RwLock<ContextState>,
    policy: RetentionPolicy,
    compressor: CompressionOperator,
    retriever: Option<Arc<dyn Retriever>>,
    retrieval_timeout: Duration,
    retrieved_priority: i32,
    event_bus: Option<Arc<EventBus>>,
}

impl ContextManager {
    /// Validate the configuration and seed the sequence with the system
    /// instruction.
    ///
    /// Uses the summarizer named by `compression.method` and no retriever;
    /// swap either in with the `with_*` methods.
    pub fn new(config: &AppConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let ctx = &config.context;

        let system = Slot::new(ctx.system_instruction.clone(), SlotRole::System)
            .with_priority(ctx.system_priority)
            .with_metadata("type", "system_instruction");

        let compressor = CompressionOperator::new(
            compression::summarizer_for(&config.compression),
            ctx.summary_priority,
            Duration::from_millis(config.compression.timeout_ms),
        );

        debug!(
            capacity = ctx.capacity,
            recency_window = ctx.recency_window,
            method = compressor.method(),
            "Context manager created"
        );

        Ok(Self {
            state: RwLock::new(ContextState {
                slots: vec![system],
                compressions: 0,
                evictions: 0,
            }),
            policy: RetentionPolicy::from_config(ctx),
            compressor,
            retriever: None,
            retrieval_timeout: Duration::from_millis(config.retrieval.timeout_ms),
            retrieved_priority: ctx.retrieved_priority,
            event_bus: None,
        })
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.compressor.set_summarizer(summarizer);
        self
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    // ── Mutation ──

    /// Append a slot and run the optimization cycle.
    ///
    /// Fails only when a protected slot arrives while protected slots
    /// already fill the whole capacity; the sequence is left untouched.
    pub async fn add(&self, slot: Slot) -> Result<OptimizationReport> {
        let mut state = self.state.write().await;

        if self.policy.is_protected(&slot) {
            let protected = self.policy.protected_count(&state.slots);
            if protected >= self.policy.capacity() {
                warn!(
                    slot_id = %slot.id(),
                    protected,
                    capacity = self.policy.capacity(),
                    "Rejecting protected slot: capacity is full of protected slots"
                );
                return Err(Error::ProtectedOverflow {
                    protected,
                    capacity: self.policy.capacity(),
                });
            }
        }

        debug!(
            slot_id = %slot.id(),
            role = %slot.role(),
            priority = slot.priority(),
            "Admitting slot"
        );
        let admitted = DomainEvent::SlotAdmitted {
            slot_id: slot.id().to_string(),
            role: slot.role().to_string(),
            priority: slot.priority(),
            sequence_len: state.slots.len() + 1,
            timestamp: Utc::now(),
        };

        // The cycle runs on a copy; a cancelled `add` leaves the sequence as
        // it was.
        let mut cycle = Cycle::new(state.slots.clone(), admitted);
        cycle.slots.push(slot);
        self.optimize(&mut cycle).await?;

        state.slots = cycle.slots;
        state.compressions += cycle.report.summaries.len() as u64;
        state.evictions += cycle.report.evicted.len() as u64;

        for event in cycle.events {
            self.publish(event);
        }
        Ok(cycle.report)
    }

    /// Retrieve a passage for `query` and add it as a retrieved slot.
    ///
    /// Returns the new slot's id, or `None` when retrieval failed, timed
    /// out, came back blank, or no retriever is configured.
    pub async fn inject_retrieved_knowledge(&self, query: &str) -> Result<Option<SlotId>> {
        let Some(retriever) = &self.retriever else {
            self.skip_retrieval(query, &RetrievalError::NotConfigured);
            return Ok(None);
        };

        debug!(query, retriever = retriever.name(), "Retrieving knowledge");
        let outcome = tokio::time::timeout(self.retrieval_timeout, retriever.retrieve(query))
            .await
            .map_err(|_| RetrievalError::Timeout {
                query: query.to_string(),
                timeout_ms: self.retrieval_timeout.as_millis() as u64,
            })
            .and_then(|r| r);

        let passage = match outcome {
            Ok(passage) if !passage.is_blank() => passage,
            Ok(_) => {
                self.skip_retrieval(
                    query,
                    &RetrievalError::Empty {
                        query: query.to_string(),
                    },
                );
                return Ok(None);
            }
            Err(e) => {
                self.skip_retrieval(query, &e);
                return Ok(None);
            }
        };

        let slot = Slot::new(passage.text, SlotRole::Retrieved)
            .with_priority(self.retrieved_priority)
            .with_metadata_map(passage.provenance)
            .with_metadata("query", query)
            .with_metadata("type", "retrieval");
        let id = slot.id().clone();

        self.add(slot).await?;
        Ok(Some(id))
    }

    // ── Reads ──

    /// Role-tagged messages in current sequence order.
    pub async fn render(&self) -> Vec<RenderedMessage> {
        render::render_messages(&self.state.read().await.slots)
    }

    /// `ROLE: content` lines in current sequence order.
    pub async fn render_transcript(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut transcript = Vec::with_capacity(state.slots.len());
        render::inject_chain(&mut transcript, &state.slots);
        transcript
    }

    /// A copy of the current sequence.
    pub async fn snapshot(&self) -> Vec<Slot> {
        self.state.read().await.slots.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.slots.is_empty()
    }

    /// Current sequence grouped into named blocks by a metadata key.
    pub async fn blocks(&self, key: &str) -> Vec<ContextBlock> {
        blocks::partition_blocks(&self.state.read().await.slots, key)
    }

    pub async fn stats(&self) -> ContextStats {
        let state = self.state.read().await;
        let capacity = self.policy.capacity();
        ContextStats {
            slot_count: state.slots.len(),
            capacity,
            utilization_pct: (state.slots.len() as f32 / capacity as f32) * 100.0,
            protected: self.policy.protected_count(&state.slots),
            estimated_tokens: token::estimate_slots_tokens(&state.slots),
            compressions: state.compressions,
            evictions: state.evictions,
        }
    }

    // ── Optimization cycle ──

    async fn optimize(&self, cycle: &mut Cycle) -> Result<()> {
        loop {
            match self.policy.next_action(&cycle.slots) {
                PassAction::Keep => break,
                PassAction::Compress(partition) => {
                    cycle.report.passes += 1;
                    let middle: Vec<Slot> = partition
                        .middle
                        .iter()
                        .map(|&i| cycle.slots[i].clone())
                        .collect();

                    info!(
                        slots = cycle.slots.len(),
                        capacity = self.policy.capacity(),
                        middle = middle.len(),
                        "Capacity exceeded, compressing middle slots"
                    );

                    match self.compressor.compress(&middle).await {
                        Ok(summary) => {
                            let summary_id = summary.id().clone();
                            let slots = std::mem::take(&mut cycle.slots);
                            cycle.slots = policy::rebuild(slots, &partition, summary);
                            cycle.report.compressed += middle.len();
                            cycle.report.summaries.push(summary_id.clone());

                            cycle.events.push(DomainEvent::ContextCompressed {
                                summary_id: summary_id.to_string(),
                                source_count: middle.len(),
                                method: self.compressor.method().to_string(),
                                timestamp: Utc::now(),
                            });
                        }
                        Err(e) => {
                            warn!(
                                method = self.compressor.method(),
                                error = %e,
                                "Compression failed, falling back to eviction"
                            );
                            cycle.events.push(DomainEvent::CompressionFailed {
                                method: self.compressor.method().to_string(),
                                error_message: e.to_string(),
                                timestamp: Utc::now(),
                            });
                            if let Some(idx) = self.policy.fallback_victim(&cycle.slots) {
                                cycle.evict(idx);
                            }
                        }
                    }
                }
                PassAction::Evict(idx) => {
                    cycle.report.passes += 1;
                    cycle.evict(idx);
                }
                PassAction::Stuck => {
                    error!(
                        slots = cycle.slots.len(),
                        capacity = self.policy.capacity(),
                        "Only protected slots remain and capacity is still exceeded"
                    );
                    return Err(Error::Invariant(format!(
                        "{} protected slots exceed capacity {}",
                        cycle.slots.len(),
                        self.policy.capacity()
                    )));
                }
            }
        }

        debug_assert!(cycle.slots.len() <= self.policy.capacity());
        Ok(())
    }

    fn skip_retrieval(&self, query: &str, reason: &RetrievalError) {
        warn!(query, reason = %reason, "Skipping knowledge injection");
        self.publish(DomainEvent::RetrievalSkipped {
            query: query.to_string(),
            reason: reason.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
