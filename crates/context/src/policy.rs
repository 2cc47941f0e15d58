//! Retention policy: decides what survives when the sequence overflows.
//!
//! Every slot lands in exactly one bucket:
//!
//! | Bucket | Rule | Fate |
//! |--------|------|------|
//! | Protected | `priority >= protected_threshold` | Never compressed or evicted |
//! | Recent | Last `recency_window` positions, not Protected | Kept verbatim this cycle |
//! | Middle | Everything else | Folded into one summary |
//!
//! Buckets hold indices into the sequence, computed in a single pass, so
//! content-equal slots never get confused with each other.

use slotwise_config::ContextConfig;
use slotwise_core::slot::Slot;

/// The result of partitioning a sequence. Each list is in sequence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub protected: Vec<usize>,
    pub recent: Vec<usize>,
    pub middle: Vec<usize>,
}

/// What one optimization pass should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassAction {
    /// Sequence fits; nothing to do.
    Keep,
    /// Fold the middle group into one summary.
    Compress(Partition),
    /// Drop the slot at this index (oldest non-protected).
    Evict(usize),
    /// Everything left is protected and still over capacity.
    Stuck,
}

#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    capacity: usize,
    recency_window: usize,
    protected_threshold: i32,
}

impl RetentionPolicy {
    pub fn new(capacity: usize, recency_window: usize, protected_threshold: i32) -> Self {
        Self {
            capacity,
            recency_window,
            protected_threshold,
        }
    }

    pub fn from_config(config: &ContextConfig) -> Self {
        Self::new(
            config.capacity,
            config.recency_window,
            config.protected_threshold,
        )
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn recency_window(&self) -> usize {
        self.recency_window
    }

    pub fn is_protected(&self, slot: &Slot) -> bool {
        slot.priority() >= self.protected_threshold
    }

    pub fn exceeds(&self, len: usize) -> bool {
        len > self.capacity
    }

    /// Split the sequence into protected / recent / middle index buckets.
    pub fn partition(&self, slots: &[Slot]) -> Partition {
        let recent_start = slots.len().saturating_sub(self.recency_window);
        let mut partition = Partition::default();

        for (idx, slot) in slots.iter().enumerate() {
            if self.is_protected(slot) {
                partition.protected.push(idx);
            } else if idx >= recent_start {
                partition.recent.push(idx);
            } else {
                partition.middle.push(idx);
            }
        }

        partition
    }

    /// Index of the oldest slot that is not protected.
    pub fn fallback_victim(&self, slots: &[Slot]) -> Option<usize> {
        slots.iter().position(|s| !self.is_protected(s))
    }

    /// Decide the next step for an over-capacity sequence.
    ///
    /// Compression needs at least two middle slots; folding a single slot
    /// into a single summary would not shrink the sequence, so that case
    /// falls through to eviction.
    pub fn next_action(&self, slots: &[Slot]) -> PassAction {
        if !self.exceeds(slots.len()) {
            return PassAction::Keep;
        }

        let partition = self.partition(slots);
        if partition.middle.len() >= 2 {
            return PassAction::Compress(partition);
        }

        match self.fallback_victim(slots) {
            Some(idx) => PassAction::Evict(idx),
            None => PassAction::Stuck,
        }
    }

    /// Number of protected slots in the sequence.
    pub fn protected_count(&self, slots: &[Slot]) -> usize {
        slots.iter().filter(|s| self.is_protected(s)).count()
    }
}

/// Rebuild as protected ++ [summary] ++ recent, consuming the old sequence.
pub fn rebuild(slots: Vec<Slot>, partition: &Partition, summary: Slot) -> Vec<Slot> {
    let mut taken: Vec<Option<Slot>> = slots.into_iter().map(Some).collect();
    let mut rebuilt = Vec::with_capacity(partition.protected.len() + 1 + partition.recent.len());

    rebuilt.extend(partition.protected.iter().filter_map(|&i| taken[i].take()));
    rebuilt.push(summary);
    rebuilt.extend(partition.recent.iter().filter_map(|&i| taken[i].take()));

    rebuilt
}
