//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 bytes per token. The figure is only
//! reported in [`crate::manager::ContextStats`]; the retention policy budgets
//! by slot count.

use slotwise_core::slot::Slot;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 bytes. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Estimate tokens for a single slot including per-message overhead.
///
/// Each rendered message costs ~4 tokens for role name and delimiters.
pub fn estimate_slot_tokens(slot: &Slot) -> usize {
    let overhead = 4;
    overhead + estimate_tokens(slot.content())
}

/// Estimate tokens for a slice of slots.
pub fn estimate_slots_tokens(slots: &[Slot]) -> usize {
    slots.iter().map(estimate_slot_tokens).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn five_bytes_rounds_up() {
        assert_eq!(estimate_tokens("hello"), 2);
    }

    #[test]
    fn slot_includes_overhead() {
        let slot = Slot::user("test"); // 1 token + 4 overhead
        assert_eq!(estimate_slot_tokens(&slot), 5);
    }

    #[test]
    fn multiple_slots() {
        let slots = vec![Slot::user("hello"), Slot::agent("world")];
        assert_eq!(estimate_slots_tokens(&slots), 12);
    }
}
