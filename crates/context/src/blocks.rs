//! Named context blocks: a read-only view grouping slots by a metadata key
//! (e.g. conversation phase).

use serde::Serialize;
use slotwise_core::slot::Slot;

/// Block name for slots that don't carry the grouping key.
pub const UNASSIGNED_BLOCK: &str = "unassigned";

#[derive(Debug, Clone, Serialize)]
pub struct ContextBlock {
    pub name: String,
    pub slots: Vec<Slot>,
}

impl ContextBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: Vec::new(),
        }
    }

    pub fn add_slot(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    pub fn contents(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.content()).collect()
    }
}

/// Group slots by the string value of `key`, in order of first appearance.
/// Slot order inside each block follows the input.
pub fn partition_blocks(slots: &[Slot], key: &str) -> Vec<ContextBlock> {
    let mut blocks: Vec<ContextBlock> = Vec::new();

    for slot in slots {
        let name = slot.metadata_str(key).unwrap_or(UNASSIGNED_BLOCK);
        let idx = match blocks.iter().position(|b| b.name == name) {
            Some(idx) => idx,
            None => {
                blocks.push(ContextBlock::new(name));
                blocks.len() - 1
            }
        };
        blocks[idx].add_slot(slot.clone());
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phased(content: &str, phase: &str) -> Slot {
        Slot::user(content).with_metadata("phase", phase)
    }

    #[test]
    fn groups_by_first_appearance() {
        let slots = vec![
            phased("Hi, I'm the candidate", "introduction"),
            phased("Explain the transformer", "technical"),
            phased("Please introduce yourself", "introduction"),
            phased("Any questions?", "closing"),
        ];

        let blocks = partition_blocks(&slots, "phase");
        let names: Vec<_> = blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["introduction", "technical", "closing"]);
        assert_eq!(
            blocks[0].contents(),
            vec!["Hi, I'm the candidate", "Please introduce yourself"]
        );
    }

    #[test]
    fn missing_key_goes_to_unassigned() {
        let slots = vec![Slot::system("rules"), phased("hello", "introduction")];
        let blocks = partition_blocks(&slots, "phase");
        assert_eq!(blocks[0].name, UNASSIGNED_BLOCK);
        assert_eq!(blocks[1].slots.len(), 1);
    }

    #[test]
    fn empty_input_has_no_blocks() {
        assert!(partition_blocks(&[], "phase").is_empty());
    }
}
