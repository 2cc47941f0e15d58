//! Rendering: maps the slot sequence to what a model client consumes.
//!
//! The role vocabulary on the wire is fixed to system / user / assistant:
//!
//! | Slot role | Prompt role |
//! |-----------|-------------|
//! | user | user |
//! | agent | assistant |
//! | anything else | system |

use serde::{Deserialize, Serialize};
use slotwise_core::slot::{Slot, SlotRole};

/// Role of a rendered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

impl From<&SlotRole> for PromptRole {
    fn from(role: &SlotRole) -> Self {
        match role {
            SlotRole::User => Self::User,
            SlotRole::Agent => Self::Assistant,
            _ => Self::System,
        }
    }
}

/// One `{role, content}` record of the outbound prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub role: PromptRole,
    pub content: String,
}

/// Render slots in order as role-tagged messages.
pub fn render_messages(slots: &[Slot]) -> Vec<RenderedMessage> {
    slots
        .iter()
        .map(|s| RenderedMessage {
            role: PromptRole::from(s.role()),
            content: s.content().to_string(),
        })
        .collect()
}

/// Render one slot as a `ROLE: content` prompt line. Uses the slot's own
/// role tag, not the mapped prompt role.
pub fn prompt_line(slot: &Slot) -> String {
    format!("{}: {}", slot.role().as_str().to_uppercase(), slot.content())
}

/// Append prompt lines for a chain of slots to an existing transcript.
pub fn inject_chain(transcript: &mut Vec<String>, slots: &[Slot]) {
    transcript.extend(slots.iter().map(prompt_line));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_mapping_table() {
        assert_eq!(PromptRole::from(&SlotRole::User), PromptRole::User);
        assert_eq!(PromptRole::from(&SlotRole::Agent), PromptRole::Assistant);
        assert_eq!(PromptRole::from(&SlotRole::System), PromptRole::System);
        assert_eq!(PromptRole::from(&SlotRole::Retrieved), PromptRole::System);
        assert_eq!(
            PromptRole::from(&SlotRole::CompressedSummary),
            PromptRole::System
        );
        assert_eq!(
            PromptRole::from(&SlotRole::Other("interviewer".into())),
            PromptRole::System
        );
    }

    #[test]
    fn messages_follow_sequence_order() {
        let slots = vec![
            Slot::system("be concise"),
            Slot::user("it beeps"),
            Slot::agent("which light?"),
        ];
        let rendered = render_messages(&slots);
        assert_eq!(rendered.len(), 3);
        assert_eq!(rendered[1].role, PromptRole::User);
        assert_eq!(rendered[2].content, "which light?");
    }

    #[test]
    fn rendered_message_wire_format() {
        let msg = RenderedMessage {
            role: PromptRole::Assistant,
            content: "Power it off".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"Power it off"}"#);
    }

    #[test]
    fn prompt_lines_use_slot_role_tag() {
        let mut transcript = vec![prompt_line(&Slot::user("AC trips the breaker"))];
        inject_chain(
            &mut transcript,
            &[
                Slot::agent("Compressor overload at low temperature"),
                Slot::new("Check the wiring", "retrieved"),
            ],
        );
        assert_eq!(
            transcript,
            vec![
                "USER: AC trips the breaker",
                "AGENT: Compressor overload at low temperature",
                "RETRIEVED: Check the wiring",
            ]
        );
    }
}
