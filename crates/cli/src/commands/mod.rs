pub mod config_cmd;
pub mod demo;
pub mod replay;

use slotwise_config::AppConfig;
use slotwise_context::ContextManager;

/// Load `~/.slotwise/config.toml` (plus env overrides) and apply a
/// `--capacity` flag on top.
pub(crate) fn load_config(capacity: Option<usize>) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load()?;
    if let Some(capacity) = capacity {
        config.context.capacity = capacity;
        config.validate()?;
    }
    Ok(config)
}

/// Print the numbered sequence with each slot's priority and a content preview.
pub(crate) async fn print_status(manager: &ContextManager) {
    let slots = manager.snapshot().await;
    let stats = manager.stats().await;

    println!(
        "\n=== Context ({}/{} slots, ~{} tokens) ===",
        stats.slot_count, stats.capacity, stats.estimated_tokens
    );
    for (i, slot) in slots.iter().enumerate() {
        let marker = if manager.policy().is_protected(slot) {
            "🔒"
        } else {
            "  "
        };
        println!(
            "{i}. {marker} [P{:>3}] {}: {}",
            slot.priority(),
            slot.role().as_str().to_uppercase(),
            preview(slot.content(), 48)
        );
    }
    println!("========================================\n");
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
