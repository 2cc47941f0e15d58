//! `slotwise demo`: Scripted hardware-support session.
//!
//! Walks a short repair conversation through the context manager: a few
//! turns, a knowledge-base lookup, then enough turns to force compression.
//! Prints the sequence after each phase and the final rendered prompt.

use std::sync::Arc;

use slotwise_context::ContextManager;
use slotwise_core::slot::Slot;
use slotwise_knowledge::{InMemoryKnowledgeBase, KnowledgeEntry};

use super::{load_config, print_status};

pub async fn run(capacity: Option<usize>) -> anyhow::Result<()> {
    let config = load_config(capacity)?;

    let knowledge = match &config.retrieval.knowledge_file {
        Some(path) => InMemoryKnowledgeBase::from_json_file(path)?,
        None => builtin_knowledge(),
    };

    let manager = ContextManager::new(&config)?.with_retriever(Arc::new(knowledge));

    println!("--- Phase 1: customer reports a fault ---");
    manager
        .add(Slot::user("Hi, my machine is showing an alarm."))
        .await?;
    manager
        .add(Slot::agent("What colour is the alarm light?"))
        .await?;
    print_status(&manager).await;

    println!("--- Phase 2: knowledge-base lookup ---");
    manager.add(Slot::user("It's a red light, flashing.")).await?;
    let query = "red light flashing";
    match manager.inject_retrieved_knowledge(query).await? {
        Some(id) => println!("Injected passage {id} for '{query}'"),
        None => println!("No passage found for '{query}'"),
    }
    manager
        .add(Slot::agent(
            "The manual says that usually means overheating. How long has it been running?",
        ))
        .await?;
    print_status(&manager).await;

    println!("--- Phase 3: conversation grows past capacity ---");
    let report = manager.add(Slot::user("About three hours.")).await?;
    if !report.is_noop() {
        println!(
            "Optimized: {} slot(s) compressed, {} evicted",
            report.compressed,
            report.evicted.len()
        );
    }
    manager
        .add(Slot::agent(
            "Please switch it off and let it cool down before we continue.",
        ))
        .await?;
    print_status(&manager).await;

    println!("--- Phase 4: prompt sent to the model ---");
    let rendered = manager.render().await;
    println!("{}", serde_json::to_string_pretty(&rendered)?);

    Ok(())
}

fn builtin_knowledge() -> InMemoryKnowledgeBase {
    InMemoryKnowledgeBase::with_entries(vec![
        KnowledgeEntry::new(
            "A flashing red light means the power module is overheating. Check the fan and power off to cool down.",
            "manual_v2.pdf",
        )
        .with_tags(&["alarm", "overheat"]),
        KnowledgeEntry::new(
            "A steady yellow light means the filter needs replacing within 24 hours.",
            "manual_v2.pdf",
        )
        .with_tags(&["filter", "maintenance"]),
        KnowledgeEntry::new(
            "If the unit trips the breaker at low temperature, inspect the compressor wiring for overload.",
            "service_notes.md",
        )
        .with_tags(&["breaker", "compressor"]),
    ])
}
