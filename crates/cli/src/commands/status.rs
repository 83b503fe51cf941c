//! `verdant status` — configuration and backend health overview.

use std::path::Path;
use std::sync::Arc;

use verdant_config::AppConfig;
use verdant_core::memory::MemoryIndex;
use verdant_core::provider::Provider;
use verdant_knowledge::Retriever;
use verdant_memory::{FileIndex, InMemoryIndex};
use verdant_providers::OpenAiCompatProvider;
use verdant_tools::ReminderStore;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(config_path)?;

    println!("Verdant status\n");
    println!("Provider:");
    println!("  endpoint:  {}", config.provider.base_url);
    println!("  model:     {}", config.provider.model);
    println!(
        "  api key:   {}",
        if config.provider.api_key.is_some() { "configured" } else { "missing" }
    );

    if let Some(api_key) = &config.provider.api_key {
        let provider = OpenAiCompatProvider::new(
            "llm",
            &config.provider.base_url,
            api_key.clone(),
            std::time::Duration::from_secs(10),
        )?;
        match provider.health_check().await {
            Ok(true) => println!("  health:    ok"),
            Ok(false) => println!("  health:    unreachable"),
            Err(e) => println!("  health:    error ({e})"),
        }
    }

    let index: Arc<dyn MemoryIndex> = match config.memory.backend.as_str() {
        "in_memory" => Arc::new(InMemoryIndex::new()),
        _ => Arc::new(FileIndex::new(
            config
                .memory
                .path
                .clone()
                .unwrap_or_else(FileIndex::default_path),
        )),
    };
    println!("\nMemory:");
    println!("  backend:   {}", index.name());
    println!("  window:    {} turns", config.memory.window);
    match index.count().await {
        Ok(count) => println!("  records:   {count}"),
        Err(e) => println!("  records:   unavailable ({e})"),
    }

    let corpus_path = config
        .knowledge
        .corpus_path
        .clone()
        .unwrap_or_else(|| AppConfig::data_dir().join("plants.json"));
    match Retriever::from_path(&corpus_path, config.knowledge.min_score) {
        Ok(retriever) => {
            println!("\nKnowledge:");
            println!("  corpus:    {} ({} plants)", corpus_path.display(), retriever.len());
        }
        Err(e) => println!("\nKnowledge: corpus unavailable ({e})"),
    }

    let reminder_path = config
        .tools
        .reminder_path
        .clone()
        .unwrap_or_else(ReminderStore::default_path);
    let reminders = ReminderStore::new(reminder_path, config.tools.reminder_dedupe_hours);
    println!("\nTools:");
    println!(
        "  weather:   {}",
        if config.tools.weather_api_key.is_some() { "configured" } else { "not configured" }
    );
    println!(
        "  search:    {}",
        if config.tools.search_enabled { "enabled" } else { "disabled" }
    );
    println!("  reminders: {} stored", reminders.count().await);

    Ok(())
}
