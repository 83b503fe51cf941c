//! `verdant chat` — interactive chat or single-message mode.

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use verdant_agent::{AdvisorConfig, GardenAdvisor};
use verdant_channels::{CliChannel, Command, CommandDispatcher, cli::LOCAL_USER};
use verdant_config::AppConfig;
use verdant_core::event::EventBus;
use verdant_core::gateway::{Channel, InboundMessage};
use verdant_core::memory::MemoryIndex;
use verdant_core::provider::Provider;
use verdant_knowledge::Retriever;
use verdant_memory::{FileIndex, InMemoryIndex, MemoryStore};
use verdant_providers::OpenAiCompatProvider;
use verdant_tools::{RegistryOptions, default_registry};

pub async fn run(
    config_path: Option<&Path>,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(config_path)?;
    let (advisor, dispatcher) = build(&config)?;

    match message {
        Some(text) => {
            let answer = advisor
                .handle(&InboundMessage::new(LOCAL_USER, text, "cli"))
                .await;
            println!("{}", answer.text);
        }
        None => interactive(advisor, dispatcher).await?,
    }

    Ok(())
}

/// Wire the full advisor stack from configuration.
fn build(
    config: &AppConfig,
) -> Result<(Arc<GardenAdvisor>, CommandDispatcher), Box<dyn std::error::Error>> {
    let api_key = config
        .provider
        .api_key
        .clone()
        .ok_or("No API key configured. Set VERDANT_API_KEY or provider.api_key.")?;

    let provider: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::new(
        "llm",
        &config.provider.base_url,
        api_key,
        std::time::Duration::from_secs(config.provider.request_timeout_secs),
    )?);

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
    let memory = Arc::new(MemoryStore::new(index, config.memory.recall_limit));

    let corpus_path = config
        .knowledge
        .corpus_path
        .clone()
        .unwrap_or_else(|| AppConfig::data_dir().join("plants.json"));
    let retriever = Arc::new(Retriever::from_path(
        &corpus_path,
        config.knowledge.min_score,
    )?);

    let (registry, reminders) = default_registry(RegistryOptions {
        weather_api_key: config.tools.weather_api_key.clone(),
        weather_base_url: config.tools.weather_base_url.clone(),
        search_enabled: config.tools.search_enabled,
        reminder_path: config
            .tools
            .reminder_path
            .clone()
            .unwrap_or_else(verdant_tools::ReminderStore::default_path),
        reminder_dedupe_hours: config.tools.reminder_dedupe_hours,
    });
    let tools = Arc::new(registry);

    let advisor = Arc::new(GardenAdvisor::new(
        provider,
        tools.clone(),
        memory,
        retriever,
        Arc::new(EventBus::default()),
        AdvisorConfig {
            model: config.provider.model.clone(),
            temperature: config.provider.temperature,
            max_tokens: Some(config.provider.max_tokens),
            max_steps: config.agent.max_steps,
            turn_budget: std::time::Duration::from_secs(config.agent.turn_budget_secs),
            reflection: config.agent.reflection,
            recall_limit: config.memory.recall_limit,
            retrieve_k: config.knowledge.top_k,
            window: config.memory.window,
        },
    ));

    let dispatcher = CommandDispatcher::new(advisor.clone(), tools, reminders);
    Ok((advisor, dispatcher))
}

async fn interactive(
    advisor: Arc<GardenAdvisor>,
    dispatcher: CommandDispatcher,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verdant garden advisor — ask me about your plants.");
    println!("Type !help for commands, or 'exit' to quit.\n");

    let channel = CliChannel::new();
    let mut rx = channel.start().await?;

    while let Some(incoming) = rx.recv().await {
        let msg = match incoming {
            Ok(msg) => msg,
            Err(e) => {
                info!(error = %e, "Channel closed");
                break;
            }
        };

        let reply = match Command::parse(&msg.text) {
            Some(command) => dispatcher.dispatch(&command, &msg.user_id).await,
            None => advisor.handle(&msg).await.text,
        };

        println!("\n{reply}\n");
    }

    println!("Happy gardening!");
    Ok(())
}
