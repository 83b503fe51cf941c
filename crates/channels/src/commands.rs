//! Command shortcuts — deterministic dispatches that bypass the loop.
//!
//! Commands map one-to-one onto memory-store and tool-registry calls.
//! Anything that isn't a command flows through the full advisor pipeline.

use std::sync::Arc;
use tracing::debug;

use verdant_agent::GardenAdvisor;
use verdant_core::message::UserId;
use verdant_core::tool::{ToolCall, ToolRegistry};
use verdant_tools::ReminderStore;

/// A recognized command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Plants,
    Reminders,
    Clear,
    Weather(String),
}

impl Command {
    /// Parse a `!`-prefixed command. Returns `None` for regular messages.
    pub fn parse(text: &str) -> Option<Command> {
        let text = text.trim();
        let rest = text.strip_prefix('!')?;
        let (head, tail) = match rest.split_once(char::is_whitespace) {
            Some((head, tail)) => (head, tail.trim()),
            None => (rest, ""),
        };

        match head.to_lowercase().as_str() {
            "help" => Some(Command::Help),
            "plants" | "myplants" => Some(Command::Plants),
            "reminders" => Some(Command::Reminders),
            "clear" => Some(Command::Clear),
            "weather" if !tail.is_empty() => Some(Command::Weather(tail.to_string())),
            _ => None,
        }
    }
}

const HELP_TEXT: &str = "\
Verdant — your garden advisor

Ask me anything about plant care, watering schedules, or the weather.

Commands:
  !help              Show this message
  !plants            List the plants you've mentioned
  !reminders         Show your watering reminders
  !clear             Clear your conversation history
  !weather <city>    Check the weather

Example questions:
  \"How do I care for tomatoes?\"
  \"Should I water my plants today in Jakarta?\"
  \"Remind me to water the roses every 3 days\"
  \"Calculate how much water for 5 plants at 2 liters each\"";

/// Executes commands against the advisor, tool registry, and reminder
/// store.
pub struct CommandDispatcher {
    advisor: Arc<GardenAdvisor>,
    tools: Arc<ToolRegistry>,
    reminders: Arc<ReminderStore>,
}

impl CommandDispatcher {
    pub fn new(
        advisor: Arc<GardenAdvisor>,
        tools: Arc<ToolRegistry>,
        reminders: Arc<ReminderStore>,
    ) -> Self {
        Self {
            advisor,
            tools,
            reminders,
        }
    }

    /// Execute a command for a user and return the reply text.
    pub async fn dispatch(&self, command: &Command, user: &UserId) -> String {
        debug!(user = %user, ?command, "Dispatching command");
        match command {
            Command::Help => HELP_TEXT.to_string(),

            Command::Plants => {
                let plants = self.advisor.user_plants(user).await;
                if plants.is_empty() {
                    "You haven't mentioned any plants yet. Tell me about your garden!".into()
                } else {
                    format!("Your plants:\n{}", plants.join("\n"))
                }
            }

            Command::Reminders => {
                let reminders = self.reminders.list_for(user).await;
                if reminders.is_empty() {
                    "You haven't set any reminders yet. \
                     Try: \"Remind me to water the plants every 2 days\""
                        .into()
                } else {
                    let lines: Vec<String> = reminders
                        .iter()
                        .enumerate()
                        .map(|(i, r)| {
                            format!("{}. Water {} every {} days", i + 1, r.plant, r.interval_days)
                        })
                        .collect();
                    format!("Your reminders:\n{}", lines.join("\n"))
                }
            }

            Command::Clear => {
                self.advisor.clear_history(user).await;
                "Your conversation history has been cleared.".into()
            }

            Command::Weather(location) => {
                let call = ToolCall::new(
                    "weather",
                    serde_json::json!({"location": location}),
                    0,
                );
                self.tools.dispatch(&call, user).await.output
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use verdant_agent::AdvisorConfig;
    use verdant_core::error::ProviderError;
    use verdant_core::event::EventBus;
    use verdant_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use verdant_knowledge::{Retriever, corpus::default_corpus};
    use verdant_memory::{InMemoryIndex, MemoryStore};
    use verdant_tools::{RegistryOptions, default_registry};

    /// Commands never reach the model; this provider proves it.
    struct UnreachableProvider;

    #[async_trait]
    impl Provider for UnreachableProvider {
        fn name(&self) -> &str {
            "unreachable"
        }
        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            panic!("commands must not invoke the model");
        }
    }

    fn setup(dir: &tempfile::TempDir) -> (CommandDispatcher, Arc<MemoryStore>) {
        let (registry, reminders) = default_registry(RegistryOptions {
            reminder_path: dir.path().join("reminders.json"),
            ..Default::default()
        });
        let tools = Arc::new(registry);
        let memory = Arc::new(MemoryStore::new(Arc::new(InMemoryIndex::new()), 5));
        let retriever = Arc::new(Retriever::from_corpus(default_corpus(), 0.1));

        let advisor = Arc::new(GardenAdvisor::new(
            Arc::new(UnreachableProvider),
            tools.clone(),
            memory.clone(),
            retriever,
            Arc::new(EventBus::default()),
            AdvisorConfig::default(),
        ));

        (CommandDispatcher::new(advisor, tools, reminders), memory)
    }

    fn user() -> UserId {
        UserId::new("u1")
    }

    #[test]
    fn parse_recognizes_commands() {
        assert_eq!(Command::parse("!help"), Some(Command::Help));
        assert_eq!(Command::parse("  !plants  "), Some(Command::Plants));
        assert_eq!(Command::parse("!myplants"), Some(Command::Plants));
        assert_eq!(Command::parse("!reminders"), Some(Command::Reminders));
        assert_eq!(Command::parse("!clear"), Some(Command::Clear));
        assert_eq!(
            Command::parse("!weather New York"),
            Some(Command::Weather("New York".into()))
        );
    }

    #[test]
    fn parse_rejects_non_commands() {
        assert_eq!(Command::parse("how do I water basil?"), None);
        assert_eq!(Command::parse("!weather"), None); // needs a location
        assert_eq!(Command::parse("!unknown"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[tokio::test]
    async fn help_lists_commands() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, _) = setup(&dir);
        let reply = dispatcher.dispatch(&Command::Help, &user()).await;
        assert!(reply.contains("!plants"));
        assert!(reply.contains("!weather"));
    }

    #[tokio::test]
    async fn plants_empty_and_populated() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, memory) = setup(&dir);

        let reply = dispatcher.dispatch(&Command::Plants, &user()).await;
        assert!(reply.contains("haven't mentioned"));

        memory
            .remember(&user(), "my basil needs help", "Sure.", None)
            .await;
        let reply = dispatcher.dispatch(&Command::Plants, &user()).await;
        assert!(reply.contains("Basil"));
    }

    #[tokio::test]
    async fn reminders_listing() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, _) = setup(&dir);

        let reply = dispatcher.dispatch(&Command::Reminders, &user()).await;
        assert!(reply.contains("haven't set any reminders"));

        dispatcher
            .reminders
            .add(&user(), "tomatoes", 3)
            .await
            .unwrap();
        let reply = dispatcher.dispatch(&Command::Reminders, &user()).await;
        assert!(reply.contains("Water tomatoes every 3 days"));
    }

    #[tokio::test]
    async fn clear_reports_success() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, memory) = setup(&dir);

        memory.remember(&user(), "q", "a", None).await;
        let reply = dispatcher.dispatch(&Command::Clear, &user()).await;
        assert!(reply.contains("cleared"));
        assert!(memory.records_for_user(&user()).await.is_empty());
    }

    #[tokio::test]
    async fn weather_command_goes_through_registry() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, _) = setup(&dir);

        // Weather tool is unconfigured in tests; the registry converts
        // that into a readable failure message rather than an error.
        let reply = dispatcher
            .dispatch(&Command::Weather("Jakarta".into()), &user())
            .await;
        assert!(reply.contains("not configured"));
    }
}
