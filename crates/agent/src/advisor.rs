//! The garden advisor — one turn, end to end.
//!
//! `handle` is the single entry point for an inbound message:
//! lock the user's session → recall memory + retrieve knowledge → plan →
//! reason/act → reflect → write back → answer.
//!
//! Every failure below the turn level is absorbed along the way (tool
//! failures become observations, memory trouble degrades, reflection
//! trouble keeps the draft). The only user-visible apology is total
//! model-backend unavailability.

use std::sync::Arc;
use chrono::Utc;
use tracing::{info, warn};

use verdant_core::error::Error;
use verdant_core::event::{DomainEvent, EventBus};
use verdant_core::gateway::{Answer, InboundMessage};
use verdant_core::message::{Turn, UserId};
use verdant_core::provider::Provider;
use verdant_core::tool::ToolRegistry;
use verdant_knowledge::Retriever;
use verdant_memory::MemoryStore;

use crate::planner::Planner;
use crate::react::{LoopConfig, ReactLoop, Termination, TurnContext};
use crate::reflection::Reflector;
use crate::session::SessionRegistry;

/// The apology for total backend unavailability — the one failure that
/// reaches the user undisguised.
const BACKEND_APOLOGY: &str = "I apologize — I'm having trouble reaching my \
                               reasoning service right now. Please try again \
                               in a moment.";

/// Advisor tuning, usually mapped from the application config.
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub max_steps: usize,
    pub turn_budget: std::time::Duration,
    /// Whether the reflection pass runs on drafts.
    pub reflection: bool,
    /// Long-term records recalled per turn.
    pub recall_limit: usize,
    /// Knowledge snippets retrieved per turn.
    pub retrieve_k: usize,
    /// Short-term window size per session.
    pub window: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".into(),
            temperature: 0.7,
            max_tokens: Some(1024),
            max_steps: 6,
            turn_budget: std::time::Duration::from_secs(60),
            reflection: true,
            recall_limit: 3,
            retrieve_k: 3,
            window: 10,
        }
    }
}

pub struct GardenAdvisor {
    planner: Planner,
    react: ReactLoop,
    reflector: Reflector,
    memory: Arc<MemoryStore>,
    retriever: Arc<Retriever>,
    sessions: SessionRegistry,
    events: Arc<EventBus>,
    reflection_enabled: bool,
    recall_limit: usize,
    retrieve_k: usize,
}

impl GardenAdvisor {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        memory: Arc<MemoryStore>,
        retriever: Arc<Retriever>,
        events: Arc<EventBus>,
        config: AdvisorConfig,
    ) -> Self {
        let loop_config = LoopConfig {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_steps: config.max_steps,
            turn_budget: config.turn_budget,
        };

        Self {
            planner: Planner::new(provider.clone(), &config.model),
            react: ReactLoop::new(provider.clone(), tools, events.clone(), loop_config),
            reflector: Reflector::new(provider, &config.model),
            memory,
            retriever,
            sessions: SessionRegistry::new(config.window),
            events,
            reflection_enabled: config.reflection,
            recall_limit: config.recall_limit,
            retrieve_k: config.retrieve_k,
        }
    }

    /// Process one inbound message and produce the answer.
    ///
    /// Infallible by design: everything that can go wrong is converted
    /// into a degraded-but-valid answer.
    pub async fn handle(&self, msg: &InboundMessage) -> Answer {
        let user = &msg.user_id;
        let query = msg.text.trim();

        info!(user = %user, channel = %msg.channel, "Processing message");
        self.events.publish(DomainEvent::MessageReceived {
            channel: msg.channel.clone(),
            user_id: user.as_str().to_string(),
            content_preview: query.chars().take(80).collect(),
            timestamp: Utc::now(),
        });

        // Serialize this user's turns; other users proceed concurrently.
        let session_handle = self.sessions.get_or_create(user).await;
        let mut session = session_handle.lock().await;

        let recent = session.recent_turns();
        let memories = self.memory.recall(user, query, self.recall_limit).await;
        let snippets = self.retriever.retrieve(query, self.retrieve_k);

        let plan = self.planner.plan(query, &recent, user).await;
        self.events.publish(DomainEvent::PlanCreated {
            user_id: user.as_str().to_string(),
            intent: plan.intent.to_string(),
            complexity: plan.complexity,
            timestamp: Utc::now(),
        });

        let ctx = TurnContext {
            user,
            recent: &recent,
            memories: &memories,
            snippets: &snippets,
        };

        let run = match self.react.run(query, &plan, &ctx).await {
            Ok(run) => run,
            Err(e) => {
                // Model backend unreachable: apologize, no write-back —
                // nothing meaningful was produced for this turn.
                warn!(user = %user, error = %e, "Turn failed: backend unreachable");
                self.publish_error("react_loop", &e);
                return Answer::text(BACKEND_APOLOGY);
            }
        };

        // Reflection: one pass, skipped when the wall clock is already
        // spent (the budget-exhausted path must not add latency).
        let answer = if self.reflection_enabled
            && !matches!(run.termination, Termination::BudgetExhausted)
        {
            self.reflector.refine(query, &run.answer, &run.scratchpad).await
        } else {
            Answer::text(&run.answer)
        };

        // Memory write-back, only now that the loop has terminated.
        session.append(Turn::user(query));
        session.append(Turn::agent(&answer.text));
        if answer.clarifying {
            // A clarifying question is not a completed exchange;
            // long-term memory only records real answers.
        } else {
            self.memory
                .remember(user, query, &answer.text, Some(plan.intent.to_string()))
                .await;
        }

        self.events.publish(DomainEvent::AnswerDelivered {
            user_id: user.as_str().to_string(),
            termination: run.termination.as_str().to_string(),
            steps: run.steps,
            timestamp: Utc::now(),
        });

        info!(
            user = %user,
            termination = run.termination.as_str(),
            steps = run.steps,
            tool_calls = run.tool_calls,
            "Turn complete"
        );

        answer
    }

    /// Plants this user has mentioned, matched against the corpus.
    pub async fn user_plants(&self, user: &UserId) -> Vec<String> {
        let records = self.memory.records_for_user(user).await;
        let mut plants: Vec<String> = self
            .retriever
            .plant_names()
            .into_iter()
            .filter(|name| {
                records
                    .iter()
                    .any(|r| r.text.to_lowercase().contains(name.as_str()))
            })
            .map(|name| capitalize(&name))
            .collect();
        plants.sort();
        plants.dedup();
        plants
    }

    /// Clear a user's short-term window and long-term partition.
    /// Returns the number of long-term records removed.
    pub async fn clear_history(&self, user: &UserId) -> usize {
        self.sessions.clear(user).await;
        match self.memory.clear_user(user).await {
            Ok(removed) => {
                self.events.publish(DomainEvent::MemoryAccessed {
                    operation: "clear".into(),
                    count: removed,
                    timestamp: Utc::now(),
                });
                removed
            }
            Err(e) => {
                warn!(user = %user, error = %e, "Failed to clear long-term memory");
                0
            }
        }
    }

    /// Snapshot of a user's short-term window (operational surface).
    pub async fn recent_turns(&self, user: &UserId) -> Vec<Turn> {
        let session = self.sessions.get_or_create(user).await;
        let guard = session.lock().await;
        guard.recent_turns()
    }

    fn publish_error(&self, context: &str, error: &Error) {
        self.events.publish(DomainEvent::ErrorOccurred {
            context: context.to_string(),
            error_message: error.to_string(),
            timestamp: Utc::now(),
        });
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use verdant_knowledge::corpus::default_corpus;
    use verdant_memory::InMemoryIndex;
    use verdant_tools::WeatherTool;

    fn advisor_with(provider: ScriptedProvider, tools: ToolRegistry) -> GardenAdvisor {
        advisor_with_config(
            provider,
            tools,
            AdvisorConfig {
                reflection: false,
                ..Default::default()
            },
        )
    }

    fn advisor_with_config(
        provider: ScriptedProvider,
        tools: ToolRegistry,
        config: AdvisorConfig,
    ) -> GardenAdvisor {
        let memory = Arc::new(MemoryStore::new(Arc::new(InMemoryIndex::new()), 5));
        let retriever = Arc::new(Retriever::from_corpus(default_corpus(), 0.1));
        GardenAdvisor::new(
            Arc::new(provider),
            Arc::new(tools),
            memory,
            retriever,
            Arc::new(EventBus::default()),
            config,
        )
    }

    fn msg(user: &str, text: &str) -> InboundMessage {
        InboundMessage::new(user, text, "test")
    }

    #[tokio::test]
    async fn calculation_scenario_end_to_end() {
        // Planner classifies by rules (no model call), loop runs
        // calculator then finishes; the final answer carries the result.
        let provider = ScriptedProvider::texts(vec![
            &tool_json("calculator", serde_json::json!({"quantity": 5, "per_unit": 2.5})),
            &finish_json("You'll need 12.5 liters of water in total."),
        ]);
        let advisor = advisor_with(provider, registry_with_calculator());

        let answer = advisor
            .handle(&msg(
                "u1",
                "Calculate water needed for 5 tomato plants at 2.5 liters each",
            ))
            .await;

        assert!(answer.text.contains("12.5"));
        assert!(!answer.clarifying);
    }

    #[tokio::test]
    async fn weather_outage_yields_fallback_not_error() {
        // Unconfigured weather tool fails on every call; after two
        // consecutive failures the loop terminates with a fallback.
        let provider = ScriptedProvider::texts(vec![
            &tool_json("weather", serde_json::json!({"location": "Jakarta"})),
            &tool_json("weather", serde_json::json!({"location": "Jakarta"})),
        ]);
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(WeatherTool::new(None, "http://127.0.0.1:9")));
        let advisor = advisor_with(provider, tools);

        let answer = advisor
            .handle(&msg("u1", "Should I water my plants today in Jakarta?"))
            .await;

        assert!(!answer.text.is_empty());
        assert!(answer.text.contains("weather"));
    }

    #[tokio::test]
    async fn backend_unreachable_yields_apology() {
        // Keyword plan avoids the model; both loop attempts fail.
        let advisor = advisor_with(ScriptedProvider::failing(2), registry_with_calculator());

        let answer = advisor
            .handle(&msg("u1", "Calculate 2 liters times 3 plants"))
            .await;

        assert_eq!(answer.text, BACKEND_APOLOGY);
        // No write-back on the apology path.
        assert!(
            advisor
                .memory
                .records_for_user(&UserId::new("u1"))
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn write_back_after_successful_turn() {
        let provider = ScriptedProvider::texts(vec![&finish_json(
            "Basil loves six hours of sun a day.",
        )]);
        let advisor = advisor_with(provider, registry_with_calculator());
        let user = UserId::new("u1");

        advisor.handle(&msg("u1", "How to care for basil?")).await;

        // Short-term window has both turns, in order.
        let turns = advisor.recent_turns(&user).await;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text, "How to care for basil?");
        assert!(turns[1].text.contains("six hours"));

        // Long-term memory has the exchange, tagged with the intent.
        let records = advisor.memory.records_for_user(&user).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].topic.as_deref(), Some("plant_care"));
    }

    #[tokio::test]
    async fn budget_exhausted_still_writes_back() {
        let provider = ScriptedProvider::texts(vec![&tool_json(
            "calculator",
            serde_json::json!({"expression": "1 + 1"}),
        )]);
        let advisor = advisor_with_config(
            provider,
            registry_with_calculator(),
            AdvisorConfig {
                max_steps: 1,
                reflection: false,
                ..Default::default()
            },
        );
        let user = UserId::new("u1");

        let answer = advisor
            .handle(&msg("u1", "Calculate something involved, in liters"))
            .await;

        assert!(!answer.text.is_empty());
        // Partial answer was still persisted.
        assert_eq!(advisor.recent_turns(&user).await.len(), 2);
        assert_eq!(advisor.memory.records_for_user(&user).await.len(), 1);
    }

    #[tokio::test]
    async fn reflection_polishes_draft_when_enabled() {
        let provider = ScriptedProvider::texts(vec![
            &finish_json("water daily"),
            "Water your basil every day — it thrives on consistency!",
        ]);
        let advisor = advisor_with_config(
            provider,
            registry_with_calculator(),
            AdvisorConfig {
                reflection: true,
                ..Default::default()
            },
        );

        let answer = advisor.handle(&msg("u1", "How to care for basil?")).await;
        assert!(answer.text.contains("thrives on consistency"));
    }

    #[tokio::test]
    async fn clarifying_answer_not_remembered_long_term() {
        let provider = ScriptedProvider::texts(vec![
            &finish_json("not sure which plant you mean"),
            "QUESTION: Which plant are you asking about?",
        ]);
        let advisor = advisor_with_config(
            provider,
            registry_with_calculator(),
            AdvisorConfig {
                reflection: true,
                ..Default::default()
            },
        );
        let user = UserId::new("u1");

        let answer = advisor.handle(&msg("u1", "How to care for it?")).await;
        assert!(answer.clarifying);

        // The question still lands in the short-term window…
        assert_eq!(advisor.recent_turns(&user).await.len(), 2);
        // …but not in long-term memory.
        assert!(advisor.memory.records_for_user(&user).await.is_empty());
    }

    #[tokio::test]
    async fn user_plants_matched_from_memory() {
        let advisor = advisor_with(ScriptedProvider::empty(), registry_with_calculator());
        let user = UserId::new("u1");

        advisor
            .memory
            .remember(&user, "My tomato plants are wilting", "Check the soil.", None)
            .await;
        advisor
            .memory
            .remember(&user, "I repotted the orchid", "Nice!", None)
            .await;

        let plants = advisor.user_plants(&user).await;
        assert_eq!(plants, vec!["Orchid".to_string(), "Tomato".to_string()]);

        // Another user has no plants on record.
        assert!(advisor.user_plants(&UserId::new("u2")).await.is_empty());
    }

    #[tokio::test]
    async fn clear_history_wipes_both_tiers() {
        let provider = ScriptedProvider::texts(vec![&finish_json("Sure thing.")]);
        let advisor = advisor_with(provider, registry_with_calculator());
        let user = UserId::new("u1");

        advisor.handle(&msg("u1", "How to grow mint?")).await;
        assert_eq!(advisor.recent_turns(&user).await.len(), 2);

        let removed = advisor.clear_history(&user).await;
        assert_eq!(removed, 1);
        assert!(advisor.recent_turns(&user).await.is_empty());
        assert!(advisor.memory.records_for_user(&user).await.is_empty());
    }

    #[tokio::test]
    async fn second_turn_sees_first_in_window() {
        let provider = ScriptedProvider::texts(vec![
            &finish_json("Tomatoes like deep watering."),
            &finish_json("Yes, every two to three days."),
        ]);
        let advisor = advisor_with(provider, registry_with_calculator());
        let user = UserId::new("u1");

        advisor.handle(&msg("u1", "How to grow tomatoes?")).await;
        advisor.handle(&msg("u1", "How to water them often?")).await;

        let turns = advisor.recent_turns(&user).await;
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].text, "How to grow tomatoes?");
        assert_eq!(turns[2].text, "How to water them often?");
    }
}
