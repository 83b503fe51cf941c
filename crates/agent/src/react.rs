//! The reason/act loop — iterative think → act → observe.
//!
//! Each iteration builds a prompt from the system instructions, tool
//! specs, retrieved knowledge, memory, conversation window, and the
//! scratchpad so far; asks the model for one action; and either
//! dispatches a tool (appending the observation) or finishes with an
//! answer.
//!
//! Bounds and failure handling:
//! - A step budget (scratchpad capacity) and a wall-clock budget both
//!   terminate the loop through `Termination::BudgetExhausted` with a
//!   best-effort answer.
//! - A malformed action gets one corrective retry for the step; a second
//!   failure forces termination with the last coherent model output.
//! - A tool failing twice in a row terminates through
//!   `Termination::Failed` with an explanatory fallback.
//! - A model call failing twice in a row is the one condition that
//!   propagates: the caller decides how to apologize to the user.
//!
//! The loop never writes memory — write-back is the advisor's job, after
//! termination, so a failed turn cannot persist partial state.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use verdant_core::error::Error;
use verdant_core::event::{DomainEvent, EventBus};
use verdant_core::knowledge::KnowledgeSnippet;
use verdant_core::memory::MemoryRecord;
use verdant_core::message::{Turn, UserId};
use verdant_core::plan::Plan;
use verdant_core::provider::{ChatMessage, Provider, ProviderRequest};
use verdant_core::tool::{ToolCall, ToolRegistry};

use crate::action::{ActionDecision, parse_decision};
use crate::prompt;
use crate::scratchpad::Scratchpad;

/// How a loop run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The model chose to answer.
    Finished,
    /// Step or wall-clock budget ran out; the answer is best-effort.
    BudgetExhausted,
    /// Repeated failure forced termination; the answer is an
    /// explanatory fallback.
    Failed,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Finished => "finished",
            Termination::BudgetExhausted => "budget_exhausted",
            Termination::Failed => "failed",
        }
    }
}

/// The outcome of one loop invocation.
pub struct LoopRun {
    /// The draft answer (pre-reflection).
    pub answer: String,
    pub termination: Termination,
    /// The full trace, for the reflection pass. Dropped after the turn.
    pub scratchpad: Scratchpad,
    pub steps: usize,
    pub tool_calls: usize,
}

/// Loop tuning.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub max_steps: usize,
    pub turn_budget: std::time::Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".into(),
            temperature: 0.7,
            max_tokens: Some(1024),
            max_steps: 6,
            turn_budget: std::time::Duration::from_secs(60),
        }
    }
}

/// Read-only context assembled by the advisor for one turn.
pub struct TurnContext<'a> {
    pub user: &'a UserId,
    pub recent: &'a [Turn],
    pub memories: &'a [MemoryRecord],
    pub snippets: &'a [KnowledgeSnippet],
}

/// How many consecutive failures of the same tool force termination.
const TOOL_FAILURE_LIMIT: u32 = 2;

pub struct ReactLoop {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    events: Arc<EventBus>,
    config: LoopConfig,
}

enum Completion {
    Text(String),
    DeadlinePassed,
}

impl ReactLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        events: Arc<EventBus>,
        config: LoopConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            events,
            config,
        }
    }

    /// Execute the loop for one query.
    pub async fn run(
        &self,
        query: &str,
        plan: &Plan,
        ctx: &TurnContext<'_>,
    ) -> Result<LoopRun, Error> {
        let deadline = Instant::now() + self.config.turn_budget;
        let mut scratchpad = Scratchpad::new(self.config.max_steps);
        let specs = self.tools.specs();
        let mut last_text = String::new();
        let mut tool_calls = 0usize;
        let mut failing_tool: Option<(String, u32)> = None;

        info!(
            user = %ctx.user,
            intent = %plan.intent,
            max_steps = self.config.max_steps,
            "Reason/act loop starting"
        );

        loop {
            if !scratchpad.has_room() {
                warn!(steps = scratchpad.len(), "Step budget exhausted");
                return Ok(self.exhausted(scratchpad, &last_text, tool_calls));
            }
            if Instant::now() >= deadline {
                warn!("Turn wall-clock budget exhausted");
                return Ok(self.exhausted(scratchpad, &last_text, tool_calls));
            }

            let step = scratchpad.len();
            debug!(step, "Loop iteration");

            let mut messages = prompt::build_messages(
                query,
                plan,
                &specs,
                ctx.recent,
                ctx.memories,
                ctx.snippets,
                &scratchpad,
            );

            let text = match self.complete(messages.clone(), deadline).await? {
                Completion::Text(text) => text,
                Completion::DeadlinePassed => {
                    return Ok(self.exhausted(scratchpad, &last_text, tool_calls));
                }
            };
            if !text.trim().is_empty() {
                last_text = text.clone();
            }

            // Parse the action; one corrective retry per step.
            let decision = match parse_decision(&text) {
                Ok(decision) => decision,
                Err(e) => {
                    debug!(error = %e, "Malformed action, issuing corrective retry");
                    messages.push(ChatMessage::assistant(&text));
                    messages.push(ChatMessage::user(prompt::corrective_instruction()));

                    let retry_text = match self.complete(messages, deadline).await? {
                        Completion::Text(text) => text,
                        Completion::DeadlinePassed => {
                            return Ok(self.exhausted(scratchpad, &last_text, tool_calls));
                        }
                    };
                    if !retry_text.trim().is_empty() {
                        last_text = retry_text.clone();
                    }

                    match parse_decision(&retry_text) {
                        Ok(decision) => decision,
                        Err(e) => {
                            warn!(error = %e, "Action parse failed twice, answering with what is known");
                            scratchpad.record_finish(&last_text);
                            let steps = scratchpad.len();
                            return Ok(if last_text.trim().is_empty() {
                                LoopRun {
                                    answer: "I'm having trouble putting together a clear answer \
                                             right now. Could you rephrase your question?"
                                        .into(),
                                    termination: Termination::Failed,
                                    scratchpad,
                                    steps,
                                    tool_calls,
                                }
                            } else {
                                LoopRun {
                                    answer: last_text,
                                    termination: Termination::Finished,
                                    scratchpad,
                                    steps,
                                    tool_calls,
                                }
                            });
                        }
                    }
                }
            };

            match decision {
                ActionDecision::Finish { answer } => {
                    scratchpad.record_finish(&text);
                    info!(
                        steps = scratchpad.len(),
                        tool_calls, "Loop finished with an answer"
                    );
                    let steps = scratchpad.len();
                    return Ok(LoopRun {
                        answer,
                        termination: Termination::Finished,
                        scratchpad,
                        steps,
                        tool_calls,
                    });
                }
                ActionDecision::Tool { tool, parameters } => {
                    let call = ToolCall::new(&tool, parameters, step);
                    let result = self.tools.dispatch(&call, ctx.user).await;
                    tool_calls += 1;

                    self.events.publish(DomainEvent::ToolExecuted {
                        tool_name: tool.clone(),
                        success: result.success,
                        duration_ms: result.latency_ms,
                        timestamp: Utc::now(),
                    });

                    let failed = !result.success;
                    let failure_detail = result.output.clone();
                    scratchpad.record_tool(&text, call, result);

                    if failed {
                        let count = match &mut failing_tool {
                            Some((name, count)) if *name == tool => {
                                *count += 1;
                                *count
                            }
                            _ => {
                                failing_tool = Some((tool.clone(), 1));
                                1
                            }
                        };
                        if count >= TOOL_FAILURE_LIMIT {
                            warn!(tool = %tool, "Tool failed repeatedly, terminating");
                            let steps = scratchpad.len();
                            return Ok(LoopRun {
                                answer: failure_fallback(&tool, &failure_detail),
                                termination: Termination::Failed,
                                scratchpad,
                                steps,
                                tool_calls,
                            });
                        }
                    } else {
                        failing_tool = None;
                    }
                }
            }
        }
    }

    /// One model call bounded by the remaining turn budget, with one
    /// retry on provider failure. A second failure propagates — total
    /// backend unavailability is the caller's problem.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        deadline: Instant,
    ) -> Result<Completion, Error> {
        let request = ProviderRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut attempts = 0;
        loop {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Ok(Completion::DeadlinePassed);
            };

            match tokio::time::timeout(remaining, self.provider.complete(request.clone())).await {
                Ok(Ok(response)) => return Ok(Completion::Text(response.content)),
                Ok(Err(e)) => {
                    attempts += 1;
                    if attempts >= 2 {
                        return Err(e.into());
                    }
                    warn!(error = %e, "Model call failed, retrying once");
                }
                Err(_) => return Ok(Completion::DeadlinePassed),
            }
        }
    }

    /// Best-effort termination when a budget runs out. Memory write-back
    /// still happens upstream, so state stays consistent on timeout.
    fn exhausted(&self, scratchpad: Scratchpad, last_text: &str, tool_calls: usize) -> LoopRun {
        let answer = if let Some(observation) = scratchpad.last_successful_observation() {
            format!(
                "I ran out of time before I could finish reasoning this through, \
                 but here's what I found: {observation}"
            )
        } else if !last_text.trim().is_empty() {
            last_text.trim().to_string()
        } else {
            "I ran out of time working on that. Please try asking again in a moment.".into()
        };

        let steps = scratchpad.len();
        LoopRun {
            answer,
            termination: Termination::BudgetExhausted,
            scratchpad,
            steps,
            tool_calls,
        }
    }
}

/// The explanatory fallback when a tool fails repeatedly. Names the
/// missing data so the user knows what the answer lacks.
fn failure_fallback(tool: &str, detail: &str) -> String {
    let brief: String = detail.chars().take(140).collect();
    format!(
        "I'm sorry — I couldn't get the {tool} information I needed ({brief}). \
         I can still offer general advice if you ask again, or try later once \
         the service recovers."
    )
}
