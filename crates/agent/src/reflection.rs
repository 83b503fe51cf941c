//! Reflection pass — one bounded review of the draft answer.
//!
//! A single extra model call checks the draft against the original query
//! and the observations the loop collected: factual consistency,
//! completeness, tone. The pass only edits text — it can never issue
//! tool calls — and it runs exactly once, so termination stays trivial
//! to reason about. When the draft is judged unanswerable from the
//! observations, the pass may instead return a clarifying question.
//!
//! Any failure returns the draft unchanged: reflection improves turns,
//! it never fails them.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use verdant_core::gateway::Answer;
use verdant_core::provider::{ChatMessage, Provider, ProviderRequest};

use crate::scratchpad::Scratchpad;

/// Marker the model uses to signal a clarifying question instead of an
/// improved answer.
const QUESTION_MARKER: &str = "QUESTION:";

/// Hard cap on the reflection call, independent of the turn budget —
/// the loop already spent its time; this pass must stay cheap.
const REFLECTION_TIMEOUT: Duration = Duration::from_secs(20);

pub struct Reflector {
    provider: Arc<dyn Provider>,
    model: String,
}

impl Reflector {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Review the draft and return the final answer.
    pub async fn refine(&self, query: &str, draft: &str, scratchpad: &Scratchpad) -> Answer {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(
                    "You review a garden advisor's reply before it is sent.",
                ),
                ChatMessage::user(self.review_prompt(query, draft, scratchpad)),
            ],
            temperature: 0.3,
            max_tokens: Some(512),
        };

        let response =
            match tokio::time::timeout(REFLECTION_TIMEOUT, self.provider.complete(request)).await {
                Ok(Ok(response)) => response.content,
                Ok(Err(e)) => {
                    warn!(error = %e, "Reflection call failed, keeping draft");
                    return Answer::text(draft);
                }
                Err(_) => {
                    warn!("Reflection call timed out, keeping draft");
                    return Answer::text(draft);
                }
            };

        let refined = response.trim();
        if refined.is_empty() {
            debug!("Reflection returned nothing, keeping draft");
            return Answer::text(draft);
        }

        if let Some(question) = refined.strip_prefix(QUESTION_MARKER) {
            let question = question.trim();
            if question.is_empty() {
                return Answer::text(draft);
            }
            debug!("Reflection produced a clarifying question");
            return Answer::clarifying(question);
        }

        Answer::text(refined)
    }

    fn review_prompt(&self, query: &str, draft: &str, scratchpad: &Scratchpad) -> String {
        let mut prompt = String::from(
            "Review the reply below.\n\
             - If it is accurate, complete for the question, and friendly, \
             return it unchanged.\n\
             - If it can be clearer or warmer, rewrite it. The rewrite must \
             stay consistent with the tool observations listed; never invent \
             facts they don't support.\n\
             - Only if the question cannot be answered at all from the \
             observations, reply with a single clarifying question prefixed \
             with 'QUESTION:'.\n\n\
             Return ONLY the final message for the user — no analysis, no \
             mention of this review.\n\n",
        );

        prompt.push_str(&format!("User question: {query}\n\n"));

        let observations = scratchpad.observations();
        if !observations.is_empty() {
            prompt.push_str("Tool observations:\n");
            for obs in &observations {
                prompt.push_str(&format!("- {obs}\n"));
            }
            prompt.push('\n');
        }

        prompt.push_str(&format!("Reply to review: {draft}\n"));
        prompt
    }
}
