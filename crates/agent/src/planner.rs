//! Planner — intent classification and tool hinting.
//!
//! Keyword rules handle the common cases without a model call, keeping
//! the planning step cheap and fast. Only when no rule matches does the
//! planner spend one model call on classification — and when even that
//! fails, it degrades to the general intent rather than erroring. The
//! plan is advisory throughout: hints, not constraints.

use std::sync::Arc;
use tracing::{debug, warn};

use verdant_core::message::{Turn, UserId};
use verdant_core::plan::{Intent, Plan};
use verdant_core::provider::{ChatMessage, Provider, ProviderRequest};

/// Keyword tables per intent, checked in order. First hit wins, so the
/// more specific intents come before plant care.
const WEATHER_KEYWORDS: &[&str] = &[
    "weather",
    "rain",
    "temperature",
    "forecast",
    "should i water",
    "sunny",
    "humid",
];
const REMINDER_KEYWORDS: &[&str] = &["remind", "reminder", "notify", "schedule a"];
const CALCULATION_KEYWORDS: &[&str] = &[
    "calculate",
    "how much water",
    "how many liters",
    "liters",
    "gallons",
    "total amount",
];
const PLANT_CARE_KEYWORDS: &[&str] = &[
    "how to",
    "care for",
    "grow",
    "water frequency",
    "sunlight",
    "soil",
    "prune",
    "fertiliz",
    "repot",
];
const SEARCH_KEYWORDS: &[&str] = &["search", "look up", "find information"];

pub struct Planner {
    provider: Arc<dyn Provider>,
    model: String,
}

impl Planner {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Produce a plan for a query. Never errors: unclassifiable input
    /// degrades to the general intent with empty hints.
    pub async fn plan(&self, query: &str, recent: &[Turn], user: &UserId) -> Plan {
        let lowered = query.to_lowercase();

        let (intent, rationale) = match classify_by_rules(&lowered) {
            Some((intent, keyword)) => (intent, format!("matched keyword '{keyword}'")),
            None => self.classify_by_model(query, recent).await,
        };

        let tool_hints = hints_for(intent, &lowered);
        let complexity = complexity_estimate(intent, query, &tool_hints);

        debug!(
            user = %user,
            intent = %intent,
            complexity,
            hints = ?tool_hints,
            "Plan created"
        );

        Plan {
            intent,
            tool_hints,
            complexity,
            rationale,
        }
    }

    /// One-shot model classification for queries the rules miss.
    async fn classify_by_model(&self, query: &str, recent: &[Turn]) -> (Intent, String) {
        let mut prompt = String::from(
            "Classify the user's gardening question into exactly one \
             category. Reply with a single word from: weather, plant_care, \
             reminder, calculation, general.\n\n",
        );
        if let Some(last) = recent.last() {
            prompt.push_str(&format!("Previous turn: {}\n", last.text));
        }
        prompt.push_str(&format!("Question: {query}"));

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system("You classify gardening questions."),
                ChatMessage::user(prompt),
            ],
            temperature: 0.0,
            max_tokens: Some(8),
        };

        match self.provider.complete(request).await {
            Ok(response) => {
                let label = response.content.trim().to_lowercase();
                match parse_label(&label) {
                    Some(intent) => (intent, format!("model classified as '{label}'")),
                    None => (
                        Intent::Unknown,
                        format!("model label '{label}' not recognized"),
                    ),
                }
            }
            Err(e) => {
                warn!(error = %e, "Planner model fallback failed, degrading to general");
                (Intent::General, format!("planning degraded: {e}"))
            }
        }
    }
}

fn classify_by_rules(lowered: &str) -> Option<(Intent, &'static str)> {
    let tables: &[(Intent, &[&str])] = &[
        (Intent::Weather, WEATHER_KEYWORDS),
        (Intent::Reminder, REMINDER_KEYWORDS),
        (Intent::Calculation, CALCULATION_KEYWORDS),
        (Intent::PlantCare, PLANT_CARE_KEYWORDS),
    ];

    for (intent, keywords) in tables {
        if let Some(keyword) = keywords.iter().find(|k| lowered.contains(*k)) {
            return Some((*intent, keyword));
        }
    }
    None
}

fn parse_label(label: &str) -> Option<Intent> {
    let intent = match label {
        l if l.contains("weather") => Intent::Weather,
        l if l.contains("plant_care") || l.contains("plant care") => Intent::PlantCare,
        l if l.contains("reminder") => Intent::Reminder,
        l if l.contains("calculation") => Intent::Calculation,
        l if l.contains("general") => Intent::General,
        _ => return None,
    };
    Some(intent)
}

fn hints_for(intent: Intent, lowered: &str) -> Vec<String> {
    match intent {
        Intent::Weather => vec!["weather".into()],
        Intent::Reminder => vec!["reminder".into()],
        Intent::Calculation => vec!["calculator".into()],
        // Plant care is answered from retrieved knowledge, not a tool.
        Intent::PlantCare => Vec::new(),
        Intent::General => {
            if SEARCH_KEYWORDS.iter().any(|k| lowered.contains(k)) {
                vec!["web_search".into()]
            } else {
                Vec::new()
            }
        }
        Intent::Unknown => Vec::new(),
    }
}

/// Step-count heuristic mapped into [0, 1]. Telemetry only.
fn complexity_estimate(intent: Intent, query: &str, hints: &[String]) -> f32 {
    let base = match intent {
        Intent::Weather => 0.5,
        Intent::PlantCare => 0.4,
        Intent::Reminder => 0.3,
        Intent::Calculation => 0.3,
        Intent::General => 0.2,
        Intent::Unknown => 0.2,
    };
    let length_bonus = if query.len() > 120 { 0.2 } else { 0.0 };
    let hint_bonus = 0.1 * hints.len().saturating_sub(1) as f32;
    (base + length_bonus + hint_bonus).clamp(0.0, 1.0)
}
