//! Plan and intent types produced by the planner.
//!
//! A `Plan` is advisory: the reason/act loop uses the tool hints as a
//! starting point but may deviate. The complexity score feeds logging and
//! telemetry only — no control flow depends on it. Plans live for exactly
//! one turn and are never persisted.

use serde::{Deserialize, Serialize};

/// The fixed set of query intent categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Weather conditions / "should I water today?"
    Weather,
    /// How to care for a specific plant
    PlantCare,
    /// Schedule or manage a watering reminder
    Reminder,
    /// Arithmetic (water volumes, fertilizer ratios)
    Calculation,
    /// Anything answerable from general knowledge
    General,
    /// Could not be classified even by the model fallback
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Weather => "weather",
            Intent::PlantCare => "plant_care",
            Intent::Reminder => "reminder",
            Intent::Calculation => "calculation",
            Intent::General => "general",
            Intent::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The execution plan for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Classified intent category.
    pub intent: Intent,

    /// Tools the loop is *likely* to need, in suggested order.
    /// A hint, not a constraint.
    pub tool_hints: Vec<String>,

    /// Complexity estimate in [0, 1]. Telemetry only.
    pub complexity: f32,

    /// Short human-readable reason for the classification.
    pub rationale: String,
}

impl Plan {
    /// The degraded fallback plan: general intent, no hints.
    pub fn general(rationale: impl Into<String>) -> Self {
        Self {
            intent: Intent::General,
            tool_hints: Vec::new(),
            complexity: 0.2,
            rationale: rationale.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_labels() {
        assert_eq!(Intent::Weather.as_str(), "weather");
        assert_eq!(Intent::PlantCare.as_str(), "plant_care");
        assert_eq!(Intent::Unknown.to_string(), "unknown");
    }

    #[test]
    fn general_fallback_has_no_hints() {
        let plan = Plan::general("keyword rules matched nothing");
        assert_eq!(plan.intent, Intent::General);
        assert!(plan.tool_hints.is_empty());
        assert!(plan.complexity <= 1.0);
    }

    #[test]
    fn plan_serialization_roundtrip() {
        let plan = Plan {
            intent: Intent::Calculation,
            tool_hints: vec!["calculator".into()],
            complexity: 0.4,
            rationale: "matched calculation keywords".into(),
        };
        let json = serde_json::to_string(&plan).unwrap();
        let back: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(back.intent, Intent::Calculation);
        assert_eq!(back.tool_hints, vec!["calculator".to_string()]);
    }
}
