//! Scratchpad — the ephemeral thought/action/observation trace for one
//! reason/act invocation.
//!
//! Owned exclusively by one loop run, bounded by the step budget, and
//! discarded after the turn (the scratchpad is never persisted — only
//! the final exchange reaches long-term memory).

use verdant_core::tool::{ToolCall, ToolResult};

/// What the model chose to do in a step.
#[derive(Debug, Clone)]
pub enum StepAction {
    /// A tool invocation with its result.
    Tool {
        call: ToolCall,
        result: ToolResult,
    },
    /// The model decided to answer.
    Finish,
}

/// One completed step.
#[derive(Debug, Clone)]
pub struct ScratchpadEntry {
    /// The model's reasoning text for this step.
    pub thought: String,

    /// What it did.
    pub action: StepAction,
}

/// The bounded step trace for one loop invocation.
#[derive(Debug, Clone)]
pub struct Scratchpad {
    entries: Vec<ScratchpadEntry>,
    max_steps: usize,
}

impl Scratchpad {
    pub fn new(max_steps: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_steps: max_steps.max(1),
        }
    }

    /// Whether another step may run.
    pub fn has_room(&self) -> bool {
        self.entries.len() < self.max_steps
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn entries(&self) -> &[ScratchpadEntry] {
        &self.entries
    }

    /// Record a tool step (thought, call, observation).
    pub fn record_tool(&mut self, thought: &str, call: ToolCall, result: ToolResult) {
        self.entries.push(ScratchpadEntry {
            thought: thought.to_string(),
            action: StepAction::Tool { call, result },
        });
    }

    /// Record the finishing step.
    pub fn record_finish(&mut self, thought: &str) {
        self.entries.push(ScratchpadEntry {
            thought: thought.to_string(),
            action: StepAction::Finish,
        });
    }

    /// The most recent successful observation, if any.
    pub fn last_successful_observation(&self) -> Option<&str> {
        self.entries.iter().rev().find_map(|e| match &e.action {
            StepAction::Tool { result, .. } if result.success => Some(result.output.as_str()),
            _ => None,
        })
    }

    /// Observations in order, for the reflection prompt.
    pub fn observations(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| match &e.action {
                StepAction::Tool { call, result } => {
                    let status = if result.success { "ok" } else { "failed" };
                    Some(format!("{} ({}): {}", call.name, status, result.output))
                }
                StepAction::Finish => None,
            })
            .collect()
    }

    /// Render the trace for the next step's prompt.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            out.push_str(&format!("Step {}:\n", i + 1));
            if !entry.thought.trim().is_empty() {
                out.push_str(&format!("Thought: {}\n", entry.thought.trim()));
            }
            match &entry.action {
                StepAction::Tool { call, result } => {
                    out.push_str(&format!("Action: {}({})\n", call.name, call.arguments));
                    let status = if result.success { "" } else { "[failed] " };
                    out.push_str(&format!("Observation: {}{}\n", status, result.output));
                }
                StepAction::Finish => out.push_str("Action: finish\n"),
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str) -> ToolCall {
        ToolCall::new(name, serde_json::json!({"q": 1}), 0)
    }

    #[test]
    fn room_tracks_step_budget() {
        let mut pad = Scratchpad::new(2);
        assert!(pad.has_room());

        pad.record_tool("t1", call("a"), ToolResult::ok("one", None));
        assert!(pad.has_room());

        pad.record_tool("t2", call("b"), ToolResult::ok("two", None));
        assert!(!pad.has_room());
    }

    #[test]
    fn last_successful_observation_skips_failures() {
        let mut pad = Scratchpad::new(5);
        pad.record_tool("t", call("a"), ToolResult::ok("good data", None));
        pad.record_tool("t", call("b"), ToolResult::failure("timeout"));

        assert_eq!(pad.last_successful_observation(), Some("good data"));
    }

    #[test]
    fn observations_labelled_by_outcome() {
        let mut pad = Scratchpad::new(5);
        pad.record_tool("t", call("weather"), ToolResult::ok("22°C", None));
        pad.record_tool("t", call("web_search"), ToolResult::failure("offline"));
        pad.record_finish("done");

        let obs = pad.observations();
        assert_eq!(obs.len(), 2);
        assert!(obs[0].starts_with("weather (ok)"));
        assert!(obs[1].starts_with("web_search (failed)"));
    }

    #[test]
    fn render_contains_trace_structure() {
        let mut pad = Scratchpad::new(5);
        pad.record_tool(
            "I should check the weather",
            call("weather"),
            ToolResult::ok("sunny", None),
        );

        let rendered = pad.render();
        assert!(rendered.contains("Step 1:"));
        assert!(rendered.contains("Thought: I should check the weather"));
        assert!(rendered.contains("Action: weather("));
        assert!(rendered.contains("Observation: sunny"));
    }

    #[test]
    fn render_marks_failures() {
        let mut pad = Scratchpad::new(5);
        pad.record_tool("t", call("weather"), ToolResult::failure("provider outage"));
        assert!(pad.render().contains("[failed] provider outage"));
    }

    #[test]
    fn zero_max_steps_clamped() {
        let pad = Scratchpad::new(0);
        assert_eq!(pad.max_steps(), 1);
        assert!(pad.has_room());
    }
}
