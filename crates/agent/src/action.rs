//! Action grammar — parsing model output into a tagged decision.
//!
//! The model is instructed to answer every loop step with exactly one
//! JSON object:
//!
//! ```json
//! {"action": "tool", "tool": "weather", "parameters": {"location": "Oslo"}}
//! {"action": "finish", "answer": "Water them tomorrow morning."}
//! ```
//!
//! Models wrap JSON in prose and code fences anyway, so extraction scans
//! the output for balanced objects and tries each one. A parse failure is
//! a typed, recoverable error — the loop appends a corrective instruction
//! and retries the step once before forcing termination.

use serde::Deserialize;
use thiserror::Error;

/// The model's decision for one loop step.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionDecision {
    /// Invoke a tool with the given parameters.
    Tool {
        tool: String,
        parameters: serde_json::Value,
    },
    /// Stop and answer.
    Finish { answer: String },
}

#[derive(Debug, Error)]
pub enum ActionParseError {
    #[error("no JSON object found in model output")]
    NoJson,

    #[error("no JSON object in the output is a valid action: {0}")]
    InvalidAction(String),
}

/// Wire shape of an action object.
#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum WireAction {
    Tool {
        tool: String,
        #[serde(default)]
        parameters: serde_json::Value,
    },
    Finish {
        answer: String,
    },
}

/// Parse a model completion into an action decision.
pub fn parse_decision(text: &str) -> Result<ActionDecision, ActionParseError> {
    let candidates = extract_json_objects(text);
    if candidates.is_empty() {
        return Err(ActionParseError::NoJson);
    }

    let mut last_error = String::new();
    for candidate in &candidates {
        match serde_json::from_str::<WireAction>(candidate) {
            Ok(WireAction::Tool { tool, parameters }) => {
                let parameters = if parameters.is_null() {
                    serde_json::json!({})
                } else {
                    parameters
                };
                return Ok(ActionDecision::Tool { tool, parameters });
            }
            Ok(WireAction::Finish { answer }) => {
                return Ok(ActionDecision::Finish { answer });
            }
            Err(e) => last_error = e.to_string(),
        }
    }

    Err(ActionParseError::InvalidAction(last_error))
}

/// Extract balanced top-level JSON objects from free text, respecting
/// string literals and escapes.
fn extract_json_objects(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut objects = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'{' {
            i += 1;
            continue;
        }

        let start = i;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        let mut end = None;

        for (offset, &b) in bytes[start..].iter().enumerate() {
            if escaped {
                escaped = false;
                continue;
            }
            match b {
                b'\\' if in_string => escaped = true,
                b'"' => in_string = !in_string,
                b'{' if !in_string => depth += 1,
                b'}' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(start + offset + 1);
                        break;
                    }
                }
                _ => {}
            }
        }

        match end {
            Some(end) => {
                objects.push(&text[start..end]);
                i = end;
            }
            None => break, // unbalanced to end of text
        }
    }

    objects
}
