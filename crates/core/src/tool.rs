//! Tool trait and registry — the agent's capability dispatch layer.
//!
//! Tools give the agent the ability to act outside the conversation:
//! check the weather, do arithmetic, schedule reminders, search the web.
//! Each tool declares a name, a description, a JSON Schema for its
//! parameters, and a timeout. The registry validates arguments against
//! the schema before invocation and time-bounds every call.
//!
//! Nothing raises past `ToolRegistry::dispatch`: unknown tools, invalid
//! arguments, provider outages, and timeouts all come back as a
//! `ToolResult` with `success = false` and a readable message, so the
//! reasoning loop can observe the failure and adapt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::message::UserId;

/// A request to execute a tool, issued by one loop step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID.
    pub id: String,

    /// Name of the tool to execute.
    pub name: String,

    /// Arguments as a JSON object.
    pub arguments: serde_json::Value,

    /// Which loop step issued this call.
    #[serde(default)]
    pub step: usize,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value, step: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            arguments,
            step,
        }
    }
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for.
    pub call_id: String,

    /// Whether the tool executed successfully.
    pub success: bool,

    /// Human-readable output (or error detail on failure).
    pub output: String,

    /// Optional structured payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// How long the invocation took.
    #[serde(default)]
    pub latency_ms: u64,
}

impl ToolResult {
    /// A successful result.
    pub fn ok(output: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            call_id: String::new(),
            success: true,
            output: output.into(),
            data,
            latency_ms: 0,
        }
    }

    /// A failed result with a readable error payload.
    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            call_id: String::new(),
            success: false,
            output: output.into(),
            data: None,
            latency_ms: 0,
        }
    }
}

/// The name/description/schema triple rendered into the agent prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// The core Tool trait.
///
/// Each capability (weather, calculator, reminder, web_search) implements
/// this trait and is registered in the `ToolRegistry`. Invocations receive
/// the calling user's ID so side-effecting tools can scope their state.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g. "weather", "calculator").
    fn name(&self) -> &str;

    /// What this tool does (rendered into the agent prompt).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// How long an invocation may run before the registry cuts it off.
    fn timeout(&self) -> Duration {
        Duration::from_secs(10)
    }

    /// Execute the tool with validated arguments.
    async fn invoke(
        &self,
        arguments: serde_json::Value,
        user: &UserId,
    ) -> std::result::Result<ToolResult, ToolError>;

    /// This tool's prompt-facing spec.
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Validate arguments against a tool's parameter schema.
///
/// Covers the subset of JSON Schema the built-in tools use: top-level
/// object with typed properties and a `required` list. Unknown properties
/// pass through untouched — tools may accept more than they declare.
pub fn validate_arguments(
    tool_name: &str,
    schema: &serde_json::Value,
    arguments: &serde_json::Value,
) -> std::result::Result<(), ToolError> {
    let invalid = |reason: String| ToolError::InvalidArguments {
        tool_name: tool_name.to_string(),
        reason,
    };

    let Some(args) = arguments.as_object() else {
        return Err(invalid("arguments must be a JSON object".into()));
    };

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if !args.contains_key(field) {
                return Err(invalid(format!("missing required field '{field}'")));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) else {
        return Ok(());
    };

    for (key, value) in args {
        let Some(decl) = properties.get(key) else {
            continue;
        };
        let Some(expected) = decl.get("type").and_then(|t| t.as_str()) else {
            continue;
        };
        let matches = match expected {
            "string" => value.is_string(),
            "number" => value.is_number(),
            "integer" => value.is_i64() || value.is_u64(),
            "boolean" => value.is_boolean(),
            "object" => value.is_object(),
            "array" => value.is_array(),
            _ => true,
        };
        if !matches {
            return Err(invalid(format!("field '{key}' must be of type {expected}")));
        }
    }

    Ok(())
}

/// A registry of available tools.
///
/// Built once at startup and read-only afterwards — no locking needed.
/// The reasoning loop uses it to render tool specs into the prompt and to
/// dispatch the actions the model selects.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// All tool specs, sorted by name for stable prompt rendering.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|t| t.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// All registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Dispatch a tool call: validate, invoke with a timeout, absorb
    /// failures into the result.
    ///
    /// Whatever goes wrong inside, the caller gets a `ToolResult` —
    /// nothing raises past this boundary.
    pub async fn dispatch(&self, call: &ToolCall, user: &UserId) -> ToolResult {
        let started = Instant::now();

        let finish = |mut result: ToolResult| {
            result.call_id = call.id.clone();
            result.latency_ms = started.elapsed().as_millis() as u64;
            result
        };

        let Some(tool) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, "dispatch to unknown tool");
            return finish(ToolResult::failure(format!(
                "Unknown tool '{}'. Available tools: {}",
                call.name,
                self.sorted_names().join(", ")
            )));
        };

        if let Err(e) = validate_arguments(&call.name, &tool.parameters_schema(), &call.arguments) {
            debug!(tool = %call.name, error = %e, "argument validation failed");
            return finish(ToolResult::failure(e.to_string()));
        }

        let timeout = tool.timeout();
        match tokio::time::timeout(timeout, tool.invoke(call.arguments.clone(), user)).await {
            Ok(Ok(result)) => {
                debug!(tool = %call.name, success = result.success, "tool executed");
                finish(result)
            }
            Ok(Err(e)) => {
                warn!(tool = %call.name, error = %e, "tool invocation failed");
                finish(ToolResult::failure(e.to_string()))
            }
            Err(_) => {
                warn!(tool = %call.name, timeout_secs = timeout.as_secs(), "tool timed out");
                finish(ToolResult::failure(
                    ToolError::Timeout {
                        tool_name: call.name.clone(),
                        timeout_secs: timeout.as_secs(),
                    }
                    .to_string(),
                ))
            }
        }
    }

    fn sorted_names(&self) -> Vec<&str> {
        let mut names = self.names();
        names.sort_unstable();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
