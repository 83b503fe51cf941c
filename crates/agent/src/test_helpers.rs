//! Shared test helpers for the agent crate.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use verdant_core::error::{ProviderError, ToolError};
use verdant_core::message::UserId;
use verdant_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use verdant_core::tool::{Tool, ToolRegistry, ToolResult};
use verdant_tools::CalculatorTool;

/// A mock provider that returns a scripted sequence of responses.
///
/// Each call to `complete` pops the next item. Panics when the script
/// runs dry — a test making more model calls than scripted is a bug.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: Mutex<usize>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(items: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(items.into()),
            calls: Mutex::new(0),
            delay: None,
        }
    }

    /// A provider that must never be called.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Successful text responses, in order.
    pub fn texts(texts: Vec<&str>) -> Self {
        Self::new(texts.into_iter().map(|t| Ok(t.to_string())).collect())
    }

    /// `n` consecutive network failures.
    pub fn failing(n: usize) -> Self {
        Self::new((0..n).map(|_| Err(network_error())).collect())
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        *self.calls.lock().unwrap() += 1;
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(ProviderResponse {
                content,
                model: "mock-model".into(),
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
            }),
            Some(Err(e)) => Err(e),
            None => panic!("ScriptedProvider: script exhausted (call #{})", self.calls()),
        }
    }
}

pub fn network_error() -> ProviderError {
    ProviderError::Network("connection refused".into())
}

/// A well-formed tool action completion.
pub fn tool_json(tool: &str, parameters: serde_json::Value) -> String {
    serde_json::json!({"action": "tool", "tool": tool, "parameters": parameters}).to_string()
}

/// A well-formed finish completion.
pub fn finish_json(answer: &str) -> String {
    serde_json::json!({"action": "finish", "answer": answer}).to_string()
}

/// A tool that always fails.
pub struct BrokenTool;

#[async_trait]
impl Tool for BrokenTool {
    fn name(&self) -> &str {
        "broken"
    }
    fn description(&self) -> &str {
        "Always fails"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }
    async fn invoke(
        &self,
        _arguments: serde_json::Value,
        _user: &UserId,
    ) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::failure("provider outage"))
    }
}

pub fn registry_with_calculator() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(CalculatorTool));
    registry
}

pub fn registry_with_broken_tool() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(BrokenTool));
    registry
}
