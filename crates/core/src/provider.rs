//! Provider trait — the abstraction over LLM backends.
//!
//! A Provider knows how to send a prompt to a language model and get the
//! completion back. The agent never emits provider-native function calls:
//! action selection rides inside the completion text under a strict JSON
//! grammar owned by the agent crate, so the provider surface stays a plain
//! chat-completion contract that any OpenAI-compatible endpoint satisfies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// The role of a chat message sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message in a model prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g. "llama-3.3-70b-versatile")
    pub model: String,

    /// The prompt messages
    pub messages: Vec<ChatMessage>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

/// A completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The completion text.
    pub content: String,

    /// Which model actually responded (may differ from requested).
    pub model: String,

    /// Token usage statistics, when the backend reports them.
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// Every LLM backend implements this. The planner, loop, and reflection
/// pass call `complete()` without knowing which backend is configured.
/// Failures must come back as typed `ProviderError`s — the callers decide
/// whether a failure is recoverable (mid-loop retry) or terminal (apology).
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g. "groq", "openai").
    fn name(&self) -> &str;

    /// Send a request and get the completion.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// List available models for this provider.
    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_constructors() {
        let msg = ChatMessage::system("You are a garden advisor.");
        assert_eq!(msg.role, ChatRole::System);

        let msg = ChatMessage::user("Hello");
        assert_eq!(msg.role, ChatRole::User);
    }

    #[test]
    fn request_serializes_roles_lowercase() {
        let req = ProviderRequest {
            model: "test-model".into(),
            messages: vec![ChatMessage::user("hi")],
            temperature: 0.7,
            max_tokens: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(!json.contains("max_tokens"));
    }

    #[test]
    fn default_temperature_value() {
        assert!((default_temperature() - 0.7).abs() < f32::EPSILON);
    }
}
