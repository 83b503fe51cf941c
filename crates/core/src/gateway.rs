//! Gateway contract — what the chat platform hands the core, and what it
//! gets back.
//!
//! The chat platform itself (message ingress, mention stripping, command
//! prefixes) lives outside the core. The core consumes an
//! `InboundMessage` and produces an `Answer`; the channels crate adapts
//! concrete transports (CLI, and whatever platform a deployment wires up)
//! to this contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::GatewayError;
use crate::message::UserId;

/// A message arriving from the chat platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Who sent it.
    pub user_id: UserId,

    /// The text, already stripped of platform artifacts (mentions, etc.).
    pub text: String,

    /// Which channel delivered it (e.g. "cli", "discord").
    pub channel: String,
}

impl InboundMessage {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>, channel: &str) -> Self {
        Self {
            user_id: UserId::new(user_id),
            text: text.into(),
            channel: channel.to_string(),
        }
    }
}

/// The core's reply for the gateway to deliver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The reply text.
    pub text: String,

    /// True when the reply is a clarifying question rather than an
    /// answer (the reflection pass judged the draft unanswerable from
    /// the observations collected).
    #[serde(default)]
    pub clarifying: bool,
}

impl Answer {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            clarifying: false,
        }
    }

    pub fn clarifying(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            clarifying: true,
        }
    }
}

/// A chat transport.
///
/// `start` yields incoming messages; `deliver` sends a reply back to a
/// user. Implementations handle platform-specific connection logic.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name (e.g. "cli").
    fn name(&self) -> &str;

    /// Start listening; returns a receiver of inbound messages.
    async fn start(
        &self,
    ) -> std::result::Result<
        mpsc::Receiver<std::result::Result<InboundMessage, GatewayError>>,
        GatewayError,
    >;

    /// Deliver a reply to a user.
    async fn deliver(
        &self,
        user: &UserId,
        answer: &Answer,
    ) -> std::result::Result<(), GatewayError>;
}
