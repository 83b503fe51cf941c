//! # Verdant Core
//!
//! Domain types, traits, and error definitions for the Verdant garden
//! advisor agent. This crate has **zero framework dependencies** — it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem boundary is defined as a trait here: the language-model
//! backend (`Provider`), agent capabilities (`Tool`), and the long-term
//! memory index (`MemoryIndex`). Implementations live in their respective
//! crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod event;
pub mod gateway;
pub mod knowledge;
pub mod memory;
pub mod message;
pub mod plan;
pub mod provider;
pub mod session;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use gateway::{Answer, InboundMessage};
pub use knowledge::KnowledgeSnippet;
pub use memory::{MemoryIndex, MemoryRecord, RecallQuery};
pub use message::{Role, Turn, UserId};
pub use plan::{Intent, Plan};
pub use provider::{ChatMessage, ChatRole, Provider, ProviderRequest, ProviderResponse, Usage};
pub use session::ConversationSession;
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult, ToolSpec};
