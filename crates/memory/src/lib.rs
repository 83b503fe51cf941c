//! Memory system implementations for Verdant.
//!
//! Two tiers:
//! - Short-term: the bounded per-session turn window
//!   (`verdant_core::session`), managed through the `MemoryStore` facade.
//! - Long-term: a per-user similarity index behind the
//!   `verdant_core::MemoryIndex` trait, with in-memory and durable JSONL
//!   backends.
//!
//! The facade is the only recall path the agent uses, and it enforces the
//! per-user partition on every read.

pub mod file_index;
pub mod in_memory;
pub mod scoring;
pub mod store;

pub use file_index::FileIndex;
pub use in_memory::InMemoryIndex;
pub use scoring::term_relevance;
pub use store::MemoryStore;
