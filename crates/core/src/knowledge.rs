//! Knowledge snippet — the retrieval unit produced by the RAG retriever.

use serde::{Deserialize, Serialize};

/// A ranked snippet of domain knowledge retrieved for a query.
///
/// Read-only: snippets come from the pre-indexed plant-care corpus and
/// are injected into the agent prompt as grounding context. An empty
/// retrieval means "no extra context", never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    /// Identifier of the source document (e.g. the plant name).
    pub source: String,

    /// The snippet text.
    pub text: String,

    /// Relevance score in [0, 1].
    pub score: f32,
}
