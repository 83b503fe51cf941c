//! Plant-care knowledge corpus and retriever for Verdant.
//!
//! The corpus is a static JSON file of plant profiles, indexed in memory
//! at startup. Retrieval ranks documents by keyword relevance and returns
//! only snippets that clear the configured threshold — an empty result
//! means "no extra context", never an error. Re-indexing is an
//! out-of-band operation triggered on corpus changes, not on the hot
//! path.

pub mod corpus;
pub mod retriever;

pub use corpus::{PlantProfile, default_corpus, load_or_seed};
pub use retriever::Retriever;
