//! The knowledge retriever — ranked snippet lookup over the indexed
//! corpus.

use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

use verdant_core::knowledge::KnowledgeSnippet;
use verdant_memory::scoring::term_relevance;

use crate::corpus::{PlantProfile, load_or_seed};

/// An indexed document: the plant name as source, the rendered profile as
/// searchable text.
#[derive(Debug, Clone)]
struct Doc {
    source: String,
    text: String,
}

/// Retrieves ranked knowledge snippets for a query.
///
/// The index lives in memory; `reindex` reloads it from disk when the
/// corpus file changes (an out-of-band maintenance operation).
pub struct Retriever {
    docs: RwLock<Vec<Doc>>,
    corpus_path: Option<PathBuf>,
    min_score: f32,
}

impl Retriever {
    /// Build a retriever over an already-loaded corpus.
    pub fn from_corpus(corpus: Vec<PlantProfile>, min_score: f32) -> Self {
        Self {
            docs: RwLock::new(Self::index(corpus)),
            corpus_path: None,
            min_score,
        }
    }

    /// Build a retriever from a corpus file, seeding defaults if missing.
    pub fn from_path(path: &Path, min_score: f32) -> std::io::Result<Self> {
        let corpus = load_or_seed(path)?;
        Ok(Self {
            docs: RwLock::new(Self::index(corpus)),
            corpus_path: Some(path.to_path_buf()),
            min_score,
        })
    }

    fn index(corpus: Vec<PlantProfile>) -> Vec<Doc> {
        corpus
            .into_iter()
            .map(|p| Doc {
                source: p.name.to_lowercase(),
                text: p.document(),
            })
            .collect()
    }

    /// Ranked retrieval. Returns at most `k` snippets scoring at or above
    /// the threshold; an empty result is a normal outcome.
    pub fn retrieve(&self, query: &str, k: usize) -> Vec<KnowledgeSnippet> {
        let docs = self.docs.read().unwrap_or_else(|e| e.into_inner());

        let mut snippets: Vec<KnowledgeSnippet> = docs
            .iter()
            .map(|d| KnowledgeSnippet {
                source: d.source.clone(),
                text: d.text.clone(),
                score: term_relevance(&d.text, query),
            })
            .filter(|s| s.score >= self.min_score && s.score > 0.0)
            .collect();

        snippets.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        snippets.truncate(k);

        debug!(query = %query, hits = snippets.len(), "Knowledge retrieval");
        snippets
    }

    /// Reload the corpus from disk. No-op when the retriever was built
    /// from an in-memory corpus.
    pub fn reindex(&self) -> std::io::Result<usize> {
        let Some(path) = &self.corpus_path else {
            return Ok(self.len());
        };
        let corpus = load_or_seed(path)?;
        let docs = Self::index(corpus);
        let count = docs.len();
        *self.docs.write().unwrap_or_else(|e| e.into_inner()) = docs;
        Ok(count)
    }

    /// Names of the indexed plants (used for plant-mention matching).
    pub fn plant_names(&self) -> Vec<String> {
        self.docs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|d| d.source.clone())
            .collect()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.docs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
