//! Query → knowledge content retrieval by topic substring containment.

use std::sync::Arc;

use crate::knowledge::KnowledgeStore;

/// Greetings recognised when none are configured.
pub const DEFAULT_GREETINGS: &[&str] = &["HELLO", "HI"];

/// Maps a free-text query to at most one knowledge entry.
///
/// Matching is deliberately coarse: the first topic (in load order) whose key
/// occurs anywhere in the upper-cased query wins. Queries starting with a
/// greeting never match, even if they also mention a topic.
#[derive(Debug, Clone)]
pub struct Retriever {
    store: Arc<KnowledgeStore>,
    greetings: Vec<String>,
}

impl Retriever {
    pub fn new(store: Arc<KnowledgeStore>) -> Self {
        Self::with_greetings(store, DEFAULT_GREETINGS.iter().map(|g| g.to_string()))
    }

    pub fn with_greetings<I, S>(store: Arc<KnowledgeStore>, greetings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let greetings = greetings
            .into_iter()
            .map(|g| g.as_ref().trim().to_uppercase())
            .filter(|g| !g.is_empty())
            .collect();
        Self { store, greetings }
    }

    /// Return the content of the first topic contained in `query`.
    ///
    /// Topics without content never match.
    pub fn retrieve(&self, query: &str) -> Option<&str> {
        let normalized = query.to_uppercase();

        if self.is_greeting(&normalized) {
            return None;
        }

        self.store
            .entries()
            .iter()
            .find(|entry| {
                !entry.content.is_empty() && normalized.contains(entry.topic.as_str())
            })
            .map(|entry| entry.content.as_str())
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    fn is_greeting(&self, normalized: &str) -> bool {
        self.greetings.iter().any(|g| normalized.starts_with(g.as_str()))
    }
}
