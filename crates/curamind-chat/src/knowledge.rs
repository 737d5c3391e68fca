//! Immutable topic → content store parsed from the knowledge base corpus.
//!
//! Corpus format: sections separated by a line consisting solely of `---`.
//! Inside a section, the first line starting with the title marker names the
//! topic; every line after it is content. Sections without a title line are
//! preamble and are skipped.

use std::collections::HashMap;
use std::path::Path;

use crate::error::KnowledgeLoadError;

/// Title marker used by the bundled corpus.
pub const DEFAULT_TITLE_MARKER: &str = "### \u{1f9e0}";

/// Literal line separating corpus sections.
const SECTION_DELIMITER: &str = "---";

/// A single topic and its reference text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeEntry {
    /// Upper-cased, trimmed title; the unique lookup key.
    pub topic: String,
    pub content: String,
}

/// Topic entries in load order, with an index for exact-key lookup.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    entries: Vec<KnowledgeEntry>,
    index: HashMap<String, usize>,
}

impl KnowledgeStore {
    /// A store with no topics. Retrieval against it never matches.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a corpus held in memory.
    ///
    /// A duplicate title replaces the earlier entry's content but keeps the
    /// earlier entry's position in load order.
    pub fn parse(corpus: &str, title_marker: &str) -> Self {
        let mut store = Self::default();

        for section in split_sections(corpus) {
            if let Some(entry) = parse_section(&section, title_marker) {
                store.insert(entry);
            }
        }

        store
    }

    /// Read and parse a corpus file.
    pub fn load(path: &Path, title_marker: &str) -> Result<Self, KnowledgeLoadError> {
        let corpus =
            std::fs::read_to_string(path).map_err(|source| KnowledgeLoadError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;
        let store = Self::parse(&corpus, title_marker);
        tracing::info!(
            path = %path.display(),
            topics = store.topic_count(),
            "Knowledge base loaded"
        );
        Ok(store)
    }

    /// Read and parse a corpus file, continuing with an empty store if the
    /// file cannot be read.
    pub fn load_or_empty(path: &Path, title_marker: &str) -> Self {
        match Self::load(path, title_marker) {
            Ok(store) => store,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Could not load knowledge base. Answers will use general knowledge only."
                );
                Self::empty()
            }
        }
    }

    pub fn topic_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact lookup by topic key, case-insensitive.
    pub fn lookup(&self, topic: &str) -> Option<&str> {
        let key = topic.trim().to_uppercase();
        self.index
            .get(&key)
            .map(|&i| self.entries[i].content.as_str())
    }

    /// All entries in load order.
    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    /// Topic keys in load order.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.topic.as_str())
    }

    fn insert(&mut self, entry: KnowledgeEntry) {
        match self.index.get(&entry.topic) {
            Some(&i) => {
                tracing::debug!(topic = %entry.topic, "Duplicate topic; later content wins");
                self.entries[i].content = entry.content;
            }
            None => {
                self.index.insert(entry.topic.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }
}

/// Split a corpus on delimiter lines, dropping sections that are blank.
fn split_sections(corpus: &str) -> Vec<Vec<&str>> {
    let mut sections = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in corpus.lines() {
        if line.trim_end() == SECTION_DELIMITER {
            sections.push(std::mem::take(&mut current));
        } else {
            current.push(line);
        }
    }
    sections.push(current);

    sections
        .into_iter()
        .filter(|s| s.iter().any(|line| !line.trim().is_empty()))
        .collect()
}

fn parse_section(lines: &[&str], title_marker: &str) -> Option<KnowledgeEntry> {
    let title_idx = lines
        .iter()
        .position(|line| line.trim_start().starts_with(title_marker))?;

    let topic = lines[title_idx]
        .trim_start()
        .strip_prefix(title_marker)?
        .trim()
        .to_uppercase();

    // An empty key would be a substring of every query.
    if topic.is_empty() {
        return None;
    }

    let content = lines[title_idx + 1..].join("\n").trim().to_string();

    Some(KnowledgeEntry { topic, content })
}
