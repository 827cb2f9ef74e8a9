//! Lexical retriever over document chunks.

use std::collections::BTreeSet;

use super::splitter::Chunk;

/// Default number of chunks handed to the LLM.
pub const DEFAULT_TOP_K: usize = 4;

/// Terms shorter than this are ignored ("a", "is", "to", ...).
const MIN_TERM_LEN: usize = 3;

/// A chunk with its relevance score in `(0, 1]`.
#[derive(Debug, Clone)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a Chunk,
    pub score: f32,
}

/// Scores chunks by the fraction of distinct query terms they contain.
#[derive(Debug, Clone, Default)]
pub struct Retriever {
    chunks: Vec<Chunk>,
    /// Lower-cased chunk text, parallel to `chunks`.
    lowered: Vec<String>,
}

impl Retriever {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        let lowered = chunks.iter().map(|c| c.text.to_lowercase()).collect();
        Self { chunks, lowered }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Return up to `k` matching chunks, best first. Ties keep document order.
    pub fn search(&self, query: &str, k: usize) -> Vec<ScoredChunk<'_>> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<ScoredChunk<'_>> = self
            .chunks
            .iter()
            .zip(&self.lowered)
            .filter_map(|(chunk, text)| {
                let matched = terms.iter().filter(|t| text.contains(t.as_str())).count();
                (matched > 0).then(|| ScoredChunk {
                    chunk,
                    score: matched as f32 / terms.len() as f32,
                })
            })
            .collect();

        // Stable sort keeps document order among equal scores.
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);
        results
    }
}

fn query_terms(query: &str) -> BTreeSet<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|t| t.chars().count() >= MIN_TERM_LEN)
        .map(str::to_string)
        .collect()
}
