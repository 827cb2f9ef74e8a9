//! Runbook knowledge base: retrieval-augmented answers.
//!
//! Documents are loaded from disk, split into overlapping chunks, ranked
//! lexically against the question, and the best chunks are handed to the
//! LLM as context.

pub mod loader;
pub mod retriever;
pub mod splitter;

pub use loader::{Document, load_documents};
pub use retriever::{Retriever, ScoredChunk};
pub use splitter::{Chunk, TextSplitter};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::KnowledgeConfig;
use crate::error::KnowledgeError;
use crate::llm::{CompletionRequest, LlmProvider};

/// System preamble for runbook answers.
pub const SYSTEM_PROMPT: &str = "You are an Enterprise Ops Copilot helping SREs and on-call \
engineers. Answer using the Ops runbook excerpts provided. Keep answers concise and \
operationally useful. If the excerpts do not cover the question, say so plainly.";

/// Anything that can answer a free-text operations question.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn answer(&self, query: &str) -> Result<String, KnowledgeError>;
}

/// Retrieval-augmented knowledge base over a directory of runbooks.
pub struct RagKnowledgeBase {
    retriever: Retriever,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
    temperature: f64,
}

impl RagKnowledgeBase {
    /// Load, split and index the runbooks described by `config`.
    pub async fn build(
        config: &KnowledgeConfig,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self, KnowledgeError> {
        let documents = load_documents(&config.path).await?;
        info!(path = %config.path.display(), documents = documents.len(), "Loaded knowledge base");

        let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap);
        let chunks = splitter.split_documents(&documents);
        info!(chunks = chunks.len(), "Indexed knowledge base chunks");

        Ok(Self::from_chunks(chunks, llm, config))
    }

    /// Build directly from pre-split chunks.
    pub fn from_chunks(
        chunks: Vec<Chunk>,
        llm: Arc<dyn LlmProvider>,
        config: &KnowledgeConfig,
    ) -> Self {
        Self {
            retriever: Retriever::new(chunks),
            llm,
            top_k: config.top_k,
            temperature: config.temperature,
        }
    }

    /// Number of indexed chunks.
    pub fn chunk_count(&self) -> usize {
        self.retriever.len()
    }

    fn build_prompt(&self, query: &str) -> String {
        let hits = self.retriever.search(query, self.top_k);
        debug!(query = %query, hits = hits.len(), "Retrieved runbook context");

        if hits.is_empty() {
            return format!(
                "No runbook section matched this question.\n\nQuestion: {}",
                query
            );
        }

        let context = hits
            .iter()
            .map(|hit| format!("[{}]\n{}", hit.chunk.source, hit.chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");
        format!(
            "Runbook excerpts:\n\n{}\n\nQuestion: {}",
            context, query
        )
    }
}

#[async_trait]
impl KnowledgeBase for RagKnowledgeBase {
    async fn answer(&self, query: &str) -> Result<String, KnowledgeError> {
        let request = CompletionRequest::new(SYSTEM_PROMPT, self.build_prompt(query))
            .with_temperature(self.temperature);
        let response = self.llm.complete(request).await?;
        Ok(response.content)
    }
}
