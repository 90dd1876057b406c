//! The session orchestrator: one document, one conversation, one agent.
//!
//! A `Session` is an explicit value owned by its caller; nothing here is
//! process-global. It is not internally synchronized, so callers must not
//! overlap `upload_and_index` with `ask` on the same session. An ask issued
//! during an in-flight upload may observe a half-replaced index.

#[cfg(test)]
mod tests;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::agent::{AgentLoop, AgentOutcome, SearchPdfTool};
use crate::config::{ChunkingConfig, Config};
use crate::conversation::{self, HistoryEntry};
use crate::document::{Conversation, PdfDocument, Role};
use crate::embeddings::{EmbeddingProvider, ollama::OllamaEmbedder};
use crate::index::{DocumentInfo, SimilarityIndex};
use crate::llm::{ChatModel, build_chat_model};
use crate::pdf::PdfProcessor;

pub const NO_AGENT_ANSWER: &str = "No PDF has been uploaded yet. Please upload a PDF first.";
pub const NO_AGENT_ERROR: &str = "No agent initialized";

/// The result of an upload. Failures carry a short message and leave the
/// session's document, index, and conversation untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Success {
        filename: String,
        total_pages: u32,
        total_chunks: usize,
        message: String,
    },
    Failure {
        message: String,
    },
}

impl UploadOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }
}

pub struct Session {
    processor: PdfProcessor,
    index: Arc<RwLock<SimilarityIndex>>,
    model: Arc<dyn ChatModel>,
    agent: Option<AgentLoop>,
    conversation: Option<Conversation>,
}

impl Session {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn ChatModel>,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            processor: PdfProcessor::new(chunking),
            index: Arc::new(RwLock::new(SimilarityIndex::new(embedder))),
            model,
            agent: None,
            conversation: None,
        }
    }

    /// Build a session from configuration, wiring the configured embedding
    /// server and chat provider.
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = Arc::new(OllamaEmbedder::new(&config.embeddings)?);
        let model = build_chat_model(config)?;
        Ok(Self::new(embedder, model, config.chunking))
    }

    /// Extract, chunk, and index a PDF, then start a fresh conversation
    /// scoped to it. The agent is constructed on the first upload and reused
    /// afterwards; its retrieval tool reads the shared index, so re-indexing
    /// is visible to it without reconstruction.
    pub async fn upload_and_index(&mut self, path: &Path, filename: &str) -> UploadOutcome {
        info!("Uploading PDF: {}", filename);

        let document = match self.processor.process(path, filename) {
            Ok(document) => document,
            Err(e) => {
                error!("Failed to process {}: {}", filename, e);
                return UploadOutcome::failure(format!("Error processing PDF: {e}"));
            }
        };

        self.install(document).await
    }

    /// Index a processed document and reset the conversation. No session
    /// state changes if indexing fails.
    async fn install(&mut self, document: PdfDocument) -> UploadOutcome {
        let filename = document.filename.clone();

        if document.chunks.is_empty() {
            return UploadOutcome::failure(format!(
                "No extractable text found in {filename}"
            ));
        }

        let total_pages = document.total_pages;
        let total_chunks = document.total_chunks();

        if let Err(e) = self.index.write().await.index_document(&document).await {
            error!("Failed to index {}: {}", filename, e);
            return UploadOutcome::failure(format!("Error processing PDF: {e}"));
        }

        if self.agent.is_none() {
            self.agent = Some(AgentLoop::new(
                Arc::clone(&self.model),
                SearchPdfTool::new(Arc::clone(&self.index)),
            ));
        }

        self.conversation = Some(conversation::new_conversation(&filename));

        info!(
            "Indexed {}: {} pages, {} chunks",
            filename, total_pages, total_chunks
        );

        UploadOutcome::Success {
            message: format!(
                "Successfully processed '{filename}': {total_pages} pages, {total_chunks} chunks indexed"
            ),
            filename,
            total_pages,
            total_chunks,
        }
    }

    /// Answer a question against the current document, recording both turns
    /// in the conversation.
    pub async fn ask(&mut self, question: &str) -> AgentOutcome {
        let Some(agent) = &self.agent else {
            return AgentOutcome {
                answer: NO_AGENT_ANSWER.to_string(),
                citations: Vec::new(),
                error: Some(NO_AGENT_ERROR.to_string()),
            };
        };

        // A missing conversation is recreated scoped to the indexed
        // document's filename.
        let fallback_filename = self
            .index
            .read()
            .await
            .current_document_info()
            .map_or_else(|| "unknown".to_string(), |info| info.filename);
        let conversation = self
            .conversation
            .get_or_insert_with(|| conversation::new_conversation(&fallback_filename));

        conversation::add_message(conversation, Role::User, question, Vec::new());

        // History for the model excludes the turn just appended; the loop
        // receives the question separately.
        let history = conversation::history_view(conversation);
        let prior = &history[..history.len() - 1];

        let outcome = agent.run(question, prior).await;

        conversation::add_message(
            conversation,
            Role::Assistant,
            &outcome.answer,
            outcome.citations.clone(),
        );

        outcome
    }

    pub async fn document_info(&self) -> Option<DocumentInfo> {
        self.index.read().await.current_document_info()
    }

    pub fn conversation_history(&self) -> Vec<HistoryEntry> {
        self.conversation
            .as_ref()
            .map(conversation::history_view)
            .unwrap_or_default()
    }

    /// Start a fresh conversation over the same document.
    pub fn clear_conversation(&mut self) {
        if let Some(conversation) = &self.conversation {
            let filename = conversation.pdf_filename.clone();
            self.conversation = Some(conversation::new_conversation(&filename));
            info!("Conversation cleared for {}", filename);
        }
    }

    /// Drop the index, conversation, and agent. The next upload starts from
    /// scratch.
    pub async fn clear_all(&mut self) {
        self.index.write().await.clear();
        self.conversation = None;
        self.agent = None;
        info!("Session cleared");
    }
}
