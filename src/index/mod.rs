//! In-memory similarity index over chunk embeddings.
//!
//! Holds at most one document's chunks. Indexing a new document replaces the
//! entire index; there is no multi-document merging and nothing is persisted
//! across process restarts.

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::document::{PdfChunk, PdfDocument};
use crate::embeddings::EmbeddingProvider;

/// A chunk plus its embedding vector.
#[derive(Debug, Clone)]
struct IndexEntry {
    chunk: PdfChunk,
    embedding: Vec<f32>,
}

/// Summary of the currently indexed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub filename: String,
    pub total_pages: u32,
    pub total_chunks: usize,
    pub upload_date: DateTime<Utc>,
}

pub struct SimilarityIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    entries: Vec<IndexEntry>,
    current_document: Option<PdfDocument>,
}

impl SimilarityIndex {
    #[inline]
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
            current_document: None,
        }
    }

    /// Index a document's chunks, replacing any previously indexed document
    /// wholesale. A document with zero chunks is a warning-level no-op that
    /// leaves the existing index untouched.
    pub async fn index_document(&mut self, document: &PdfDocument) -> Result<()> {
        if document.chunks.is_empty() {
            warn!("Document {} has no chunks", document.filename);
            return Ok(());
        }

        info!(
            "Indexing document: {} with {} chunks",
            document.filename,
            document.chunks.len()
        );

        let texts: Vec<String> = document
            .chunks
            .iter()
            .map(|chunk| chunk.content.clone())
            .collect();

        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .await
            .context("Failed to embed document chunks")?;

        if embeddings.len() != document.chunks.len() {
            return Err(anyhow::anyhow!(
                "Embedding count mismatch: {} chunks but {} vectors",
                document.chunks.len(),
                embeddings.len()
            ));
        }

        self.entries = document
            .chunks
            .iter()
            .cloned()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();
        self.current_document = Some(document.clone());

        info!("Successfully indexed {} chunks", self.entries.len());
        Ok(())
    }

    /// Similarity search over the indexed chunks: up to `k` results ranked by
    /// descending score, filtered to `score >= score_threshold`. An empty or
    /// cleared index returns an empty list, never an error. Ties keep
    /// insertion order.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        score_threshold: f32,
    ) -> Result<Vec<(PdfChunk, f32)>> {
        if self.entries.is_empty() {
            warn!("No document indexed in similarity index");
            return Ok(Vec::new());
        }

        debug!("Searching for: '{}' (top {} results)", query, k);

        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .context("Failed to embed query")?;

        let mut scored: Vec<(PdfChunk, f32)> = self
            .entries
            .iter()
            .map(|entry| {
                (
                    entry.chunk.clone(),
                    dot_product(&entry.embedding, &query_embedding),
                )
            })
            .collect();

        // Vec::sort_by is stable, so equal scores keep insertion order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let results: Vec<(PdfChunk, f32)> = scored
            .into_iter()
            .filter(|(_, score)| *score >= score_threshold)
            .take(k)
            .collect();

        debug!(
            "Found {} results above threshold {}",
            results.len(),
            score_threshold
        );

        Ok(results)
    }

    /// Drop the index and current-document reference. Idempotent.
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_document = None;
        info!("Similarity index cleared");
    }

    /// Information about the currently indexed document, or `None` when
    /// nothing is indexed.
    #[inline]
    pub fn current_document_info(&self) -> Option<DocumentInfo> {
        self.current_document.as_ref().map(|doc| DocumentInfo {
            filename: doc.filename.clone(),
            total_pages: doc.total_pages,
            total_chunks: doc.total_chunks(),
            upload_date: doc.upload_date,
        })
    }
}

/// Both vectors are unit length, so the dot product is cosine similarity.
fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
