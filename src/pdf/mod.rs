//! PDF text extraction and chunking.
//!
//! Turns a PDF file on disk into a [`PdfDocument`] whose chunks are ready for
//! embedding. Extraction is all-or-nothing: a page that fails to extract
//! fails the whole document, so a half-indexed document can never exist.

pub mod chunker;

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use tracing::debug;

use crate::config::ChunkingConfig;
use crate::document::{PdfDocument, document_id};

/// Extracted text for a single page. Pages with no extractable text yield no
/// entry at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub text: String,
    /// 1-based page number within the source PDF
    pub page_number: u32,
}

/// Per-page text extracted from a PDF, plus the raw page count of the file
/// (which includes pages that yielded no text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPages {
    pub pages: Vec<PageText>,
    pub total_pages: u32,
}

/// Extract text from a PDF with page numbers, skipping pages that have no
/// extractable text.
pub fn extract_pages(path: &Path) -> Result<ExtractedPages> {
    let page_texts = pdf_extract::extract_text_by_pages(path)
        .with_context(|| format!("Failed to extract text from PDF: {}", path.display()))?;

    let total_pages = u32::try_from(page_texts.len()).context("PDF page count overflow")?;

    let pages = page_texts
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(idx, text)| PageText {
            text,
            page_number: u32::try_from(idx).unwrap_or(u32::MAX).saturating_add(1),
        })
        .collect::<Vec<_>>();

    debug!(
        "Extracted {} non-empty pages out of {} from {}",
        pages.len(),
        total_pages,
        path.display()
    );

    Ok(ExtractedPages { pages, total_pages })
}

/// Handles PDF text extraction and chunking end-to-end.
#[derive(Debug, Clone, Default)]
pub struct PdfProcessor {
    chunking: ChunkingConfig,
}

impl PdfProcessor {
    #[inline]
    pub fn new(chunking: ChunkingConfig) -> Self {
        Self { chunking }
    }

    /// Process a PDF file into a document entity with all of its chunks.
    #[inline]
    pub fn process(&self, path: &Path, filename: &str) -> Result<PdfDocument> {
        let extracted = extract_pages(path)?;
        let chunks = chunker::split_pages(&extracted.pages, &self.chunking);

        let file_size = std::fs::metadata(path)
            .with_context(|| format!("Failed to stat PDF file: {}", path.display()))?
            .len();

        Ok(PdfDocument {
            id: document_id(filename),
            filename: filename.to_string(),
            file_path: path.to_string_lossy().into_owned(),
            total_pages: extracted.total_pages,
            file_size,
            upload_date: Utc::now(),
            chunks,
        })
    }
}
