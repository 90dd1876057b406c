//! Boundary-seeking text chunker.
//!
//! Splits per-page text into bounded-length chunks with a fixed overlap
//! between consecutive chunks of the same page. Chunks never span pages.


use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::debug;

use crate::config::ChunkingConfig;
use crate::document::PdfChunk;
use crate::pdf::PageText;

/// Split boundaries tried in priority order: paragraph break, line break,
/// sentence end, word break. A hard character cut is the fallback.
const SEPARATORS: [&[char]; 4] = [&['\n', '\n'], &['\n'], &['.', ' '], &[' ']];

/// Chunk extracted pages while preserving page numbers. Chunk indexes run
/// document-wide and chunk ids are reproducible from identical input.
pub fn split_pages(pages: &[PageText], config: &ChunkingConfig) -> Vec<PdfChunk> {
    let mut chunks = Vec::new();
    let mut counter = 0usize;

    for page in pages {
        for piece in split_page(&page.text, config.chunk_size, config.chunk_overlap) {
            let mut metadata = BTreeMap::new();
            metadata.insert("page".to_string(), page.page_number.to_string());
            metadata.insert("chunk_index".to_string(), counter.to_string());
            metadata.insert(
                "char_count".to_string(),
                piece.chars().count().to_string(),
            );

            chunks.push(PdfChunk {
                chunk_id: chunk_id(page.page_number, counter, &piece),
                content: piece,
                page_number: page.page_number,
                chunk_index: counter,
                metadata,
            });
            counter += 1;
        }
    }

    debug!("Split {} pages into {} chunks", pages.len(), chunks.len());
    chunks
}

/// Split one page's text into pieces of at most `size` characters, copying
/// `overlap` characters from the tail of each piece into the head of the
/// next. Cut points prefer the latest boundary at or before the budget.
pub fn split_page(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= size {
        return vec![text.to_string()];
    }

    let mut pieces = Vec::new();
    let mut start = 0usize;

    loop {
        let budget_end = (start + size).min(chars.len());
        let end = if budget_end == chars.len() {
            budget_end
        } else {
            seek_boundary(&chars[start..budget_end])
                .map(|offset| start + offset)
                .unwrap_or(budget_end)
        };

        pieces.push(chars[start..end].iter().collect());

        if end == chars.len() {
            break;
        }

        // Guard against a piece shorter than the overlap: advancing to
        // end - overlap would not make progress, so drop the overlap.
        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { end };
    }

    pieces
}

/// Offset one past the latest separator within the window, trying separators
/// in priority order.
fn seek_boundary(window: &[char]) -> Option<usize> {
    for separator in SEPARATORS {
        if let Some(pos) = rfind_seq(window, separator) {
            return Some(pos + separator.len());
        }
    }
    None
}

fn rfind_seq(haystack: &[char], needle: &[char]) -> Option<usize> {
    if haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Reproducible chunk identity from page number, running counter, and a
/// content prefix. Collisions across different documents are acceptable
/// because only one document is live at a time.
pub fn chunk_id(page_number: u32, counter: usize, content: &str) -> String {
    let prefix: String = content.chars().take(50).collect();
    let digest = Sha256::digest(format!("{page_number}_{counter}_{prefix}").as_bytes());

    let mut id = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(id, "{byte:02x}");
    }
    id
}
