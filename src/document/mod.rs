//! Domain types for documents, chunks, conversations, and citations.

#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A bounded span of a document's text, tagged with its source page and
/// position within the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfChunk {
    pub chunk_id: String,
    pub content: String,
    /// 1-based page number the chunk was extracted from
    pub page_number: u32,
    /// 0-based position within the document
    pub chunk_index: usize,
    pub metadata: BTreeMap<String, String>,
}

/// A processed PDF document and its chunks. Replaced wholesale on re-upload,
/// never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfDocument {
    pub id: Uuid,
    pub filename: String,
    pub file_path: String,
    pub total_pages: u32,
    pub file_size: u64,
    pub upload_date: DateTime<Utc>,
    pub chunks: Vec<PdfChunk>,
}

impl PdfDocument {
    #[inline]
    pub fn total_chunks(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn chunks_for_page(&self, page_number: u32) -> impl Iterator<Item = &PdfChunk> {
        self.chunks
            .iter()
            .filter(move |chunk| chunk.page_number == page_number)
    }
}

/// Deterministic document identity derived from the filename, so identical
/// uploads produce identical ids.
#[inline]
pub fn document_id(filename: &str) -> Uuid {
    let digest = Sha256::digest(filename.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A page reference attributed to an answer. Derived from a best-effort text
/// scan, so a citation is not guaranteed to trace back to a retrieval hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub page: u32,
    pub kind: String,
}

impl Citation {
    #[inline]
    pub fn reference(page: u32) -> Self {
        Self {
            page,
            kind: "reference".to_string(),
        }
    }
}

/// A single turn in a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub citations: Vec<Citation>,
}

/// An ordered, append-only log of user/assistant turns for one document
/// session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub pdf_filename: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
