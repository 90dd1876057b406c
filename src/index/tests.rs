use super::*;
use crate::document::document_id;
use crate::embeddings::l2_normalize;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Deterministic embedder for tests: one dimension per vocabulary term,
/// scoring term occurrence, normalized like a real provider.
struct FakeEmbedder {
    vocab: Vec<&'static str>,
}

impl FakeEmbedder {
    fn new(vocab: &[&'static str]) -> Self {
        Self {
            vocab: vocab.to_vec(),
        }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let raw: Vec<f32> = self
            .vocab
            .iter()
            .map(|term| if lowered.contains(term) { 1.0 } else { 0.0 })
            .chain(std::iter::once(0.1))
            .collect();
        l2_normalize(raw)
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vector_for(text)).collect())
    }
}

fn chunk(content: &str, page: u32, index: usize) -> PdfChunk {
    PdfChunk {
        chunk_id: format!("chunk-{page}-{index}"),
        content: content.to_string(),
        page_number: page,
        chunk_index: index,
        metadata: BTreeMap::new(),
    }
}

fn document(filename: &str, chunks: Vec<PdfChunk>) -> PdfDocument {
    let pages = chunks
        .iter()
        .map(|c| c.page_number)
        .max()
        .unwrap_or_default();
    PdfDocument {
        id: document_id(filename),
        filename: filename.to_string(),
        file_path: format!("/tmp/{filename}"),
        total_pages: pages,
        file_size: 1024,
        upload_date: Utc::now(),
        chunks,
    }
}

fn test_index() -> SimilarityIndex {
    SimilarityIndex::new(Arc::new(FakeEmbedder::new(&["alpha", "beta", "gamma"])))
}

#[tokio::test]
async fn search_ranks_matching_chunks_first() {
    let mut index = test_index();
    let doc = document(
        "test.pdf",
        vec![
            chunk("All about alpha particles.", 1, 0),
            chunk("Beta decay explained.", 2, 1),
            chunk("Gamma radiation overview.", 3, 2),
        ],
    );
    index
        .index_document(&doc)
        .await
        .expect("should index document successfully");

    let results = index
        .search("tell me about beta", 2, 0.0)
        .await
        .expect("should search successfully");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0.page_number, 2);
    assert!(results[0].1 > results[1].1);
}

#[tokio::test]
async fn search_on_empty_index_returns_empty() {
    let index = test_index();
    let results = index
        .search("anything", 4, 0.0)
        .await
        .expect("should search successfully");
    assert!(results.is_empty());
}

#[tokio::test]
async fn cleared_index_returns_empty_and_no_info() {
    let mut index = test_index();
    let doc = document("test.pdf", vec![chunk("alpha", 1, 0)]);
    index
        .index_document(&doc)
        .await
        .expect("should index document successfully");
    assert!(index.current_document_info().is_some());

    index.clear();
    index.clear(); // idempotent

    assert!(index.current_document_info().is_none());
    let results = index
        .search("alpha", 4, 0.0)
        .await
        .expect("should search successfully");
    assert!(results.is_empty());
}

#[tokio::test]
async fn indexing_replaces_previous_document_wholesale() {
    let mut index = test_index();
    let doc_a = document(
        "a.pdf",
        vec![chunk("alpha only content", 1, 0), chunk("more alpha", 2, 1)],
    );
    index
        .index_document(&doc_a)
        .await
        .expect("should index document successfully");

    let doc_b = document("b.pdf", vec![chunk("beta only content", 1, 0)]);
    index
        .index_document(&doc_b)
        .await
        .expect("should index document successfully");

    // No residual hits for A-only content above a zero-signal threshold.
    let results = index
        .search("alpha", 10, 0.5)
        .await
        .expect("should search successfully");
    assert!(results.is_empty());

    let info = index
        .current_document_info()
        .expect("should have document info");
    assert_eq!(info.filename, "b.pdf");
    assert_eq!(info.total_chunks, 1);
}

#[tokio::test]
async fn score_threshold_filters_results() {
    let mut index = test_index();
    let doc = document(
        "test.pdf",
        vec![chunk("alpha content", 1, 0), chunk("unrelated text", 2, 1)],
    );
    index
        .index_document(&doc)
        .await
        .expect("should index document successfully");

    let unfiltered = index
        .search("alpha", 10, 0.0)
        .await
        .expect("should search successfully");
    assert_eq!(unfiltered.len(), 2);

    let filtered = index
        .search("alpha", 10, 0.5)
        .await
        .expect("should search successfully");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].0.page_number, 1);
}

#[tokio::test]
async fn zero_chunk_document_is_a_no_op() {
    let mut index = test_index();
    let doc_a = document("a.pdf", vec![chunk("alpha", 1, 0)]);
    index
        .index_document(&doc_a)
        .await
        .expect("should index document successfully");

    let empty = document("empty.pdf", vec![]);
    index
        .index_document(&empty)
        .await
        .expect("should treat empty document as no-op");

    // The previous document remains indexed.
    let info = index
        .current_document_info()
        .expect("should have document info");
    assert_eq!(info.filename, "a.pdf");
}

#[tokio::test]
async fn search_results_are_deterministic() {
    let mut index = test_index();
    let doc = document(
        "test.pdf",
        vec![
            chunk("alpha one", 1, 0),
            chunk("alpha two", 2, 1),
            chunk("alpha three", 3, 2),
        ],
    );
    index
        .index_document(&doc)
        .await
        .expect("should index document successfully");

    let first = index
        .search("alpha", 3, 0.0)
        .await
        .expect("should search successfully");
    let second = index
        .search("alpha", 3, 0.0)
        .await
        .expect("should search successfully");

    let first_ids: Vec<&str> = first.iter().map(|(c, _)| c.chunk_id.as_str()).collect();
    let second_ids: Vec<&str> = second.iter().map(|(c, _)| c.chunk_id.as_str()).collect();
    assert_eq!(first_ids, second_ids);

    // Equal scores resolve by insertion order.
    assert_eq!(first_ids, vec!["chunk-1-0", "chunk-2-1", "chunk-3-2"]);
}
