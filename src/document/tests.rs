use super::*;

fn chunk(page: u32, index: usize) -> PdfChunk {
    PdfChunk {
        chunk_id: format!("chunk-{page}-{index}"),
        content: "Test content".to_string(),
        page_number: page,
        chunk_index: index,
        metadata: BTreeMap::new(),
    }
}

#[test]
fn document_chunk_accessors() {
    let doc = PdfDocument {
        id: document_id("test.pdf"),
        filename: "test.pdf".to_string(),
        file_path: "/path/to/test.pdf".to_string(),
        total_pages: 2,
        file_size: 1024,
        upload_date: Utc::now(),
        chunks: vec![chunk(1, 0), chunk(1, 1), chunk(2, 2)],
    };

    assert_eq!(doc.total_chunks(), 3);
    assert_eq!(doc.chunks_for_page(1).count(), 2);
    assert_eq!(doc.chunks_for_page(2).count(), 1);
    assert_eq!(doc.chunks_for_page(3).count(), 0);
}

#[test]
fn document_id_is_deterministic() {
    assert_eq!(document_id("report.pdf"), document_id("report.pdf"));
    assert_ne!(document_id("report.pdf"), document_id("other.pdf"));
}

#[test]
fn role_string_mapping() {
    assert_eq!(Role::User.as_str(), "user");
    assert_eq!(Role::Assistant.as_str(), "assistant");
}

#[test]
fn reference_citation() {
    let citation = Citation::reference(7);
    assert_eq!(citation.page, 7);
    assert_eq!(citation.kind, "reference");
}
