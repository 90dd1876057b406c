use super::*;
use crate::document::{Citation, PdfChunk, document_id};
use crate::llm::{ChatMessage, ToolCall, ToolDefinition};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::{BTreeMap, VecDeque};
use std::io::Write;
use std::sync::Mutex;

struct FakeEmbedder;

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lowered = text.to_lowercase();
        Ok(crate::embeddings::l2_normalize(vec![
            if lowered.contains('x') { 1.0 } else { 0.0 },
            0.1,
        ]))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

struct ScriptedModel {
    responses: Mutex<VecDeque<ChatMessage>>,
}

impl ScriptedModel {
    fn new(responses: Vec<ChatMessage>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }

    fn answering(answer: &str) -> Self {
        Self::new(vec![ChatMessage::assistant(answer)])
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn generate(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> Result<ChatMessage> {
        self.responses
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("script exhausted"))
    }
}

fn session_with_model(model: ScriptedModel) -> Session {
    Session::new(
        Arc::new(FakeEmbedder),
        Arc::new(model),
        ChunkingConfig::default(),
    )
}

fn document(filename: &str, pages: &[(&str, u32)]) -> PdfDocument {
    let chunks = pages
        .iter()
        .enumerate()
        .map(|(idx, (content, page))| PdfChunk {
            chunk_id: format!("chunk-{idx}"),
            content: (*content).to_string(),
            page_number: *page,
            chunk_index: idx,
            metadata: BTreeMap::new(),
        })
        .collect();
    PdfDocument {
        id: document_id(filename),
        filename: filename.to_string(),
        file_path: format!("/tmp/{filename}"),
        total_pages: 2,
        file_size: 1024,
        upload_date: Utc::now(),
        chunks,
    }
}

fn search_then_answer(query: &str, answer: &str) -> ScriptedModel {
    let mut call = ChatMessage::assistant("");
    call.tool_calls = vec![ToolCall {
        id: "call_1".to_string(),
        name: crate::agent::SEARCH_PDF_TOOL.to_string(),
        arguments: json!({"query": query, "k": 1}),
    }];
    ScriptedModel::new(vec![call, ChatMessage::assistant(answer)])
}

#[tokio::test]
async fn ask_before_any_upload_is_refused() {
    let mut session = session_with_model(ScriptedModel::new(vec![]));

    let outcome = session.ask("What is X?").await;

    assert_eq!(outcome.answer, NO_AGENT_ANSWER);
    assert_eq!(outcome.error.as_deref(), Some(NO_AGENT_ERROR));
    assert!(session.conversation_history().is_empty());
}

#[tokio::test]
async fn install_reports_page_and_chunk_counts() {
    let mut session = session_with_model(ScriptedModel::new(vec![]));
    let doc = document("report.pdf", &[("X intro", 1), ("X details", 2)]);

    let outcome = session.install(doc).await;

    assert_eq!(
        outcome,
        UploadOutcome::Success {
            filename: "report.pdf".to_string(),
            total_pages: 2,
            total_chunks: 2,
            message: "Successfully processed 'report.pdf': 2 pages, 2 chunks indexed"
                .to_string(),
        }
    );

    let info = session.document_info().await.expect("should have a document");
    assert_eq!(info.filename, "report.pdf");
    assert_eq!(info.total_chunks, 2);
}

#[tokio::test]
async fn ask_records_user_then_assistant_turns() {
    let mut session = session_with_model(search_then_answer("X", "X is on Page 2."));
    session
        .install(document("report.pdf", &[("filler", 1), ("X lives here", 2)]))
        .await;

    let outcome = session.ask("What is X?").await;

    assert_eq!(outcome.answer, "X is on Page 2.");
    assert_eq!(outcome.citations, vec![Citation::reference(2)]);
    assert!(outcome.error.is_none());

    let history = session.conversation_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content, "What is X?");
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content, "X is on Page 2.");

    // Citations ride on the stored assistant message.
    let conversation = session
        .conversation
        .as_ref()
        .expect("should have a conversation");
    assert_eq!(conversation.messages[1].citations, vec![Citation::reference(2)]);
}

#[tokio::test]
async fn failed_model_turn_is_still_recorded() {
    let mut session = session_with_model(ScriptedModel::new(vec![]));
    session
        .install(document("report.pdf", &[("X lives here", 2)]))
        .await;

    let outcome = session.ask("What is X?").await;

    assert!(outcome.error.is_some());
    // Both turns are appended even when the loop fails.
    assert_eq!(session.conversation_history().len(), 2);
}

#[tokio::test]
async fn upload_of_unreadable_file_changes_nothing() {
    let mut session = session_with_model(ScriptedModel::new(vec![]));

    let mut file = tempfile::NamedTempFile::new().expect("should create temp file");
    file.write_all(b"not a pdf at all")
        .expect("should write temp file");

    let outcome = session.upload_and_index(file.path(), "broken.pdf").await;

    assert!(matches!(outcome, UploadOutcome::Failure { .. }));
    assert!(session.document_info().await.is_none());
    assert_eq!(
        session.ask("anything").await.error.as_deref(),
        Some(NO_AGENT_ERROR)
    );
}

#[tokio::test]
async fn empty_document_is_rejected_and_previous_kept() {
    let mut session = session_with_model(ScriptedModel::new(vec![]));
    session
        .install(document("first.pdf", &[("X content", 1)]))
        .await;

    let outcome = session.install(document("empty.pdf", &[])).await;

    let UploadOutcome::Failure { message } = outcome else {
        panic!("expected a failure outcome");
    };
    assert!(message.contains("No extractable text"));

    let info = session.document_info().await.expect("should keep a document");
    assert_eq!(info.filename, "first.pdf");
}

#[tokio::test]
async fn new_upload_replaces_document_and_resets_conversation() {
    let mut session = session_with_model(ScriptedModel::answering("Answered."));
    session
        .install(document("first.pdf", &[("X content", 1)]))
        .await;
    session.ask("What is X?").await;
    assert_eq!(session.conversation_history().len(), 2);

    session
        .install(document("second.pdf", &[("other content", 1)]))
        .await;

    let info = session.document_info().await.expect("should have a document");
    assert_eq!(info.filename, "second.pdf");
    assert!(session.conversation_history().is_empty());
    // The agent survives the swap; its tool reads the shared index.
    assert!(session.agent.is_some());
}

#[tokio::test]
async fn clear_conversation_keeps_the_document() {
    let mut session = session_with_model(ScriptedModel::answering("Answered."));
    session
        .install(document("report.pdf", &[("X content", 1)]))
        .await;
    session.ask("What is X?").await;

    session.clear_conversation();

    assert!(session.conversation_history().is_empty());
    assert!(session.document_info().await.is_some());
    assert_eq!(
        session
            .conversation
            .as_ref()
            .expect("should have a conversation")
            .pdf_filename,
        "report.pdf"
    );
}

#[tokio::test]
async fn dropped_conversation_is_recreated_for_the_indexed_document() {
    let mut session = session_with_model(ScriptedModel::answering("Answered."));
    session
        .install(document("report.pdf", &[("X content", 1)]))
        .await;

    // The conversation can be absent while the agent survives.
    session.conversation = None;

    session.ask("What is X?").await;

    let conversation = session
        .conversation
        .as_ref()
        .expect("should have a conversation");
    assert_eq!(conversation.pdf_filename, "report.pdf");
    assert_eq!(conversation.messages.len(), 2);
}

#[tokio::test]
async fn clear_all_forces_reinitialization() {
    let mut session = session_with_model(ScriptedModel::answering("Answered."));
    session
        .install(document("report.pdf", &[("X content", 1)]))
        .await;
    session.ask("What is X?").await;

    session.clear_all().await;

    assert!(session.document_info().await.is_none());
    assert!(session.conversation_history().is_empty());
    assert_eq!(
        session.ask("again?").await.error.as_deref(),
        Some(NO_AGENT_ERROR)
    );
}
