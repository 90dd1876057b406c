//! The question-answering agent loop.
//!
//! An explicit reason/retrieve state machine: each round asks the model for
//! the next step; tool calls are executed against the retrieval tool and fed
//! back, while plain content ends the loop as the answer. A hard round cap
//! guarantees termination against a misbehaving model. Failures never escape
//! [`AgentLoop::run`]; they become answer-shaped outcomes with an error tag.


pub mod tool;

use anyhow::Result;
use fancy_regex::Regex;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::conversation::HistoryEntry;
use crate::document::{Citation, Role};
use crate::index::DocumentInfo;
use crate::llm::{ChatMessage, ChatModel};

pub use tool::{NO_RESULTS_MESSAGE, SEARCH_PDF_TOOL, SearchPdfTool};

/// Round cap for the reason/retrieve alternation.
pub const MAX_ROUNDS: usize = 8;

pub const NO_DOCUMENT_ANSWER: &str =
    "No PDF document is currently loaded. Please upload a PDF first.";
pub const NO_DOCUMENT_ERROR: &str = "No document indexed";

/// The result of answering one question. Error conditions are carried in
/// `error` alongside a human-readable `answer`; the loop never raises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOutcome {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub error: Option<String>,
}

impl AgentOutcome {
    fn no_document() -> Self {
        Self {
            answer: NO_DOCUMENT_ANSWER.to_string(),
            citations: Vec::new(),
            error: Some(NO_DOCUMENT_ERROR.to_string()),
        }
    }

    fn failure(message: &str) -> Self {
        Self {
            answer: format!("An error occurred: {message}"),
            citations: Vec::new(),
            error: Some(message.to_string()),
        }
    }
}

pub struct AgentLoop {
    model: Arc<dyn ChatModel>,
    tool: SearchPdfTool,
    max_rounds: usize,
}

impl AgentLoop {
    #[inline]
    pub fn new(model: Arc<dyn ChatModel>, tool: SearchPdfTool) -> Self {
        Self {
            model,
            tool,
            max_rounds: MAX_ROUNDS,
        }
    }

    #[inline]
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Answer a question using prior conversation turns as context.
    pub async fn run(&self, question: &str, history: &[HistoryEntry]) -> AgentOutcome {
        info!("Received question: '{}'", question);

        let Some(doc_info) = self.tool.document_info().await else {
            return AgentOutcome::no_document();
        };

        let mut transcript = build_transcript(&doc_info, history, question);

        match self.drive(&mut transcript).await {
            Ok(answer) => {
                let citations = extract_citations(&transcript);
                info!("Generated answer with {} citations", citations.len());
                AgentOutcome {
                    answer,
                    citations,
                    error: None,
                }
            }
            Err(e) => {
                error!("Error during agent execution: {}", e);
                AgentOutcome::failure(&e.to_string())
            }
        }
    }

    /// Alternate reason and retrieve steps until the model produces plain
    /// content or the round cap trips.
    async fn drive(&self, transcript: &mut Vec<ChatMessage>) -> Result<String> {
        let tools = [SearchPdfTool::definition()];

        for round in 1..=self.max_rounds {
            debug!("Reasoning round {}/{}", round, self.max_rounds);

            let message = self.model.generate(transcript, &tools).await?;
            let calls = message.tool_calls.clone();
            let answer = message.content.clone();
            transcript.push(message);

            if calls.is_empty() {
                debug!("Model produced a final answer in round {}", round);
                return Ok(answer);
            }

            for call in &calls {
                if call.name != SEARCH_PDF_TOOL {
                    return Err(anyhow::anyhow!("Unknown tool requested: {}", call.name));
                }
            }

            debug!("Executing {} retrieval calls", calls.len());

            // Same-step calls are independent reads and run concurrently,
            // but all must complete before the next reasoning step.
            let results = join_all(
                calls
                    .iter()
                    .map(|call| self.tool.execute(&call.arguments)),
            )
            .await;

            for (call, result) in calls.iter().zip(results) {
                transcript.push(ChatMessage::tool(result?, call.id.clone()));
            }
        }

        Err(anyhow::anyhow!(
            "Agent exceeded {} reasoning rounds without an answer",
            self.max_rounds
        ))
    }
}

/// System instruction plus prior turns plus the new question.
fn build_transcript(
    doc_info: &DocumentInfo,
    history: &[HistoryEntry],
    question: &str,
) -> Vec<ChatMessage> {
    let system = format!(
        "You are a helpful assistant that answers questions about a PDF document.\n\
         The document is: {} ({} pages).\n\n\
         When answering:\n\
         1. Use the search_pdf tool to find relevant information from the document\n\
         2. Always cite page numbers when referencing information\n\
         3. If the information is not in the document, say so clearly\n\
         4. Provide concise, accurate answers based on the document content\n\n\
         Be conversational and helpful.",
        doc_info.filename, doc_info.total_pages
    );

    let mut transcript = Vec::with_capacity(history.len() + 2);
    transcript.push(ChatMessage::system(system));

    for entry in history {
        transcript.push(match entry.role {
            Role::User => ChatMessage::user(entry.content.clone()),
            Role::Assistant => ChatMessage::assistant(entry.content.clone()),
        });
    }

    transcript.push(ChatMessage::user(question));
    transcript
}

/// Best-effort citation scan over the whole transcript for the literal
/// pattern `Page <digits>`, deduplicated by page. Heuristic by design: a
/// cited page is not guaranteed to trace back to a retrieval hit, and
/// paraphrased references are missed.
pub fn extract_citations(messages: &[ChatMessage]) -> Vec<Citation> {
    let Ok(pattern) = Regex::new(r"Page (\d+)") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut citations = Vec::new();

    for message in messages {
        for capture in pattern.captures_iter(&message.content).flatten() {
            if let Some(page) = capture.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
                if seen.insert(page) {
                    citations.push(Citation::reference(page));
                }
            }
        }
    }

    citations
}
