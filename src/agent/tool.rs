//! The retrieval tool: the agent loop's only way to read document content.

use anyhow::{Result, anyhow};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::index::{DocumentInfo, SimilarityIndex};
use crate::llm::ToolDefinition;

pub const SEARCH_PDF_TOOL: &str = "search_pdf";
pub const NO_RESULTS_MESSAGE: &str = "No relevant information found in the PDF.";

const DEFAULT_K: usize = 4;
const EXCERPT_CHARS: usize = 300;

/// Similarity search over the live index, formatted for model consumption.
///
/// Holds a shared reference to the index rather than a snapshot, so a
/// re-indexed document is immediately visible to an existing agent.
#[derive(Clone)]
pub struct SearchPdfTool {
    index: Arc<RwLock<SimilarityIndex>>,
}

impl SearchPdfTool {
    #[inline]
    pub fn new(index: Arc<RwLock<SimilarityIndex>>) -> Self {
        Self { index }
    }

    /// The descriptor declared to the model.
    #[inline]
    pub fn definition() -> ToolDefinition {
        ToolDefinition {
            name: SEARCH_PDF_TOOL.to_string(),
            description: "Search the PDF document for relevant information. \
                Use this tool when you need to find specific information from the PDF."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query (natural language)"
                    },
                    "k": {
                        "type": "integer",
                        "description": "Number of results to return (default: 4)"
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        }
    }

    #[inline]
    pub async fn document_info(&self) -> Option<DocumentInfo> {
        self.index.read().await.current_document_info()
    }

    /// Execute a search requested by the model. Zero hits return a fixed
    /// sentinel string the loop treats as informative content, not an error.
    pub async fn execute(&self, arguments: &Value) -> Result<String> {
        let query = arguments
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("Missing required parameter: query"))?;

        let k = arguments
            .get("k")
            .and_then(Value::as_u64)
            .map(|k| usize::try_from(k.max(1)).unwrap_or(DEFAULT_K))
            .unwrap_or(DEFAULT_K);

        info!("Tool called: search_pdf(query='{}', k={})", query, k);

        let results = self.index.read().await.search(query, k, 0.0).await?;

        if results.is_empty() {
            return Ok(NO_RESULTS_MESSAGE.to_string());
        }

        let formatted: Vec<String> = results
            .iter()
            .enumerate()
            .map(|(idx, (chunk, score))| {
                let excerpt: String = chunk.content.chars().take(EXCERPT_CHARS).collect();
                format!(
                    "Result {} (Page {}, Score: {:.3}):\n{}...",
                    idx + 1,
                    chunk.page_number,
                    score,
                    excerpt
                )
            })
            .collect();

        Ok(formatted.join("\n\n"))
    }
}
