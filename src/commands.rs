use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::document::Role;
use crate::embeddings::ollama::OllamaEmbedder;
use crate::session::{Session, UploadOutcome};
use crate::{PdfQaError, Result};

/// Upload and index a PDF. Input validation happens here so that an invalid
/// path never reaches the processing pipeline.
pub async fn upload_pdf(session: &mut Session, path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(PdfQaError::Pdf(format!("File not found: {}", path.display())));
    }
    if !path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    {
        return Err(PdfQaError::Pdf(format!("Not a PDF file: {}", path.display())));
    }

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    info!("Uploading {}", filename);
    println!("Uploading {filename}...");

    match session.upload_and_index(path, &filename).await {
        UploadOutcome::Success { message, .. } => {
            println!("{message}");
            Ok(())
        }
        UploadOutcome::Failure { message } => Err(PdfQaError::Pdf(message)),
    }
}

/// Ask a question about the indexed document and print the answer, with
/// source pages when verbose.
pub async fn ask_question(session: &mut Session, question: &str, verbose: bool) -> Result<()> {
    println!("Question: {question}");

    let outcome = session.ask(question).await;

    println!("\nAnswer: {}", outcome.answer);

    if verbose && !outcome.citations.is_empty() {
        let pages: Vec<String> = outcome
            .citations
            .iter()
            .map(|citation| citation.page.to_string())
            .collect();
        println!("Sources: page(s) {}", pages.join(", "));
    }

    if let Some(error) = outcome.error {
        return Err(PdfQaError::Llm(error));
    }
    Ok(())
}

/// Print a summary of the currently indexed document.
pub async fn show_document_info(session: &Session) {
    match session.document_info().await {
        Some(info) => {
            println!("Current document: {}", info.filename);
            println!("  Pages: {}", info.total_pages);
            println!("  Chunks indexed: {}", info.total_chunks);
            println!(
                "  Uploaded: {}",
                info.upload_date.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        None => println!("No document is currently indexed."),
    }
}

/// Print the conversation so far, oldest first.
pub fn show_history(session: &Session) {
    let history = session.conversation_history();

    if history.is_empty() {
        println!("No conversation history.");
        return;
    }

    println!("Conversation history ({} messages):", history.len());
    for entry in history {
        let label = match entry.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        println!(
            "[{}] {}: {}",
            entry.timestamp.format("%H:%M:%S"),
            label,
            entry.content
        );
    }
}

pub fn clear_conversation(session: &mut Session) {
    session.clear_conversation();
    println!("Conversation cleared.");
}

pub async fn clear_all(session: &mut Session) {
    session.clear_all().await;
    println!("Document, index, and conversation cleared.");
}

/// Check connectivity to the configured services and report their settings.
pub fn show_status() -> Result<()> {
    let config = load_config()?;

    println!("Embedding server:");
    match OllamaEmbedder::new(&config.embeddings) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!(
                    "  ✅ Connected ({}:{})",
                    config.embeddings.host, config.embeddings.port
                );
                println!("  Model: {}", config.embeddings.model);
                println!("  Batch size: {}", config.embeddings.batch_size);
            }
            Err(e) => println!("  ⚠️  Connected but unhealthy: {e}"),
        },
        Err(e) => println!("  ❌ Failed to connect: {e}"),
    }

    println!("Language model:");
    println!("  Provider: {:?}", config.llm.provider);
    println!("  Model: {}", config.llm.model);

    Ok(())
}

/// Print the active configuration as TOML.
pub fn show_config() -> Result<()> {
    let config = load_config()?;
    let rendered = toml::to_string_pretty(&config)
        .map_err(|e| PdfQaError::Config(format!("Failed to render configuration: {e}")))?;
    let path = Config::config_file_path()
        .map_err(|e| PdfQaError::Config(format!("Failed to locate configuration: {e}")))?;

    println!("Configuration file: {}", path.display());
    println!("\n{rendered}");
    Ok(())
}

/// Load configuration, tagging failures as configuration errors.
pub fn load_config() -> Result<Config> {
    Config::load().map_err(|e| PdfQaError::Config(e.to_string()))
}
