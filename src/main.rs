use clap::{CommandFactory, Parser};
use pdf_qa::commands::{
    ask_question, clear_all, clear_conversation, load_config, show_config, show_document_info,
    show_history, show_status, upload_pdf,
};
use pdf_qa::{PdfQaError, Result};
use pdf_qa::session::Session;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdf-qa")]
#[command(about = "Ask natural-language questions about a PDF document")]
#[command(version)]
struct Cli {
    /// Path to a PDF file to upload and index
    #[arg(long, value_name = "FILE")]
    upload: Option<PathBuf>,

    /// Question to ask about the uploaded PDF
    #[arg(short, long)]
    question: Option<String>,

    /// Show information about the currently indexed document
    #[arg(long)]
    info: bool,

    /// Show the conversation history
    #[arg(long)]
    history: bool,

    /// Clear the conversation but keep the document
    #[arg(long)]
    clear: bool,

    /// Clear the document, index, and conversation
    #[arg(long)]
    clear_all: bool,

    /// Show the current configuration
    #[arg(long)]
    show_config: bool,

    /// Check connectivity to the embedding server and language model
    #[arg(long)]
    status: bool,

    /// Print source pages alongside answers
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn has_action(&self) -> bool {
        self.upload.is_some()
            || self.question.is_some()
            || self.info
            || self.history
            || self.clear
            || self.clear_all
            || self.show_config
            || self.status
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if !cli.has_action() {
        Cli::command().print_help()?;
        return Ok(());
    }

    if cli.show_config {
        show_config()?;
    }

    if cli.status {
        show_status()?;
    }

    if !(cli.upload.is_some()
        || cli.question.is_some()
        || cli.info
        || cli.history
        || cli.clear
        || cli.clear_all)
    {
        return Ok(());
    }

    let config = load_config()?;
    let mut session = Session::from_config(&config)
        .map_err(|e| PdfQaError::Config(format!("Failed to initialize session: {e}")))?;

    // Flags combine in one run since the session lives in memory: an upload
    // followed by a question operates on the just-indexed document.
    if let Some(path) = &cli.upload {
        upload_pdf(&mut session, path).await?;
    }

    if let Some(question) = &cli.question {
        ask_question(&mut session, question, cli.verbose).await?;
    }

    if cli.info {
        show_document_info(&session).await;
    }

    if cli.history {
        show_history(&session);
    }

    if cli.clear {
        clear_conversation(&mut session);
    }

    if cli.clear_all {
        clear_all(&mut session).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["pdf-qa", "--info"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn upload_and_question_combine() {
        let cli = Cli::try_parse_from(["pdf-qa", "--upload", "paper.pdf", "-q", "What is X?"])
            .expect("should parse successfully");
        assert_eq!(cli.upload.as_deref(), Some(std::path::Path::new("paper.pdf")));
        assert_eq!(cli.question.as_deref(), Some("What is X?"));
        assert!(!cli.verbose);
    }

    #[test]
    fn no_flags_means_no_action() {
        let cli = Cli::try_parse_from(["pdf-qa"]).expect("should parse successfully");
        assert!(!cli.has_action());
    }
}
