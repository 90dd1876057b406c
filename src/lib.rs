use thiserror::Error;

pub type Result<T> = std::result::Result<T, PdfQaError>;

#[derive(Error, Debug)]
pub enum PdfQaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("PDF processing error: {0}")]
    Pdf(String),

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod agent;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod document;
pub mod embeddings;
pub mod http;
pub mod index;
pub mod llm;
pub mod pdf;
pub mod session;
