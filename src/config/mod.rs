// Configuration management module
// Handles TOML configuration for the LLM provider, embedding server, and chunking

pub mod settings;

pub use settings::{ChunkingConfig, Config, ConfigError, EmbeddingConfig, LlmConfig, LlmProvider};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
