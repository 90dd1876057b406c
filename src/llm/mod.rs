//! Language-model capability.
//!
//! A narrow interface over chat-completion providers that support tool
//! calling. The provider is picked at construction time from config; the
//! agent loop only ever sees the [`ChatModel`] trait.

pub mod ollama;
pub mod openai;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::config::{Config, LlmProvider};

pub use ollama::OllamaChat;
pub use openai::OpenAiChat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

impl ChatRole {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// JSON object of arguments as declared in the tool's schema
    pub arguments: Value,
}

/// A named-function descriptor declared to the model: name, human-readable
/// description, and a JSON schema for the arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// One message in a model conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Tool invocations requested by an assistant message
    pub tool_calls: Vec<ToolCall>,
    /// Set on tool-role messages to tie the result to its invocation
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    #[inline]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    #[inline]
    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate the next message given the conversation so far and the tools
    /// the model may invoke.
    async fn generate(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatMessage>;
}

/// Build the configured chat model.
#[inline]
pub fn build_chat_model(config: &Config) -> Result<Arc<dyn ChatModel>> {
    Ok(match config.llm.provider {
        LlmProvider::OpenAi => Arc::new(OpenAiChat::new(
            &config.llm.model,
            &config.llm_api_key(),
            config.llm.temperature,
        )?),
        LlmProvider::Ollama => Arc::new(OllamaChat::new(&config.llm)?),
    })
}
