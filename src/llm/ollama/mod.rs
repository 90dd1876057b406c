
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::LlmConfig;
use crate::http::{DEFAULT_RETRY_ATTEMPTS, agent_with_timeout, request_with_retry};
use crate::llm::{ChatMessage, ChatModel, ToolCall, ToolDefinition};

/// Local models can be slow to produce a full completion.
const CHAT_TIMEOUT_SECONDS: u64 = 120;

/// Chat client for an Ollama server's `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaChat {
    base_url: Url,
    model: String,
    temperature: f32,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    function: WireFunctionCall,
}

#[derive(Debug, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// Ollama sends arguments as a JSON object, not an encoded string
    arguments: Value,
}

impl OllamaChat {
    #[inline]
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let base_url = config
            .ollama_url()
            .context("Failed to generate Ollama URL from config")?;

        Ok(Self {
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            agent: agent_with_timeout(Duration::from_secs(CHAT_TIMEOUT_SECONDS)),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    fn request_body(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            stream: false,
            messages: messages
                .iter()
                .map(|message| WireMessage {
                    role: message.role.as_str(),
                    content: message.content.clone(),
                })
                .collect(),
            tools: tools
                .iter()
                .map(|tool| WireTool {
                    kind: "function",
                    function: WireFunction {
                        name: &tool.name,
                        description: &tool.description,
                        parameters: &tool.parameters,
                    },
                })
                .collect(),
            options: ChatOptions {
                temperature: self.temperature,
            },
        };

        serde_json::to_string(&request).context("Failed to serialize chat request")
    }
}

/// Ollama does not assign call ids, so synthesize stable ones per response.
fn from_wire_tool_calls(calls: Vec<WireToolCall>) -> Vec<ToolCall> {
    calls
        .into_iter()
        .enumerate()
        .map(|(idx, call)| ToolCall {
            id: format!("call_{idx}"),
            name: call.function.name,
            arguments: call.function.arguments,
        })
        .collect()
}

#[async_trait]
impl ChatModel for OllamaChat {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatMessage> {
        let url = self
            .base_url
            .join("/api/chat")
            .context("Failed to build chat URL")?;

        let request_json = self.request_body(messages, tools)?;

        debug!(
            "Requesting chat completion from {} ({} messages)",
            url,
            messages.len()
        );

        let response_text = request_with_retry(self.retry_attempts, || {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
        .context("Failed to request chat completion")?;

        let response: ChatResponse =
            serde_json::from_str(&response_text).context("Failed to parse chat response")?;

        let mut message = ChatMessage::assistant(response.message.content);
        message.tool_calls = from_wire_tool_calls(response.message.tool_calls.unwrap_or_default());

        debug!("Model returned {} tool calls", message.tool_calls.len());

        Ok(message)
    }
}
