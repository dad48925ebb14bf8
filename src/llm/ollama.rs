//! Ollama client implementation
//!
//! Async HTTP client for the Ollama chat API with tool calling and
//! schema-constrained output.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::{Config, Message, Result, SidekickError, ToolCall, ToolDefinition};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, OutputSchema, TokenUsage};

/// Ollama API client
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

/// Ollama chat request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    stream: bool,
}

/// Ollama message format
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

/// Ollama tool call format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

/// Ollama function in tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaFunction {
    name: String,
    arguments: serde_json::Value,
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

impl From<GenerateOptions> for OllamaOptions {
    fn from(opts: GenerateOptions) -> Self {
        Self {
            temperature: opts.temperature,
            num_predict: opts.max_tokens,
            stop: opts.stop,
        }
    }
}

/// Ollama chat response (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: OllamaMessage,
    model: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(
            config.ollama_url(),
            Duration::from_secs(config.ollama.timeout_secs),
        )
    }

    /// Create a client with custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::build(base_url.into(), Duration::from_secs(120))
    }

    fn build(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SidekickError::provider(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Convert internal Message to Ollama format
    fn to_ollama_message(msg: &Message) -> OllamaMessage {
        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(
                msg.tool_calls
                    .iter()
                    .map(|tc| OllamaToolCall {
                        function: OllamaFunction {
                            name: tc.name.clone(),
                            arguments: tc.arguments.clone(),
                        },
                    })
                    .collect(),
            )
        };

        OllamaMessage {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
            tool_calls,
            tool_name: msg.name.clone(),
        }
    }

    /// Convert Ollama response to LLMResponse
    fn to_llm_response(response: ChatResponse) -> LLMResponse {
        // Ollama does not assign call ids
        let tool_calls = response
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall::generated(tc.function.name, tc.function.arguments))
            .collect();

        let usage = match (response.prompt_eval_count, response.eval_count) {
            (Some(prompt), Some(completion)) => Some(TokenUsage::new(prompt, completion)),
            _ => None,
        };

        LLMResponse {
            content: response.message.content,
            tool_calls,
            usage,
            model: response.model,
        }
    }

    /// POST a chat request and decode the reply
    async fn send_chat(&self, request: &ChatRequest<'_>) -> Result<LLMResponse> {
        tracing::debug!(
            model = request.model,
            messages = request.messages.len(),
            tools = request.tools.map(|t| t.len()).unwrap_or(0),
            structured = request.format.is_some(),
            "ollama chat request"
        );

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    SidekickError::provider(format!(
                        "Cannot connect to Ollama at {}. Is it running?",
                        self.base_url
                    ))
                } else {
                    SidekickError::from(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 && error_text.contains("not found") {
                return Err(SidekickError::ModelNotFound(request.model.to_string()));
            }

            return Err(SidekickError::provider(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let response_text = response.text().await?;
        tracing::trace!(body = %response_text, "ollama chat response");

        let chat_response: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            SidekickError::provider(format!("Failed to parse Ollama response: {}", e))
        })?;

        Ok(Self::to_llm_response(chat_response))
    }
}

#[async_trait]
impl LLMProvider for OllamaClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let request = ChatRequest {
            model,
            messages: messages.iter().map(Self::to_ollama_message).collect(),
            tools: None,
            format: None,
            options: options.map(OllamaOptions::from),
            stream: false,
        };

        self.send_chat(&request).await
    }

    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let request = ChatRequest {
            model,
            messages: messages.iter().map(Self::to_ollama_message).collect(),
            tools: Some(tools),
            format: None,
            options: options.map(OllamaOptions::from),
            stream: false,
        };

        self.send_chat(&request).await
    }

    async fn chat_structured(
        &self,
        model: &str,
        messages: &[Message],
        schema: &OutputSchema,
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let request = ChatRequest {
            model,
            messages: messages.iter().map(Self::to_ollama_message).collect(),
            tools: None,
            format: Some(&schema.schema),
            options: options.map(OllamaOptions::from),
            stream: false,
        };

        self.send_chat(&request).await
    }

    async fn is_model_available(&self, model: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models
            .iter()
            .any(|m| m == model || m.split(':').next() == model.split(':').next()))
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    SidekickError::provider(format!(
                        "Cannot connect to Ollama at {}. Is it running?",
                        self.base_url
                    ))
                } else {
                    SidekickError::from(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(SidekickError::provider("Failed to list Ollama models"));
        }

        let models_response: ModelsResponse = response.json().await?;
        Ok(models_response.models.into_iter().map(|m| m.name).collect())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToolResult;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::with_base_url("http://localhost:11434").unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_message_conversion() {
        let msg = Message::user("Hello");
        let ollama_msg = OllamaClient::to_ollama_message(&msg);
        assert_eq!(ollama_msg.role, "user");
        assert_eq!(ollama_msg.content, "Hello");
        assert!(ollama_msg.tool_calls.is_none());
    }

    #[test]
    fn test_tool_message_conversion() {
        let call = ToolCall::new("call_9", "search", serde_json::json!({"query": "rust"}));
        let assistant = Message::assistant_with_tools("", vec![call.clone()]);
        let converted = OllamaClient::to_ollama_message(&assistant);
        let calls = converted.tool_calls.unwrap();
        assert_eq!(calls[0].function.name, "search");

        let tool = Message::tool(&ToolResult::success(&call, "3 results"));
        let converted = OllamaClient::to_ollama_message(&tool);
        assert_eq!(converted.role, "tool");
        assert_eq!(converted.tool_name.as_deref(), Some("search"));
    }

    #[test]
    fn test_response_assigns_call_ids() {
        let raw = r#"{
            "model": "qwen3:8b",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{"function": {"name": "search", "arguments": {"query": "x"}}}]
            },
            "prompt_eval_count": 10,
            "eval_count": 5
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let response = OllamaClient::to_llm_response(parsed);
        assert_eq!(response.tool_calls.len(), 1);
        assert!(!response.tool_calls[0].id.is_empty());
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }
}
