//! LLM Provider trait for abstracting different backends
//!
//! Enables swapping between Ollama and OpenAI-compatible servers.

use async_trait::async_trait;

use crate::core::{Message, Result, ToolCall, ToolDefinition};

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub struct LLMResponse {
    /// Text content of the response
    pub content: String,
    /// Any tool calls the model wants to make
    pub tool_calls: Vec<ToolCall>,
    /// Token usage information
    pub usage: Option<TokenUsage>,
    /// Model that generated the response
    pub model: String,
}

/// Token usage information
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Options for LLM generation
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Stop sequences
    pub stop: Option<Vec<String>>,
}

/// JSON schema a structured response must conform to
#[derive(Debug, Clone)]
pub struct OutputSchema {
    /// Schema name, reported to backends that want one
    pub name: String,
    /// JSON Schema document
    pub schema: serde_json::Value,
}

impl OutputSchema {
    /// Derive the schema of a Rust type
    pub fn of<T: schemars::JsonSchema>(name: impl Into<String>) -> Self {
        let root = schemars::schema_for!(T);
        Self {
            name: name.into(),
            schema: serde_json::to_value(root).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// Trait for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a response from messages
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse>;

    /// Generate a response with tool definitions
    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse>;

    /// Generate a response whose content is JSON conforming to `schema`
    async fn chat_structured(
        &self,
        model: &str,
        messages: &[Message],
        schema: &OutputSchema,
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse>;

    /// Check if a model is available
    async fn is_model_available(&self, model: &str) -> Result<bool>;

    /// List available models
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Get the provider name
    fn name(&self) -> &str;
}
