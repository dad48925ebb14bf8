//! OpenAI-compatible provider
//!
//! Talks to `/chat/completions` on OpenAI or any server exposing the same
//! API (vLLM, LM Studio, OpenRouter, ...).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::{Config, Message, Result, Role, SidekickError, ToolCall, ToolDefinition};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, OutputSchema, TokenUsage};

/// OpenAI-compatible API client
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, messages: &[Message], options: Option<GenerateOptions>) -> Self {
        let options = options.unwrap_or_default();
        Self {
            model,
            messages: messages.iter().map(OpenAiClient::to_api_message).collect(),
            tools: None,
            response_format: None,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stop: options.stop,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: ApiFunction,
}

fn function_type() -> String {
    "function".to_string()
}

/// Arguments travel as a JSON-encoded string
#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    id: String,
}

impl OpenAiClient {
    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.openai.timeout_secs))
            .build()
            .map_err(|e| SidekickError::provider(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.openai.base_url.trim_end_matches('/').to_string(),
            api_key: config.openai.api_key.clone(),
        })
    }

    fn to_api_message(msg: &Message) -> ApiMessage {
        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(
                msg.tool_calls
                    .iter()
                    .map(|tc| ApiToolCall {
                        id: tc.id.clone(),
                        call_type: function_type(),
                        function: ApiFunction {
                            name: tc.name.clone(),
                            arguments: tc.arguments.to_string(),
                        },
                    })
                    .collect(),
            )
        };

        // An assistant turn that only carries tool calls has null content
        let content = if msg.role == Role::Assistant && msg.content.is_empty() && tool_calls.is_some()
        {
            None
        } else {
            Some(msg.content.clone())
        };

        ApiMessage {
            role: msg.role.as_str().to_string(),
            content,
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        }
    }

    fn to_llm_response(response: ChatResponse) -> Result<LLMResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SidekickError::provider("Response contained no choices"))?;

        let mut tool_calls = Vec::new();
        for call in choice.message.tool_calls.unwrap_or_default() {
            let arguments = if call.function.arguments.trim().is_empty() {
                serde_json::Value::Object(Default::default())
            } else {
                serde_json::from_str(&call.function.arguments).map_err(|e| {
                    SidekickError::provider(format!(
                        "Malformed arguments for tool '{}': {}",
                        call.function.name, e
                    ))
                })?
            };
            tool_calls.push(ToolCall::new(call.id, call.function.name, arguments));
        }

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            usage: response
                .usage
                .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
            model: response.model,
        })
    }

    async fn send_chat(&self, request: &ChatRequest<'_>) -> Result<LLMResponse> {
        tracing::debug!(
            model = request.model,
            messages = request.messages.len(),
            tools = request.tools.map(|t| t.len()).unwrap_or(0),
            structured = request.response_format.is_some(),
            "openai chat request"
        );

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(request);

        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 && error_text.contains("model") {
                return Err(SidekickError::ModelNotFound(request.model.to_string()));
            }

            return Err(SidekickError::provider(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let response_text = response.text().await?;
        tracing::trace!(body = %response_text, "openai chat response");

        let chat_response: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            SidekickError::provider(format!("Failed to parse OpenAI response: {}", e))
        })?;

        Self::to_llm_response(chat_response)
    }
}

#[async_trait]
impl LLMProvider for OpenAiClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let request = ChatRequest::new(model, messages, options);
        self.send_chat(&request).await
    }

    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let mut request = ChatRequest::new(model, messages, options);
        request.tools = Some(tools);
        self.send_chat(&request).await
    }

    async fn chat_structured(
        &self,
        model: &str,
        messages: &[Message],
        schema: &OutputSchema,
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let mut request = ChatRequest::new(model, messages, options);
        request.response_format = Some(serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "schema": schema.schema,
            }
        }));
        self.send_chat(&request).await
    }

    async fn is_model_available(&self, model: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| m == model))
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let mut builder = self.client.get(format!("{}/models", self.base_url));
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(SidekickError::provider(format!(
                "Failed to list models ({})",
                response.status()
            )));
        }

        let models: ModelsResponse = response.json().await?;
        Ok(models.data.into_iter().map(|m| m.id).collect())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
