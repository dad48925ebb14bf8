//! Model capabilities used by the worker and evaluator steps
//!
//! The steps only see these two traits. The LLM-backed implementations
//! adapt an [`LLMProvider`] to them; tests script them directly.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::{Message, Result, SidekickError, ToolCall, ToolDefinition};
use crate::llm::{GenerateOptions, LLMProvider, OutputSchema};

/// What the worker model produced
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerReply {
    /// Plain assistant text: an answer or a clarifying question
    Answer(String),
    /// Tool calls to run before the worker is asked again
    ToolRequests { content: String, calls: Vec<ToolCall> },
}

impl WorkerReply {
    /// The assistant message this reply appends to the conversation
    pub fn into_message(self) -> Message {
        match self {
            WorkerReply::Answer(text) => Message::assistant(text),
            WorkerReply::ToolRequests { content, calls } => {
                Message::assistant_with_tools(content, calls)
            }
        }
    }
}

/// Structured judgement of the worker's latest answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EvaluatorVerdict {
    /// Feedback on the assistant's response
    pub feedback: String,
    /// Whether the success criteria have been met
    pub success_criteria_met: bool,
    /// True if more input is needed from the user, or clarifications, or the assistant is stuck
    pub user_input_needed: bool,
}

impl EvaluatorVerdict {
    /// Fail-closed verdict used when the evaluator could not judge
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            feedback: format!("Evaluator error: {}", reason),
            success_criteria_met: false,
            user_input_needed: true,
        }
    }
}

/// Produces the next assistant message
#[async_trait]
pub trait WorkerModel: Send + Sync {
    async fn respond(&self, messages: &[Message]) -> Result<WorkerReply>;
}

/// Judges an answer against the success criteria
#[async_trait]
pub trait EvaluatorModel: Send + Sync {
    async fn judge(&self, system: &str, prompt: &str) -> Result<EvaluatorVerdict>;
}

/// Worker backed by an LLM provider, with the tool definitions bound once
pub struct LlmWorker {
    provider: Arc<dyn LLMProvider>,
    model: String,
    tools: Vec<ToolDefinition>,
    options: Option<GenerateOptions>,
}

impl LlmWorker {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            tools: Vec::new(),
            options: None,
        }
    }

    /// Bind tool definitions; the model sees them on every call
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn bound_tools(&self) -> &[ToolDefinition] {
        &self.tools
    }
}

#[async_trait]
impl WorkerModel for LlmWorker {
    async fn respond(&self, messages: &[Message]) -> Result<WorkerReply> {
        let response = if self.tools.is_empty() {
            self.provider
                .chat(&self.model, messages, self.options.clone())
                .await
        } else {
            self.provider
                .chat_with_tools(&self.model, messages, &self.tools, self.options.clone())
                .await
        }
        .map_err(|e| SidekickError::capability(e.to_string()))?;

        if response.tool_calls.is_empty() {
            Ok(WorkerReply::Answer(response.content))
        } else {
            Ok(WorkerReply::ToolRequests {
                content: response.content,
                calls: response.tool_calls,
            })
        }
    }
}

/// Evaluator backed by an LLM provider using schema-constrained output
pub struct LlmEvaluator {
    provider: Arc<dyn LLMProvider>,
    model: String,
    schema: OutputSchema,
}

impl LlmEvaluator {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            schema: OutputSchema::of::<EvaluatorVerdict>("EvaluatorOutput"),
        }
    }
}

/// Parse a verdict out of model output, tolerating a fenced code block
pub fn parse_verdict(raw: &str) -> Result<EvaluatorVerdict> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body)
        .map_err(|e| SidekickError::capability(format!("malformed evaluator output: {}", e)))
}

#[async_trait]
impl EvaluatorModel for LlmEvaluator {
    async fn judge(&self, system: &str, prompt: &str) -> Result<EvaluatorVerdict> {
        let messages = [Message::system(system), Message::user(prompt)];
        let options = GenerateOptions {
            temperature: Some(0.0),
            ..GenerateOptions::default()
        };

        let response = self
            .provider
            .chat_structured(&self.model, &messages, &self.schema, Some(options))
            .await
            .map_err(|e| SidekickError::capability(e.to_string()))?;

        parse_verdict(&response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMResponse;
    use std::sync::Mutex;

    /// Provider that records which entry point was used
    struct Recording {
        calls: Mutex<Vec<&'static str>>,
        reply: LLMResponse,
    }

    impl Recording {
        fn new(content: &str, tool_calls: Vec<ToolCall>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reply: LLMResponse {
                    content: content.to_string(),
                    tool_calls,
                    usage: None,
                    model: "test".to_string(),
                },
            }
        }

        fn record(&self, what: &'static str) -> Result<LLMResponse> {
            self.calls.lock().unwrap().push(what);
            Ok(self.reply.clone())
        }
    }

    #[async_trait]
    impl LLMProvider for Recording {
        async fn chat(
            &self,
            _model: &str,
            _messages: &[Message],
            _options: Option<GenerateOptions>,
        ) -> Result<LLMResponse> {
            self.record("chat")
        }

        async fn chat_with_tools(
            &self,
            _model: &str,
            _messages: &[Message],
            _tools: &[ToolDefinition],
            _options: Option<GenerateOptions>,
        ) -> Result<LLMResponse> {
            self.record("chat_with_tools")
        }

        async fn chat_structured(
            &self,
            _model: &str,
            _messages: &[Message],
            _schema: &OutputSchema,
            _options: Option<GenerateOptions>,
        ) -> Result<LLMResponse> {
            self.record("chat_structured")
        }

        async fn is_model_available(&self, _model: &str) -> Result<bool> {
            Ok(true)
        }

        async fn list_models(&self) -> Result<Vec<String>> {
            Ok(vec!["test".to_string()])
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_worker_without_tools_uses_plain_chat() {
        let provider = Arc::new(Recording::new("4", vec![]));
        let worker = LlmWorker::new(provider.clone(), "m");

        let reply = worker.respond(&[Message::user("2+2")]).await.unwrap();
        assert_eq!(reply, WorkerReply::Answer("4".to_string()));
        assert_eq!(*provider.calls.lock().unwrap(), vec!["chat"]);
    }

    #[tokio::test]
    async fn test_worker_with_tools_returns_requests() {
        let call = ToolCall::new("c1", "search", serde_json::json!({"query": "rust"}));
        let provider = Arc::new(Recording::new("", vec![call.clone()]));
        let worker = LlmWorker::new(provider.clone(), "m").with_tools(vec![
            ToolDefinition::function("search", "search", serde_json::json!({})),
        ]);

        let reply = worker.respond(&[Message::user("look")]).await.unwrap();
        assert_eq!(
            reply,
            WorkerReply::ToolRequests {
                content: String::new(),
                calls: vec![call]
            }
        );
        assert_eq!(*provider.calls.lock().unwrap(), vec!["chat_with_tools"]);
    }

    #[tokio::test]
    async fn test_evaluator_parses_structured_reply() {
        let provider = Arc::new(Recording::new(
            r#"{"feedback": "Good", "success_criteria_met": true, "user_input_needed": false}"#,
            vec![],
        ));
        let evaluator = LlmEvaluator::new(provider.clone(), "m");

        let verdict = evaluator.judge("sys", "prompt").await.unwrap();
        assert!(verdict.success_criteria_met);
        assert_eq!(*provider.calls.lock().unwrap(), vec!["chat_structured"]);
    }

    #[tokio::test]
    async fn test_evaluator_rejects_malformed_reply() {
        let provider = Arc::new(Recording::new("looks fine to me", vec![]));
        let evaluator = LlmEvaluator::new(provider, "m");

        let err = evaluator.judge("sys", "prompt").await.unwrap_err();
        assert!(matches!(err, SidekickError::Capability(_)));
    }

    #[test]
    fn test_parse_verdict_fenced() {
        let verdict = parse_verdict(
            "```json\n{\"feedback\": \"x\", \"success_criteria_met\": false, \"user_input_needed\": true}\n```",
        )
        .unwrap();
        assert!(verdict.user_input_needed);
    }

    #[test]
    fn test_verdict_schema_lists_fields() {
        let schema = OutputSchema::of::<EvaluatorVerdict>("EvaluatorOutput");
        let text = schema.schema.to_string();
        assert!(text.contains("success_criteria_met"));
        assert!(text.contains("user_input_needed"));
    }
}
