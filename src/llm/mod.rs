//! LLM module - Language Model integrations
//!
//! Provides the backend abstraction used by the worker and evaluator, with
//! Ollama and OpenAI-compatible implementations.

pub mod ollama;
pub mod openai;
pub mod provider;
pub mod traits;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use provider::create_provider;
pub use traits::{GenerateOptions, LLMProvider, LLMResponse, OutputSchema, TokenUsage};
