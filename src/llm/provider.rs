//! LLM provider factory
//!
//! Picks the backend named in the configuration.

use std::sync::Arc;

use crate::core::config::{Config, ProviderType};
use crate::core::Result;
use crate::llm::traits::LLMProvider;
use crate::llm::{OllamaClient, OpenAiClient};

/// Create a new LLM provider based on configuration
pub fn create_provider(config: &Config) -> Result<Arc<dyn LLMProvider>> {
    let provider: Arc<dyn LLMProvider> = match config.provider {
        ProviderType::Ollama => Arc::new(OllamaClient::from_config(config)?),
        ProviderType::OpenAi => Arc::new(OpenAiClient::from_config(config)?),
    };
    tracing::debug!(provider = provider.name(), "LLM provider created");
    Ok(provider)
}
