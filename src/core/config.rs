//! Configuration management for Sidekick
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/sidekick/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::{Result, SidekickError};

/// Main configuration for Sidekick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Which LLM backend serves the worker and evaluator
    #[serde(default)]
    pub provider: ProviderType,
    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// OpenAI-compatible configuration
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Model configuration
    #[serde(default)]
    pub models: ModelConfig,
    /// Agent loop configuration
    #[serde(default)]
    pub agent: AgentConfig,
    /// Tool provider configuration
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Ollama,
    OpenAi,
}

impl Default for ProviderType {
    fn default() -> Self {
        match env::var("SIDEKICK_PROVIDER").ok().as_deref() {
            Some("ollama") => ProviderType::Ollama,
            Some("openai") => ProviderType::OpenAi,
            _ if env::var("OPENAI_API_KEY").is_ok() => ProviderType::OpenAi,
            _ => ProviderType::Ollama,
        }
    }
}

impl std::str::FromStr for ProviderType {
    type Err = SidekickError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(ProviderType::Ollama),
            "openai" => Ok(ProviderType::OpenAi),
            other => Err(SidekickError::config(format!("Unknown provider: {}", other))),
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::Ollama => write!(f, "ollama"),
            ProviderType::OpenAi => write!(f, "openai"),
        }
    }
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// OpenAI-compatible API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base URL, without the trailing endpoint
    pub base_url: String,
    /// Bearer token; read from the environment, never written to disk
    #[serde(skip_serializing, default = "openai_api_key_from_env")]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

fn openai_api_key_from_env() -> Option<String> {
    env::var("OPENAI_API_KEY").ok()
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model that answers and requests tools
    pub worker: String,
    /// Model that judges the worker's answers
    pub evaluator: String,
}

impl ModelConfig {
    /// Default models for a backend, overridable through the environment
    pub fn for_provider(provider: ProviderType) -> Self {
        let fallback = match provider {
            ProviderType::OpenAi => "gpt-4o-mini",
            ProviderType::Ollama => "qwen3:8b",
        };

        Self {
            worker: env::var("SIDEKICK_WORKER_MODEL").unwrap_or_else(|_| fallback.to_string()),
            evaluator: env::var("SIDEKICK_EVALUATOR_MODEL")
                .unwrap_or_else(|_| fallback.to_string()),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::for_provider(ProviderType::default())
    }
}

/// Agent loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum worker -> evaluator cycles per run
    /// Default: 100
    pub max_supersteps: usize,
    /// Wall-clock budget for a whole run, in seconds
    /// Default: 300
    pub run_timeout_secs: u64,
    /// Maximum consecutive tool rounds inside one superstep
    /// Default: 25
    pub max_tool_rounds: usize,
    /// Criterion used when the caller supplies none
    pub default_success_criteria: String,
    /// Check that both models exist on the backend during setup
    pub verify_models: bool,
    /// Whether to show debug output
    pub debug: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_supersteps: 100,
            run_timeout_secs: 300,
            max_tool_rounds: 25,
            default_success_criteria: "The answer should be clear and accurate".to_string(),
            verify_models: false,
            debug: env_flag("SIDEKICK_DEBUG", false),
        }
    }
}

impl AgentConfig {
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

/// Tool provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub browser: BrowserConfig,
    /// Root directory for the file management tools
    pub sandbox_dir: PathBuf,
    pub python: PythonConfig,
    pub search: SearchConfig,
    pub push: PushConfig,
    pub wikipedia: WikipediaConfig,
}

/// Browser automation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Whether browser tools are enabled
    pub enabled: bool,
    /// Session name for agent-browser
    pub session_name: String,
    /// Whether to run in headed mode (visible browser)
    pub headed: bool,
    /// Default timeout for browser operations in ms
    pub timeout_ms: u64,
}

/// Python execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    pub enabled: bool,
    /// Interpreter binary
    pub interpreter: String,
    pub timeout_secs: u64,
}

/// Web search configuration (Serper)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    #[serde(skip_serializing)]
    pub serper_api_key: Option<String>,
    /// Number of organic results to render
    pub max_results: usize,
}

/// Push notification configuration (Pushover)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    #[serde(skip_serializing)]
    pub token: Option<String>,
    #[serde(skip_serializing)]
    pub user: Option<String>,
}

/// Wikipedia lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikipediaConfig {
    pub enabled: bool,
    /// Wiki language subdomain, e.g. "en"
    pub language: String,
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        let provider = ProviderType::default();
        Self {
            provider,
            ollama: OllamaConfig::default(),
            openai: OpenAiConfig::default(),
            models: ModelConfig::for_provider(provider),
            agent: AgentConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            timeout_secs: 120,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: openai_api_key_from_env(),
            timeout_secs: 120,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: env_flag("SIDEKICK_BROWSER_ENABLED", true),
            session_name: env::var("SIDEKICK_BROWSER_SESSION")
                .unwrap_or_else(|_| "sidekick".to_string()),
            headed: env_flag("SIDEKICK_BROWSER_HEADED", false),
            timeout_ms: 30000,
        }
    }
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interpreter: env::var("SIDEKICK_PYTHON").unwrap_or_else(|_| "python3".to_string()),
            timeout_secs: 60,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            serper_api_key: env::var("SERPER_API_KEY").ok(),
            max_results: 5,
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            token: env::var("PUSHOVER_TOKEN").ok(),
            user: env::var("PUSHOVER_USER").ok(),
        }
    }
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: "en".to_string(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sidekick")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(SidekickError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| SidekickError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SidekickError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<PathBuf> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).map_err(|e| {
                SidekickError::config(format!("Failed to create config dir: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SidekickError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| SidekickError::config(format!("Failed to write config: {}", e)))?;

        Ok(config_path)
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// Switch backend, resetting the models to that backend's defaults
    pub fn set_provider(&mut self, provider: ProviderType) {
        if self.provider != provider {
            self.provider = provider;
            self.models = ModelConfig::for_provider(provider);
        }
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            browser: BrowserConfig::default(),
            sandbox_dir: PathBuf::from("sandbox"),
            python: PythonConfig::default(),
            search: SearchConfig::default(),
            push: PushConfig::default(),
            wikipedia: WikipediaConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_agent_bounds() {
        let config = Config::default();
        assert_eq!(config.agent.max_supersteps, 100);
        assert_eq!(config.agent.run_timeout(), Duration::from_secs(300));
        assert_eq!(config.agent.max_tool_rounds, 25);
        assert_eq!(config.tools.sandbox_dir, PathBuf::from("sandbox"));
    }

    #[test]
    fn test_ollama_url() {
        let mut config = Config::default();
        config.ollama.host = "localhost".to_string();
        config.ollama.port = 11434;
        assert_eq!(config.ollama_url(), "http://localhost:11434");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
            provider = "ollama"

            [models]
            worker = "llama3.1:8b"
            evaluator = "qwen3:8b"

            [agent]
            max_supersteps = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.provider, ProviderType::Ollama);
        assert_eq!(config.models.worker, "llama3.1:8b");
        assert_eq!(config.agent.max_supersteps, 7);
        assert_eq!(config.agent.run_timeout_secs, 300);
        assert_eq!(config.tools.wikipedia.language, "en");
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let mut config = Config::default();
        config.openai.api_key = Some("sk-secret".to_string());
        config.tools.push.token = Some("push-secret".to_string());

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(!toml_str.contains("sk-secret"));
        assert!(!toml_str.contains("push-secret"));
        assert!(toml_str.contains("max_supersteps"));
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("OpenAI".parse::<ProviderType>().unwrap(), ProviderType::OpenAi);
        assert!("claude".parse::<ProviderType>().is_err());
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("sidekick"));
    }
}
