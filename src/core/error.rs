//! Custom error types for Sidekick
//!
//! Provides a unified error handling system across all modules.

use std::time::Duration;

use thiserror::Error;

/// Main error type for Sidekick operations
#[derive(Error, Debug)]
pub enum SidekickError {
    /// LLM backend connection or API errors
    #[error("Provider error: {0}")]
    Provider(String),

    /// Model not available on the backend
    #[error("Model '{0}' is not available on the configured provider")]
    ModelNotFound(String),

    /// Worker or evaluator model call failed outright
    #[error("Capability error: {0}")]
    Capability(String),

    /// A tool provider could not initialize
    #[error("Tool provider '{provider}' failed to initialize: {reason}")]
    ProviderInit { provider: String, reason: String },

    /// A tool call raised
    #[error("Tool '{tool}' failed: {reason}")]
    ToolInvocation { tool: String, reason: String },

    /// Browser automation errors
    #[error("Browser error: {0}")]
    Browser(String),

    /// agent-browser not installed
    #[error("agent-browser not found. Install with: npm install -g agent-browser && agent-browser install")]
    BrowserNotFound,

    /// Too many worker -> evaluator cycles in one run
    #[error("Run exceeded the limit of {0} supersteps")]
    SuperstepLimit(usize),

    /// Too many consecutive tool rounds inside one superstep
    #[error("Run exceeded the limit of {0} tool rounds in a single superstep")]
    ToolRoundLimit(usize),

    /// Run exceeded its wall-clock budget
    #[error("Run timed out after {0:?}")]
    Timeout(Duration),

    /// Agent construction failed
    #[error("Setup error: {0}")]
    Setup(String),

    /// Agent used before a successful setup
    #[error("Sidekick is not initialized; call setup() first")]
    NotReady,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Sidekick operations
pub type Result<T> = std::result::Result<T, SidekickError>;

impl SidekickError {
    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a capability error
    pub fn capability(msg: impl Into<String>) -> Self {
        Self::Capability(msg.into())
    }

    /// Create a provider initialization error
    pub fn provider_init(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProviderInit {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Create a tool invocation error
    pub fn tool(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ToolInvocation {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Create a browser error
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// Create a setup error
    pub fn setup(msg: impl Into<String>) -> Self {
        Self::Setup(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error is one of the run bounds (iteration caps or timeout)
    pub fn is_bound_exceeded(&self) -> bool {
        matches!(
            self,
            Self::SuperstepLimit(_) | Self::ToolRoundLimit(_) | Self::Timeout(_)
        )
    }
}
