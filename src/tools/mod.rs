//! Tools module - invocable tools and the providers that supply them
//!
//! Every tool is consumed through the same [`Tool`] interface. Tools are
//! grouped under a [`ToolProvider`], which owns whatever external resource
//! its tools share (a browser session, a sandbox directory, API credentials)
//! and releases it on cleanup.

pub mod browser;
pub mod files;
pub mod notify;
pub mod python;
pub mod registry;
pub mod web;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{Result, ToolDefinition};

pub use registry::ToolRegistry;

/// Output of a successful tool call, as shown to the worker
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A named, callable capability exposed to the worker
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within the registry
    fn name(&self) -> &str;

    /// Human-readable description used in prompting
    fn description(&self) -> &str;

    /// JSON Schema of the arguments object
    fn parameters(&self) -> serde_json::Value;

    /// Invoke the tool. Errors are reported to the worker, never raised
    /// past the tool step.
    async fn call(&self, arguments: &serde_json::Value) -> Result<ToolOutput>;

    /// Definition handed to the worker model
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(self.name(), self.description(), self.parameters())
    }
}

/// Supplies a group of tools and owns their shared resources
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &str;

    /// Initialize and return the provider's tools
    async fn tools(&self) -> Result<Vec<Arc<dyn Tool>>>;

    /// Release acquired resources. Must be idempotent and must not fail.
    async fn cleanup(&self) {}
}

/// Read a required string argument
pub(crate) fn required_str<'a>(
    tool: &str,
    arguments: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            crate::core::SidekickError::tool(tool, format!("missing string argument '{}'", key))
        })
}

/// Read an optional string argument
pub(crate) fn optional_str<'a>(arguments: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    arguments.get(key).and_then(|v| v.as_str())
}
