//! Tool registry - collects tools from providers and dispatches calls
//!
//! Central hub for registering tools and routing tool calls to handlers.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;

use crate::core::{ToolCall, ToolDefinition, ToolResult};
use crate::tools::{Tool, ToolProvider};

/// Registry of available tools
#[derive(Default, Clone)]
pub struct ToolRegistry {
    /// Tools in registration order
    tools: Vec<Arc<dyn Tool>>,
    /// Position of each tool by name
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect tools from every provider.
    ///
    /// Providers initialize concurrently and independently. A provider that
    /// fails contributes no tools; the others are unaffected.
    pub async fn collect(providers: &[Arc<dyn ToolProvider>]) -> Self {
        let results = join_all(providers.iter().map(|provider| async move {
            (provider.name().to_string(), provider.tools().await)
        }))
        .await;

        let mut registry = Self::new();
        for (provider, result) in results {
            match result {
                Ok(tools) => {
                    tracing::info!(provider = %provider, tools = tools.len(), "tool provider ready");
                    for tool in tools {
                        registry.register(tool);
                    }
                }
                Err(e) => {
                    tracing::warn!(provider = %provider, error = %e, "tool provider unavailable, continuing without it");
                }
            }
        }

        if registry.is_empty() {
            tracing::warn!("no tools were initialized; the worker will answer without tools");
        } else {
            tracing::info!(total = registry.len(), "tool registry built");
        }

        registry
    }

    /// Register a tool. Returns false if the name is already taken.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> bool {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            tracing::warn!(tool = %name, "duplicate tool name ignored");
            return false;
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        true
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Definitions of all tools, for binding to the worker model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Execute a tool call.
    ///
    /// Unknown tools and tool failures become failed results; this never
    /// returns an error.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.get(&call.name) else {
            tracing::warn!(tool = %call.name, "worker requested an unknown tool");
            return ToolResult::failure(call, format!("Unknown tool: {}", call.name));
        };

        match tool.call(&call.arguments).await {
            Ok(output) => ToolResult::success(call, output.text),
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "tool call failed");
                ToolResult::failure(call, e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Result, SidekickError};
    use crate::tools::ToolOutput;
    use async_trait::async_trait;

    struct Echo(&'static str);

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "Echo the text argument"
        }

        fn parameters(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }

        async fn call(&self, arguments: &serde_json::Value) -> Result<ToolOutput> {
            match arguments.get("text").and_then(|v| v.as_str()) {
                Some(text) => Ok(ToolOutput::text(text)),
                None => Err(SidekickError::tool(self.0, "no text")),
            }
        }
    }

    struct Provider {
        name: &'static str,
        fail: bool,
        tools: Vec<&'static str>,
    }

    #[async_trait]
    impl ToolProvider for Provider {
        fn name(&self) -> &str {
            self.name
        }

        async fn tools(&self) -> Result<Vec<Arc<dyn Tool>>> {
            if self.fail {
                return Err(SidekickError::provider_init(self.name, "not installed"));
            }
            Ok(self
                .tools
                .iter()
                .map(|&n| Arc::new(Echo(n)) as Arc<dyn Tool>)
                .collect())
        }
    }

    #[tokio::test]
    async fn test_failing_provider_contributes_nothing() {
        let providers: Vec<Arc<dyn ToolProvider>> = vec![
            Arc::new(Provider { name: "browser", fail: true, tools: vec!["navigate"] }),
            Arc::new(Provider { name: "misc", fail: false, tools: vec!["echo", "shout"] }),
        ];

        let registry = ToolRegistry::collect(&providers).await;
        assert_eq!(registry.names(), vec!["echo", "shout"]);
        assert!(registry.get("navigate").is_none());
    }

    #[tokio::test]
    async fn test_all_providers_failing_yields_empty_registry() {
        let providers: Vec<Arc<dyn ToolProvider>> = vec![
            Arc::new(Provider { name: "a", fail: true, tools: vec![] }),
            Arc::new(Provider { name: "b", fail: true, tools: vec![] }),
        ];
        assert!(ToolRegistry::collect(&providers).await.is_empty());
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut registry = ToolRegistry::new();
        assert!(registry.register(Arc::new(Echo("echo"))));
        assert!(!registry.register(Arc::new(Echo("echo"))));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.definitions()[0].function.name, "echo");
    }

    #[tokio::test]
    async fn test_execute_never_raises() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo("echo")));

        let ok = registry
            .execute(&ToolCall::new("1", "echo", serde_json::json!({"text": "hi"})))
            .await;
        assert!(ok.success);
        assert_eq!(ok.output, "hi");

        let failed = registry
            .execute(&ToolCall::new("2", "echo", serde_json::json!({})))
            .await;
        assert!(!failed.success);
        assert!(failed.output.contains("no text"));

        let unknown = registry
            .execute(&ToolCall::new("3", "teleport", serde_json::json!({})))
            .await;
        assert!(!unknown.success);
        assert_eq!(unknown.output, "Unknown tool: teleport");
        assert_eq!(unknown.call_id, "3");
    }

    #[tokio::test]
    async fn test_output_text_is_the_tool_message() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo("echo")));

        let call = ToolCall::new("7", "echo", serde_json::json!({"text": "Paris"}));
        let message = crate::core::Message::tool(&registry.execute(&call).await);
        assert_eq!(message.content, "Paris");
        assert_eq!(message.tool_call_id.as_deref(), Some("7"));
    }
}
