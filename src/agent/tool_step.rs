//! Tool execution step - runs the worker's tool requests

use crate::core::{Message, ToolCall};
use crate::tools::ToolRegistry;

/// Runs tool requests against the registry
pub struct ToolExecutionStep {
    registry: ToolRegistry,
}

impl ToolExecutionStep {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Whether routing to this step is possible at all
    pub fn has_tools(&self) -> bool {
        !self.registry.is_empty()
    }

    /// Execute requests in order and return one tool message per request.
    ///
    /// Requests run sequentially so results line up with the order the
    /// worker issued them. Failures are returned as error results.
    pub async fn execute(&self, requests: &[ToolCall]) -> Vec<Message> {
        let mut results = Vec::with_capacity(requests.len());

        for call in requests {
            tracing::debug!(tool = %call.name, id = %call.id, "executing tool");
            let result = self.registry.execute(call).await;
            if result.success {
                tracing::info!(tool = %call.name, "tool succeeded");
            }
            results.push(Message::tool(&result));
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Result, Role, SidekickError};
    use crate::tools::{Tool, ToolOutput};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercase text"
        }

        fn parameters(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }

        async fn call(&self, arguments: &serde_json::Value) -> Result<ToolOutput> {
            arguments
                .get("text")
                .and_then(|v| v.as_str())
                .map(|t| ToolOutput::text(t.to_uppercase()))
                .ok_or_else(|| SidekickError::tool("upper", "text is required"))
        }
    }

    #[tokio::test]
    async fn test_results_follow_request_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Upper));
        let step = ToolExecutionStep::new(registry);

        let requests = vec![
            ToolCall::new("a", "upper", serde_json::json!({"text": "one"})),
            ToolCall::new("b", "missing", serde_json::json!({})),
            ToolCall::new("c", "upper", serde_json::json!({})),
        ];
        let results = step.execute(&requests).await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|m| m.role == Role::Tool));
        assert_eq!(results[0].content, "ONE");
        assert_eq!(results[0].tool_call_id.as_deref(), Some("a"));
        assert_eq!(results[1].content, "Error: Unknown tool: missing");
        assert!(results[2].content.starts_with("Error: "));
        assert!(results[2].content.contains("text is required"));
    }

    #[test]
    fn test_empty_registry_has_no_tools() {
        assert!(!ToolExecutionStep::new(ToolRegistry::new()).has_tools());
    }
}
