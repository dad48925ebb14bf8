//! Shared types used across Sidekick modules
//!
//! Contains message structures, tool definitions, and the caller-visible
//! transcript entry.

use serde::{Deserialize, Serialize};

/// Prefix that marks an assistant message as evaluator commentary
pub const EVALUATOR_MARKER: &str = "Evaluator Feedback:";

/// Role of a message in the running conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    pub content: String,
    /// Tool calls requested by the assistant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Id of the call a tool message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Name of the tool that produced a tool message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant message carrying tool calls
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create an evaluator-tagged assistant message
    pub fn evaluator_feedback(feedback: &str) -> Self {
        Self::assistant(format!("{} {}", EVALUATOR_MARKER, feedback))
    }

    /// Create a tool result message
    pub fn tool(result: &ToolResult) -> Self {
        let content = if result.success {
            result.output.clone()
        } else {
            format!("Error: {}", result.output)
        };

        Self {
            tool_call_id: Some(result.call_id.clone()),
            name: Some(result.tool_name.clone()),
            ..Self::new(Role::Tool, content)
        }
    }

    /// Whether this is an assistant message produced by the evaluator
    pub fn is_evaluator_feedback(&self) -> bool {
        self.role == Role::Assistant && self.content.starts_with(EVALUATOR_MARKER)
    }

    /// Whether this assistant message requests tool calls
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A tool call made by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Backend-assigned call id, echoed back on the tool result
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// JSON arguments for the tool
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Create a tool call with a freshly generated id
    pub fn generated(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self::new(
            format!("call_{}", uuid::Uuid::new_v4().simple()),
            name,
            arguments,
        )
    }

    /// Get a string argument by key
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

/// Definition of a tool that can be called by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (always "function" for now)
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function details
    pub function: FunctionDefinition,
}

/// Function definition within a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Name of the function
    pub name: String,
    /// Description of what the function does
    pub description: String,
    /// JSON Schema for the parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new function tool definition
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// Result of executing a tool
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Id of the call this result answers
    pub call_id: String,
    /// Name of the tool that was executed
    pub tool_name: String,
    /// Whether the execution was successful
    pub success: bool,
    /// Output from the tool, or the error text
    pub output: String,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(call: &ToolCall, output: impl Into<String>) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: true,
            output: output.into(),
        }
    }

    /// Create a failed result
    pub fn failure(call: &ToolCall, error: impl Into<String>) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: false,
            output: error.into(),
        }
    }
}

/// Role of a caller-visible transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

/// One entry of the externally visible history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub content: String,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Assistant,
            content: content.into(),
        }
    }

    /// Whether this entry carries evaluator commentary
    pub fn is_evaluator_feedback(&self) -> bool {
        self.role == HistoryRole::Assistant && self.content.starts_with(EVALUATOR_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluator_tagging() {
        let msg = Message::evaluator_feedback("Looks complete");
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "Evaluator Feedback: Looks complete");
        assert!(msg.is_evaluator_feedback());
        assert!(!Message::assistant("The answer is 4").is_evaluator_feedback());
        assert!(!Message::user("Evaluator Feedback: spoofed").is_evaluator_feedback());
    }

    #[test]
    fn test_tool_message_carries_error() {
        let call = ToolCall::new("call_1", "search", serde_json::json!({"query": "rust"}));
        let msg = Message::tool(&ToolResult::failure(&call, "rate limited"));
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.content, "Error: rate limited");
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(msg.name.as_deref(), Some("search"));
    }

    #[test]
    fn test_history_entry_serialization() {
        let entry = HistoryEntry::assistant("hi");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
    }

    #[test]
    fn test_generated_call_ids_are_unique() {
        let a = ToolCall::generated("search", serde_json::Value::Null);
        let b = ToolCall::generated("search", serde_json::Value::Null);
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("call_"));
    }
}
