//! Browser tools
//!
//! Each tool is a thin adapter from tool arguments to agent-browser
//! commands run through the shared session.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::Result;
use crate::tools::browser::BrowserSession;
use crate::tools::{required_str, Tool, ToolOutput};

/// Browser operations exposed as tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserAction {
    Navigate,
    Snapshot,
    Click,
    Fill,
    GetText,
    Press,
    Screenshot,
}

impl BrowserAction {
    pub const ALL: [BrowserAction; 7] = [
        BrowserAction::Navigate,
        BrowserAction::Snapshot,
        BrowserAction::Click,
        BrowserAction::Fill,
        BrowserAction::GetText,
        BrowserAction::Press,
        BrowserAction::Screenshot,
    ];

    fn name(self) -> &'static str {
        match self {
            BrowserAction::Navigate => "browser_navigate",
            BrowserAction::Snapshot => "browser_snapshot",
            BrowserAction::Click => "browser_click",
            BrowserAction::Fill => "browser_fill",
            BrowserAction::GetText => "browser_get_text",
            BrowserAction::Press => "browser_press",
            BrowserAction::Screenshot => "browser_screenshot",
        }
    }

    fn description(self) -> &'static str {
        match self {
            BrowserAction::Navigate => {
                "Navigate the browser to a URL and return the page's interactive elements with their refs"
            }
            BrowserAction::Snapshot => {
                "Get the current page accessibility tree with element refs (e.g. e5)"
            }
            BrowserAction::Click => "Click an element by its ref from the latest snapshot",
            BrowserAction::Fill => "Type text into an input element by its ref",
            BrowserAction::GetText => "Get the text content of an element by its ref",
            BrowserAction::Press => "Press a keyboard key, e.g. Enter or Tab",
            BrowserAction::Screenshot => "Take a screenshot of the current page and save it to a file",
        }
    }

    fn parameters(self) -> serde_json::Value {
        let element_ref = serde_json::json!({
            "type": "string",
            "description": "Element ref from the snapshot, e.g. e12"
        });

        match self {
            BrowserAction::Navigate => serde_json::json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string", "description": "The URL to navigate to"}
                },
                "required": ["url"]
            }),
            BrowserAction::Snapshot => serde_json::json!({
                "type": "object",
                "properties": {
                    "interactive_only": {
                        "type": "boolean",
                        "description": "Only return interactive elements (buttons, links, inputs)"
                    }
                }
            }),
            BrowserAction::Click | BrowserAction::GetText => serde_json::json!({
                "type": "object",
                "properties": {"ref": element_ref},
                "required": ["ref"]
            }),
            BrowserAction::Fill => serde_json::json!({
                "type": "object",
                "properties": {
                    "ref": element_ref,
                    "text": {"type": "string", "description": "Text to enter"}
                },
                "required": ["ref", "text"]
            }),
            BrowserAction::Press => serde_json::json!({
                "type": "object",
                "properties": {
                    "key": {"type": "string", "description": "Key name"}
                },
                "required": ["key"]
            }),
            BrowserAction::Screenshot => serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "File path to save the screenshot"},
                    "full_page": {"type": "boolean", "description": "Capture the full page"}
                },
                "required": ["path"]
            }),
        }
    }
}

/// Refs are passed to agent-browser with an `@` prefix
fn normalize_ref(raw: &str) -> String {
    format!("@{}", raw.trim().trim_start_matches('@'))
}

/// A browser tool bound to the shared session
pub struct BrowserTool {
    action: BrowserAction,
    session: Arc<BrowserSession>,
}

impl BrowserTool {
    pub fn new(action: BrowserAction, session: Arc<BrowserSession>) -> Self {
        Self { action, session }
    }

    async fn snapshot(&self, interactive_only: bool) -> Result<String> {
        if interactive_only {
            self.session.run(&["snapshot", "-i"]).await
        } else {
            self.session.run(&["snapshot"]).await
        }
    }
}

#[async_trait]
impl Tool for BrowserTool {
    fn name(&self) -> &str {
        self.action.name()
    }

    fn description(&self) -> &str {
        self.action.description()
    }

    fn parameters(&self) -> serde_json::Value {
        self.action.parameters()
    }

    async fn call(&self, arguments: &serde_json::Value) -> Result<ToolOutput> {
        let name = self.action.name();

        match self.action {
            BrowserAction::Navigate => {
                let url = required_str(name, arguments, "url")?;
                self.session.run(&["open", url]).await?;
                // Best effort; some pages never go idle
                let _ = self.session.run(&["wait", "--load", "networkidle"]).await;
                let snapshot = self.snapshot(true).await?;
                Ok(ToolOutput::text(format!(
                    "Navigated to {}. Page snapshot:\n{}",
                    url, snapshot
                )))
            }
            BrowserAction::Snapshot => {
                let interactive = arguments
                    .get("interactive_only")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(true);
                Ok(ToolOutput::text(self.snapshot(interactive).await?))
            }
            BrowserAction::Click => {
                let element = normalize_ref(required_str(name, arguments, "ref")?);
                self.session.run(&["click", &element]).await?;
                let snapshot = self.snapshot(true).await?;
                Ok(ToolOutput::text(format!(
                    "Clicked {}. Updated page:\n{}",
                    element, snapshot
                )))
            }
            BrowserAction::Fill => {
                let element = normalize_ref(required_str(name, arguments, "ref")?);
                let text = required_str(name, arguments, "text")?;
                self.session.run(&["fill", &element, text]).await?;
                Ok(ToolOutput::text(format!("Filled {} with '{}'", element, text)))
            }
            BrowserAction::GetText => {
                let element = normalize_ref(required_str(name, arguments, "ref")?);
                let output = self.session.run(&["get", "text", &element]).await?;
                Ok(ToolOutput::text(output.trim()))
            }
            BrowserAction::Press => {
                let key = required_str(name, arguments, "key")?;
                self.session.run(&["press", key]).await?;
                Ok(ToolOutput::text(format!("Pressed {}", key)))
            }
            BrowserAction::Screenshot => {
                let path = required_str(name, arguments, "path")?;
                let mut args = vec!["screenshot", path];
                if arguments
                    .get("full_page")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false)
                {
                    args.push("--full");
                }
                self.session.run(&args).await?;
                Ok(ToolOutput::text(format!("Screenshot saved to {}", path)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ref_normalization() {
        assert_eq!(normalize_ref("e5"), "@e5");
        assert_eq!(normalize_ref("@e5"), "@e5");
        assert_eq!(normalize_ref(" e12 "), "@e12");
    }

    #[test]
    fn test_action_names_are_unique() {
        let names: HashSet<_> = BrowserAction::ALL.iter().map(|a| a.name()).collect();
        assert_eq!(names.len(), BrowserAction::ALL.len());
    }

    #[tokio::test]
    async fn test_missing_argument_is_a_tool_error() {
        let tool = BrowserTool::new(
            BrowserAction::Navigate,
            Arc::new(BrowserSession::new("test")),
        );
        let err = tool.call(&serde_json::json!({})).await.unwrap_err();
        assert!(err.to_string().contains("url"));
    }
}
