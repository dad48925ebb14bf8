//! Push notifications through Pushover

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::core::config::PushConfig;
use crate::core::{Result, SidekickError};
use crate::tools::{required_str, Tool, ToolOutput, ToolProvider};

const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

/// Sends a push notification to the user
pub struct PushTool {
    client: Client,
    credentials: Option<(String, String)>,
}

impl PushTool {
    fn new(client: Client, config: &PushConfig) -> Self {
        let credentials = match (&config.token, &config.user) {
            (Some(token), Some(user)) if !token.is_empty() && !user.is_empty() => {
                Some((token.clone(), user.clone()))
            }
            _ => None,
        };
        Self {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl Tool for PushTool {
    fn name(&self) -> &str {
        "send_push_notification"
    }

    fn description(&self) -> &str {
        "Use this tool when you want to send a push notification"
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "text": {"type": "string", "description": "The notification text"}
            },
            "required": ["text"]
        })
    }

    async fn call(&self, arguments: &serde_json::Value) -> Result<ToolOutput> {
        let text = required_str(self.name(), arguments, "text")?;

        let Some((token, user)) = &self.credentials else {
            return Err(SidekickError::tool(
                self.name(),
                "push notifications are not configured (set PUSHOVER_TOKEN and PUSHOVER_USER)",
            ));
        };

        tracing::info!(chars = text.len(), "sending push notification");
        let response = self
            .client
            .post(PUSHOVER_URL)
            .form(&[("token", token.as_str()), ("user", user.as_str()), ("message", text)])
            .send()
            .await?;

        if response.status().is_success() {
            Ok(ToolOutput::text("success"))
        } else {
            Err(SidekickError::tool(
                self.name(),
                format!("Pushover returned {}", response.status()),
            ))
        }
    }
}

/// Provides the push notification tool.
///
/// Missing credentials do not fail initialization; the tool reports it
/// when called.
pub struct PushProvider {
    config: PushConfig,
}

impl PushProvider {
    pub fn new(config: &PushConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl ToolProvider for PushProvider {
    fn name(&self) -> &str {
        "push"
    }

    async fn tools(&self) -> Result<Vec<Arc<dyn Tool>>> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| SidekickError::provider_init(self.name(), e.to_string()))?;

        let tool = PushTool::new(client, &self.config);
        if tool.credentials.is_none() {
            tracing::debug!("pushover credentials missing; notifications will be reported as unconfigured");
        }
        Ok(vec![Arc::new(tool)])
    }
}
