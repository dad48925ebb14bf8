//! Browser automation module
//!
//! Wraps the agent-browser CLI. The provider owns one [`BrowserSession`]
//! that every browser tool shares and that is reused across runs.

mod actions;
mod session;

use std::sync::Arc;

use async_trait::async_trait;

pub use actions::{BrowserAction, BrowserTool};
pub use session::BrowserSession;

use crate::core::config::BrowserConfig;
use crate::core::{Result, SidekickError};
use crate::tools::{Tool, ToolProvider};

/// Provides the browser tools
pub struct BrowserProvider {
    session: Arc<BrowserSession>,
}

impl BrowserProvider {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            session: Arc::new(BrowserSession::from_config(config)),
        }
    }

    /// The shared session handle
    pub fn session(&self) -> &Arc<BrowserSession> {
        &self.session
    }
}

#[async_trait]
impl ToolProvider for BrowserProvider {
    fn name(&self) -> &str {
        "browser"
    }

    async fn tools(&self) -> Result<Vec<Arc<dyn Tool>>> {
        if !BrowserSession::is_available().await {
            return Err(SidekickError::provider_init(
                self.name(),
                SidekickError::BrowserNotFound.to_string(),
            ));
        }

        Ok(BrowserAction::ALL
            .iter()
            .map(|&action| {
                Arc::new(BrowserTool::new(action, Arc::clone(&self.session))) as Arc<dyn Tool>
            })
            .collect())
    }

    async fn cleanup(&self) {
        self.session.close().await;
    }
}
