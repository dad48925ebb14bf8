//! Shared browser session - wraps the agent-browser CLI
//!
//! One session handle is owned by the browser provider and shared by all of
//! its tools. Commands are serialized through the handle. A failed command
//! marks the session stale so the next command re-acquires it.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::Mutex;

use crate::core::config::BrowserConfig;
use crate::core::{Result, SidekickError};

const BROWSER_BIN: &str = "agent-browser";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    /// Never acquired, or released by cleanup
    Idle,
    /// Acquired and believed healthy
    Active,
    /// Last command failed; re-acquire before reuse
    Stale,
}

/// Handle to a named agent-browser session
pub struct BrowserSession {
    /// Session name for isolation
    session_name: String,
    /// Whether to run in headed mode
    headed: bool,
    /// Per-command timeout
    timeout: Duration,
    state: Mutex<SessionState>,
}

impl BrowserSession {
    /// Create a session handle; nothing is started until first use
    pub fn new(session_name: impl Into<String>) -> Self {
        Self {
            session_name: session_name.into(),
            headed: false,
            timeout: Duration::from_secs(30),
            state: Mutex::new(SessionState::Idle),
        }
    }

    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            headed: config.headed,
            timeout: Duration::from_millis(config.timeout_ms),
            ..Self::new(&config.session_name)
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// Check if agent-browser is installed
    pub async fn is_available() -> bool {
        Command::new(BROWSER_BIN)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Whether the session is currently acquired
    pub async fn is_active(&self) -> bool {
        *self.state.lock().await == SessionState::Active
    }

    /// Run an agent-browser command against this session
    pub async fn run(&self, args: &[&str]) -> Result<String> {
        let mut state = self.state.lock().await;

        if *state != SessionState::Active {
            tracing::debug!(session = %self.session_name, previous = ?*state, "acquiring browser session");
            if !Self::is_available().await {
                *state = SessionState::Idle;
                return Err(SidekickError::BrowserNotFound);
            }
        }

        match self.exec(args).await {
            Ok(output) => {
                *state = SessionState::Active;
                Ok(output)
            }
            Err(e) => {
                tracing::warn!(session = %self.session_name, error = %e, "browser command failed, marking session stale");
                *state = SessionState::Stale;
                Err(e)
            }
        }
    }

    /// Close the browser if it was acquired. Idempotent; never fails.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if *state == SessionState::Idle {
            return;
        }

        if let Err(e) = self.exec(&["close"]).await {
            tracing::warn!(session = %self.session_name, error = %e, "error closing browser session");
        } else {
            tracing::info!(session = %self.session_name, "browser session closed");
        }
        *state = SessionState::Idle;
    }

    async fn exec(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(BROWSER_BIN);
        cmd.args(["--session", &self.session_name]);

        if self.headed {
            cmd.arg("--headed");
        }

        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                SidekickError::browser(format!(
                    "agent-browser {} timed out after {:?}",
                    args.first().copied().unwrap_or_default(),
                    self.timeout
                ))
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SidekickError::BrowserNotFound
                } else {
                    SidekickError::browser(format!("Failed to run agent-browser: {}", e))
                }
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SidekickError::browser(format!(
                "agent-browser command failed: {}",
                stderr.trim()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_config() {
        let config = BrowserConfig {
            enabled: true,
            session_name: "test-session".to_string(),
            headed: true,
            timeout_ms: 5000,
        };
        let session = BrowserSession::from_config(&config);
        assert_eq!(session.session_name(), "test-session");
        assert!(session.headed);
        assert_eq!(session.timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_close_before_use_is_noop() {
        let session = BrowserSession::new("never-opened");
        session.close().await;
        session.close().await;
        assert!(!session.is_active().await);
    }
}
