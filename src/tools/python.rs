//! Python execution tool
//!
//! Each call runs the code in a fresh interpreter process fed on stdin.
//! Only what the code prints is returned.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::core::config::PythonConfig;
use crate::core::{Result, SidekickError};
use crate::tools::{required_str, Tool, ToolOutput, ToolProvider};

/// Runs Python code and returns its printed output
pub struct PythonTool {
    interpreter: String,
    timeout: Duration,
}

impl PythonTool {
    pub fn new(interpreter: impl Into<String>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout,
        }
    }

    async fn run(&self, code: &str) -> Result<String> {
        let name = "python_repl";
        let mut child = Command::new(&self.interpreter)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SidekickError::tool(name, format!("failed to start {}: {}", self.interpreter, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(code.as_bytes()).await?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| SidekickError::tool(name, format!("execution timed out after {:?}", self.timeout)))??;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_line = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("process exited with an error");
            Err(SidekickError::tool(
                name,
                format!("{}{}", stdout, last_line.trim()),
            ))
        }
    }
}

#[async_trait]
impl Tool for PythonTool {
    fn name(&self) -> &str {
        "python_repl"
    }

    fn description(&self) -> &str {
        "A Python shell. Use this to execute python commands. Input should be a valid python command. \
         If you want to see the output of a value, you should print it out with `print(...)`."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "code": {"type": "string", "description": "Python source to execute"}
            },
            "required": ["code"]
        })
    }

    async fn call(&self, arguments: &serde_json::Value) -> Result<ToolOutput> {
        let code = required_str(self.name(), arguments, "code")?;
        tracing::debug!(bytes = code.len(), "running python");

        let stdout = self.run(code).await?;
        if stdout.trim().is_empty() {
            Ok(ToolOutput::text(
                "(no output; use print() to see results)",
            ))
        } else {
            Ok(ToolOutput::text(stdout))
        }
    }
}

/// Provides the Python tool when an interpreter is installed
pub struct PythonProvider {
    config: PythonConfig,
}

impl PythonProvider {
    pub fn new(config: &PythonConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl ToolProvider for PythonProvider {
    fn name(&self) -> &str {
        "python"
    }

    async fn tools(&self) -> Result<Vec<Arc<dyn Tool>>> {
        if !self.config.enabled {
            return Err(SidekickError::provider_init(self.name(), "disabled in config"));
        }

        let found = Command::new(&self.config.interpreter)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false);

        if !found {
            return Err(SidekickError::provider_init(
                self.name(),
                format!("interpreter '{}' not found", self.config.interpreter),
            ));
        }

        Ok(vec![Arc::new(PythonTool::new(
            self.config.interpreter.clone(),
            Duration::from_secs(self.config.timeout_secs),
        ))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_interpreter_fails_init() {
        let provider = PythonProvider::new(&PythonConfig {
            enabled: true,
            interpreter: "definitely-not-a-python-binary".to_string(),
            timeout_secs: 5,
        });
        let err = provider.tools().await.err().unwrap();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_disabled_provider() {
        let provider = PythonProvider::new(&PythonConfig {
            enabled: false,
            ..PythonConfig::default()
        });
        assert!(provider.tools().await.is_err());
    }

    #[tokio::test]
    async fn test_missing_code_argument() {
        let tool = PythonTool::new("python3", Duration::from_secs(5));
        assert!(tool.call(&serde_json::json!({})).await.is_err());
    }
}
