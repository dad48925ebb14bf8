//! Sandboxed file management tools
//!
//! All paths are relative to the sandbox root; anything that would escape
//! it is rejected as a tool error.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{Result, SidekickError};
use crate::tools::{optional_str, required_str, Tool, ToolOutput, ToolProvider};

/// Root directory the file tools are confined to
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a sandbox-relative path
    pub fn resolve(&self, tool: &str, relative: &str) -> Result<PathBuf> {
        let relative = Path::new(relative.trim());
        let mut resolved = self.root.clone();

        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(SidekickError::tool(
                        tool,
                        format!(
                            "path '{}' must be relative and stay inside the sandbox",
                            relative.display()
                        ),
                    ))
                }
            }
        }

        Ok(resolved)
    }

    fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// File operations exposed as tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    Read,
    Write,
    List,
    Copy,
    Move,
    Delete,
    Search,
}

impl FileOp {
    pub const ALL: [FileOp; 7] = [
        FileOp::Read,
        FileOp::Write,
        FileOp::List,
        FileOp::Copy,
        FileOp::Move,
        FileOp::Delete,
        FileOp::Search,
    ];

    fn name(self) -> &'static str {
        match self {
            FileOp::Read => "read_file",
            FileOp::Write => "write_file",
            FileOp::List => "list_directory",
            FileOp::Copy => "copy_file",
            FileOp::Move => "move_file",
            FileOp::Delete => "delete_file",
            FileOp::Search => "file_search",
        }
    }

    fn description(self) -> &'static str {
        match self {
            FileOp::Read => "Read a file from the sandbox",
            FileOp::Write => "Write text to a file in the sandbox, creating or replacing it",
            FileOp::List => "List the files and directories in a sandbox directory",
            FileOp::Copy => "Copy a file to a new location in the sandbox",
            FileOp::Move => "Move or rename a file in the sandbox",
            FileOp::Delete => "Delete a file from the sandbox",
            FileOp::Search => "Recursively search the sandbox for file names matching a pattern",
        }
    }

    fn parameters(self) -> serde_json::Value {
        let path = |desc: &str| serde_json::json!({"type": "string", "description": desc});

        match self {
            FileOp::Read | FileOp::Delete => serde_json::json!({
                "type": "object",
                "properties": {"file_path": path("Path relative to the sandbox")},
                "required": ["file_path"]
            }),
            FileOp::Write => serde_json::json!({
                "type": "object",
                "properties": {
                    "file_path": path("Path relative to the sandbox"),
                    "text": {"type": "string", "description": "Content to write"},
                    "append": {"type": "boolean", "description": "Append instead of overwrite"}
                },
                "required": ["file_path", "text"]
            }),
            FileOp::List => serde_json::json!({
                "type": "object",
                "properties": {"dir_path": path("Directory relative to the sandbox (default: root)")}
            }),
            FileOp::Copy | FileOp::Move => serde_json::json!({
                "type": "object",
                "properties": {
                    "source_path": path("Existing file"),
                    "destination_path": path("New location")
                },
                "required": ["source_path", "destination_path"]
            }),
            FileOp::Search => serde_json::json!({
                "type": "object",
                "properties": {
                    "pattern": {"type": "string", "description": "Glob pattern such as *.txt"},
                    "dir_path": path("Directory to search (default: root)")
                },
                "required": ["pattern"]
            }),
        }
    }
}

/// A file tool bound to the sandbox
pub struct FileTool {
    op: FileOp,
    sandbox: Arc<Sandbox>,
}

impl FileTool {
    pub fn new(op: FileOp, sandbox: Arc<Sandbox>) -> Self {
        Self { op, sandbox }
    }

    fn io_error(&self, path: &Path, e: std::io::Error) -> SidekickError {
        SidekickError::tool(
            self.op.name(),
            format!("{}: {}", self.sandbox.display(path), e),
        )
    }
}

#[async_trait]
impl Tool for FileTool {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn description(&self) -> &str {
        self.op.description()
    }

    fn parameters(&self) -> serde_json::Value {
        self.op.parameters()
    }

    async fn call(&self, arguments: &serde_json::Value) -> Result<ToolOutput> {
        let name = self.op.name();
        let sandbox = &self.sandbox;

        match self.op {
            FileOp::Read => {
                let path = sandbox.resolve(name, required_str(name, arguments, "file_path")?)?;
                let content = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| self.io_error(&path, e))?;
                Ok(ToolOutput::text(content))
            }
            FileOp::Write => {
                let path = sandbox.resolve(name, required_str(name, arguments, "file_path")?)?;
                let text = required_str(name, arguments, "text")?;
                let append = arguments
                    .get("append")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);

                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| self.io_error(parent, e))?;
                }

                if append {
                    use tokio::io::AsyncWriteExt;
                    let mut file = tokio::fs::OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(&path)
                        .await
                        .map_err(|e| self.io_error(&path, e))?;
                    file.write_all(text.as_bytes())
                        .await
                        .map_err(|e| self.io_error(&path, e))?;
                } else {
                    tokio::fs::write(&path, text)
                        .await
                        .map_err(|e| self.io_error(&path, e))?;
                }

                Ok(ToolOutput::text(format!(
                    "File written successfully to {}",
                    sandbox.display(&path)
                )))
            }
            FileOp::List => {
                let dir = sandbox.resolve(name, optional_str(arguments, "dir_path").unwrap_or("."))?;
                let mut entries = tokio::fs::read_dir(&dir)
                    .await
                    .map_err(|e| self.io_error(&dir, e))?;

                let mut names = Vec::new();
                while let Some(entry) = entries
                    .next_entry()
                    .await
                    .map_err(|e| self.io_error(&dir, e))?
                {
                    let mut entry_name = entry.file_name().to_string_lossy().into_owned();
                    if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                        entry_name.push('/');
                    }
                    names.push(entry_name);
                }
                names.sort();

                if names.is_empty() {
                    Ok(ToolOutput::text("No files found in directory"))
                } else {
                    Ok(ToolOutput::text(names.join("\n")))
                }
            }
            FileOp::Copy | FileOp::Move => {
                let source =
                    sandbox.resolve(name, required_str(name, arguments, "source_path")?)?;
                let destination =
                    sandbox.resolve(name, required_str(name, arguments, "destination_path")?)?;

                if let Some(parent) = destination.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| self.io_error(parent, e))?;
                }

                if self.op == FileOp::Copy {
                    tokio::fs::copy(&source, &destination)
                        .await
                        .map_err(|e| self.io_error(&source, e))?;
                } else {
                    tokio::fs::rename(&source, &destination)
                        .await
                        .map_err(|e| self.io_error(&source, e))?;
                }

                let verb = if self.op == FileOp::Copy { "copied" } else { "moved" };
                Ok(ToolOutput::text(format!(
                    "File {} from {} to {}",
                    verb,
                    sandbox.display(&source),
                    sandbox.display(&destination)
                )))
            }
            FileOp::Delete => {
                let path = sandbox.resolve(name, required_str(name, arguments, "file_path")?)?;
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| self.io_error(&path, e))?;
                Ok(ToolOutput::text(format!(
                    "File deleted successfully: {}",
                    sandbox.display(&path)
                )))
            }
            FileOp::Search => {
                let pattern = required_str(name, arguments, "pattern")?;
                if pattern.contains("..") || pattern.starts_with('/') {
                    return Err(SidekickError::tool(name, "pattern must stay inside the sandbox"));
                }
                let dir = sandbox.resolve(name, optional_str(arguments, "dir_path").unwrap_or("."))?;
                let full_pattern = dir.join("**").join(pattern);

                let paths = glob::glob(&full_pattern.to_string_lossy())
                    .map_err(|e| SidekickError::tool(name, format!("invalid pattern: {}", e)))?;

                let mut matches: Vec<String> = paths
                    .filter_map(|p| p.ok())
                    .map(|p| sandbox.display(&p))
                    .collect();
                matches.sort();

                if matches.is_empty() {
                    Ok(ToolOutput::text(format!("No files found for pattern {}", pattern)))
                } else {
                    Ok(ToolOutput::text(matches.join("\n")))
                }
            }
        }
    }
}

/// Provides the sandboxed file tools
pub struct FileToolsProvider {
    sandbox: Arc<Sandbox>,
}

impl FileToolsProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            sandbox: Arc::new(Sandbox::new(root)),
        }
    }
}

#[async_trait]
impl ToolProvider for FileToolsProvider {
    fn name(&self) -> &str {
        "files"
    }

    async fn tools(&self) -> Result<Vec<Arc<dyn Tool>>> {
        tokio::fs::create_dir_all(self.sandbox.root())
            .await
            .map_err(|e| {
                SidekickError::provider_init(
                    self.name(),
                    format!("cannot create sandbox {}: {}", self.sandbox.root().display(), e),
                )
            })?;

        Ok(FileOp::ALL
            .iter()
            .map(|&op| Arc::new(FileTool::new(op, Arc::clone(&self.sandbox))) as Arc<dyn Tool>)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolRegistry;
    use crate::core::ToolCall;

    async fn registry_in(dir: &Path) -> ToolRegistry {
        let provider: Arc<dyn ToolProvider> = Arc::new(FileToolsProvider::new(dir.join("sandbox")));
        ToolRegistry::collect(&[provider]).await
    }

    fn call(name: &str, args: serde_json::Value) -> ToolCall {
        ToolCall::new("t", name, args)
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let sandbox = Sandbox::new("/tmp/sandbox");
        assert!(sandbox.resolve("read_file", "notes/today.md").is_ok());
        assert!(sandbox.resolve("read_file", "../etc/passwd").is_err());
        assert!(sandbox.resolve("read_file", "/etc/passwd").is_err());
        assert!(sandbox.resolve("read_file", "a/../../b").is_err());
    }

    #[tokio::test]
    async fn test_write_read_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(dir.path()).await;
        assert_eq!(registry.len(), FileOp::ALL.len());

        let written = registry
            .execute(&call(
                "write_file",
                serde_json::json!({"file_path": "notes/plan.md", "text": "step one"}),
            ))
            .await;
        assert!(written.success, "{}", written.output);

        let read = registry
            .execute(&call("read_file", serde_json::json!({"file_path": "notes/plan.md"})))
            .await;
        assert_eq!(read.output, "step one");

        let listed = registry
            .execute(&call("list_directory", serde_json::json!({})))
            .await;
        assert_eq!(listed.output, "notes/");

        let found = registry
            .execute(&call("file_search", serde_json::json!({"pattern": "*.md"})))
            .await;
        assert!(found.output.contains("plan.md"), "{}", found.output);

        let deleted = registry
            .execute(&call("delete_file", serde_json::json!({"file_path": "notes/plan.md"})))
            .await;
        assert!(deleted.success);

        let missing = registry
            .execute(&call("read_file", serde_json::json!({"file_path": "notes/plan.md"})))
            .await;
        assert!(!missing.success);
    }

    #[tokio::test]
    async fn test_escape_attempt_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_in(dir.path()).await;

        let result = registry
            .execute(&call(
                "write_file",
                serde_json::json!({"file_path": "../outside.txt", "text": "nope"}),
            ))
            .await;
        assert!(!result.success);
        assert!(!dir.path().join("outside.txt").exists());
    }
}
