//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use crate::cli::repl::Repl;
use crate::core::HistoryRole;

/// Result of parsing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Not a command; run it as a message
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// History cleared and a new session started
    Reset,
}

/// Parse and handle special commands
pub async fn handle_command(input: &str, repl: &mut Repl) -> CommandResult {
    let input = input.trim();
    let (cmd, args) = match input.split_once(' ') {
        Some((cmd, args)) => (cmd, args.trim()),
        None => (input, ""),
    };
    let cmd = cmd.trim_start_matches('/').to_lowercase();

    // Only `criteria` takes arguments; "history of rome" is a request
    if !args.is_empty() && cmd != "criteria" {
        return CommandResult::Continue(input.to_string());
    }

    match cmd.as_str() {
        "exit" | "quit" | "q" => CommandResult::Exit,

        "reset" | "clear" => {
            repl.reset().await;
            CommandResult::Reset
        }

        "help" | "?" => CommandResult::Handled(help_text()),

        "criteria" => {
            if args.is_empty() {
                CommandResult::Handled(format!("Success criteria: {}", repl.criteria_display()))
            } else {
                repl.criteria = args.to_string();
                CommandResult::Handled(format!("Success criteria set to: {}", args))
            }
        }

        "status" => {
            let agent = repl.agent();
            let config = agent.config();
            CommandResult::Handled(format!(
                "Sidekick Status:\n\
                 ─────────────────────────────\n\
                 Provider:   {}\n\
                 Worker:     {}\n\
                 Evaluator:  {}\n\
                 Session:    {}\n\
                 Tools:      {}\n\
                 Criteria:   {}\n\
                 History:    {} entries\n\
                 Supersteps: max {}, timeout {}s",
                config.provider,
                config.models.worker,
                config.models.evaluator,
                agent.session_id(),
                agent.tool_names().len(),
                repl.criteria_display(),
                repl.history.len(),
                config.agent.max_supersteps,
                config.agent.run_timeout_secs,
            ))
        }

        "tools" => {
            let names = repl.agent().tool_names();
            if names.is_empty() {
                CommandResult::Handled("No tools available.".to_string())
            } else {
                CommandResult::Handled(format!(
                    "Available tools:\n{}",
                    names
                        .iter()
                        .map(|n| format!("  - {}", n))
                        .collect::<Vec<_>>()
                        .join("\n")
                ))
            }
        }

        "history" => {
            if repl.history.is_empty() {
                return CommandResult::Handled("History is empty.".to_string());
            }
            let lines: Vec<String> = repl
                .history
                .iter()
                .map(|entry| match entry.role {
                    HistoryRole::User => format!("You: {}", entry.content),
                    HistoryRole::Assistant => format!("Sidekick: {}", entry.content),
                })
                .collect();
            CommandResult::Handled(lines.join("\n"))
        }

        _ => {
            if input.starts_with('/') {
                CommandResult::Handled(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    cmd
                ))
            } else {
                CommandResult::Continue(input.to_string())
            }
        }
    }
}

/// Generate help text
fn help_text() -> String {
    r#"Sidekick Commands:
─────────────────────────────────────────────
  help, ?            Show this help message
  exit, quit, q      Exit Sidekick
  reset, clear       Clear history and start a new session
  criteria [text]    Show or set the success criteria
  status             Show current configuration
  tools              List the available tools
  history            Show the conversation so far

Anything else is sent to Sidekick as a request. It keeps working until
the success criteria are met or it needs your input.
─────────────────────────────────────────────"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{EvaluatorModel, EvaluatorVerdict, Sidekick, WorkerModel, WorkerReply};
    use crate::core::{Config, HistoryEntry, Message, Result};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Fixed;

    #[async_trait]
    impl WorkerModel for Fixed {
        async fn respond(&self, _messages: &[Message]) -> Result<WorkerReply> {
            Ok(WorkerReply::Answer("done".to_string()))
        }
    }

    #[async_trait]
    impl EvaluatorModel for Fixed {
        async fn judge(&self, _system: &str, _prompt: &str) -> Result<EvaluatorVerdict> {
            Ok(EvaluatorVerdict {
                feedback: "ok".to_string(),
                success_criteria_met: true,
                user_input_needed: false,
            })
        }
    }

    async fn repl() -> Repl {
        let mut agent = Sidekick::new(Config::default())
            .with_providers(Vec::new())
            .with_models(Arc::new(Fixed), Arc::new(Fixed));
        agent.setup().await.unwrap();
        Repl::new(agent)
    }

    #[tokio::test]
    async fn test_plain_text_is_not_a_command() {
        let mut repl = repl().await;
        assert_eq!(
            handle_command("what is the weather", &mut repl).await,
            CommandResult::Continue("what is the weather".to_string())
        );
    }

    #[tokio::test]
    async fn test_command_word_with_arguments_is_a_request() {
        let mut repl = repl().await;
        assert_eq!(
            handle_command("history of the printing press", &mut repl).await,
            CommandResult::Continue("history of the printing press".to_string())
        );
    }

    #[tokio::test]
    async fn test_criteria_command() {
        let mut repl = repl().await;
        handle_command("criteria Cite at least two sources", &mut repl).await;
        assert_eq!(repl.criteria, "Cite at least two sources");

        match handle_command("criteria", &mut repl).await {
            CommandResult::Handled(text) => assert!(text.contains("two sources")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reset_clears_history() {
        let mut repl = repl().await;
        repl.history.push(HistoryEntry::user("hi"));
        let session = repl.agent().session_id().to_string();

        assert_eq!(handle_command("reset", &mut repl).await, CommandResult::Reset);
        assert!(repl.history.is_empty());
        assert_ne!(repl.agent().session_id(), session);
    }

    #[tokio::test]
    async fn test_unknown_slash_command() {
        let mut repl = repl().await;
        match handle_command("/teleport", &mut repl).await {
            CommandResult::Handled(text) => assert!(text.contains("Unknown command")),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(handle_command("/exit", &mut repl).await, CommandResult::Exit);
    }
}
