//! Interactive REPL for Sidekick
//!
//! Keeps the visible history across turns and feeds it back into each run.

use std::io::{self, BufRead, Write};

use crate::agent::{is_clarifying_question, Sidekick};
use crate::cli::commands::{handle_command, CommandResult};
use crate::core::{Config, HistoryEntry, HistoryRole, Result};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    agent: Sidekick,
    /// Visible history, fed back into every run
    pub(crate) history: Vec<HistoryEntry>,
    /// Success criteria for the next messages; empty means the default
    pub(crate) criteria: String,
}

impl Repl {
    /// Wrap an agent; the agent is set up when the REPL starts if needed
    pub fn new(agent: Sidekick) -> Self {
        Self {
            agent,
            history: Vec::new(),
            criteria: String::new(),
        }
    }

    /// Create a REPL with custom configuration
    pub fn with_config(config: Config) -> Self {
        Self::new(Sidekick::new(config))
    }

    pub fn agent(&self) -> &Sidekick {
        &self.agent
    }

    pub(crate) fn criteria_display(&self) -> String {
        if self.criteria.is_empty() {
            format!(
                "{} (default)",
                self.agent.config().agent.default_success_criteria
            )
        } else {
            self.criteria.clone()
        }
    }

    /// Forget the history and move to a fresh session
    pub(crate) async fn reset(&mut self) {
        self.history.clear();
        self.agent.reset_session().await;
    }

    /// Send a message and return only the entries this run added
    pub async fn send(&mut self, message: &str) -> Result<Vec<HistoryEntry>> {
        let updated = self.agent.run(message, &self.criteria, &self.history).await?;
        let added = updated[self.history.len()..].to_vec();
        self.history = updated;
        Ok(added)
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        if !self.agent.is_ready() {
            print!("Setting up...");
            io::stdout().flush()?;

            if let Err(e) = self.agent.setup().await {
                println!("\n\nSetup failed: {}\n", e);
                self.agent.cleanup().await;
                return Ok(());
            }
            println!(" Ready!");
        }
        println!("Tools: {}\n", tools_summary(self.agent.tool_names()));

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("You: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match handle_command(input, self).await {
                CommandResult::Exit => {
                    println!("\nGoodbye!");
                    break;
                }
                CommandResult::Reset => {
                    println!("Conversation cleared; new session started.\n");
                }
                CommandResult::Handled(output) => {
                    println!("{}\n", output);
                }
                CommandResult::Continue(message) => match self.send(&message).await {
                    Ok(entries) => print_entries(&entries),
                    Err(e) => eprintln!("\nError: {}\n", e),
                },
            }
        }

        self.agent.cleanup().await;
        Ok(())
    }

    /// Print the startup banner
    fn print_banner(&self) {
        let config = self.agent.config();

        println!();
        println!("Sidekick - a personal co-worker that keeps going until the job is done");
        println!("──────────────────────────────────────────────────────────────");
        println!("Provider:   {}", config.provider);
        println!("Worker:     {}", config.models.worker);
        println!("Evaluator:  {}", config.models.evaluator);
        println!("Commands: help, criteria, status, tools, history, reset, exit");
        println!("──────────────────────────────────────────────────────────────");
    }
}

fn tools_summary(names: &[String]) -> String {
    if names.is_empty() {
        "none (answers come from the model alone)".to_string()
    } else {
        names.join(", ")
    }
}

/// Print the entries a run added, skipping the echoed user message
pub fn print_entries(entries: &[HistoryEntry]) {
    for entry in entries {
        if entry.role == HistoryRole::User {
            continue;
        }
        if entry.is_evaluator_feedback() {
            println!("  [{}]\n", entry.content);
        } else if is_clarifying_question(&entry.content) {
            println!("\nSidekick (waiting for your reply):\n{}\n", entry.content);
        } else {
            println!("\nSidekick:\n{}\n", entry.content);
        }
    }
}
