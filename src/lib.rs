//! Sidekick - a task agent that works until the job is done
//!
//! A worker model answers the user's request, calling tools as it needs
//! them, and an evaluator model judges each answer against a success
//! criterion. The loop repeats until the criterion is met or the user's
//! input is needed, within an iteration cap and a wall-clock timeout.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Backend abstraction with Ollama and OpenAI-compatible clients
//! - **Tools**: Tool and provider traits, the registry, and concrete tools
//! - **Agent**: Worker, tool and evaluator steps and the superstep controller
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use sidekick::{Config, Sidekick};
//!
//! #[tokio::main]
//! async fn main() -> sidekick::Result<()> {
//!     let mut agent = Sidekick::new(Config::load());
//!     agent.setup().await?;
//!
//!     let history = agent
//!         .run("What is the capital of France?", "A one-word answer", &[])
//!         .await?;
//!     for entry in &history {
//!         println!("{:?}: {}", entry.role, entry.content);
//!     }
//!
//!     agent.cleanup().await;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use agent::{RunOutcome, RunStatus, Sidekick};
pub use cli::Repl;
pub use core::{Config, HistoryEntry, HistoryRole, Result, SidekickError};
