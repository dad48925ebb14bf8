//! Sidekick - a task agent that works until the job is done
//!
//! Main entry point for the CLI application.

use clap::Parser;
use sidekick::core::config::ProviderType;
use sidekick::{Config, Repl, Sidekick};
use tracing_subscriber::EnvFilter;

/// Sidekick - a task agent that works until the success criteria are met
#[derive(Parser, Debug)]
#[command(name = "sidekick")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// LLM backend (ollama or openai)
    #[arg(long)]
    provider: Option<ProviderType>,

    /// Worker model (answers and calls tools)
    #[arg(long, short = 'w')]
    worker_model: Option<String>,

    /// Evaluator model (judges answers)
    #[arg(long, short = 'e')]
    evaluator_model: Option<String>,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Disable browser tools
    #[arg(long)]
    no_browser: bool,

    /// Run in headed browser mode (visible window)
    #[arg(long)]
    headed: bool,

    /// Maximum worker/evaluator cycles per request
    #[arg(long)]
    max_supersteps: Option<usize>,

    /// Time budget per request, in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Success criteria for the single prompt
    #[arg(long, short = 'c', requires = "prompt")]
    criteria: Option<String>,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "sidekick=debug" } else { "sidekick=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(provider) = args.provider {
        config.set_provider(provider);
    }

    if let Some(ref worker) = args.worker_model {
        config.models.worker = worker.clone();
    }

    if let Some(ref evaluator) = args.evaluator_model {
        config.models.evaluator = evaluator.clone();
    }

    if args.debug {
        config.agent.debug = true;
    }

    if args.no_browser {
        config.tools.browser.enabled = false;
    }

    if args.headed {
        config.tools.browser.headed = true;
    }

    if let Some(max) = args.max_supersteps {
        config.agent.max_supersteps = max;
    }

    if let Some(secs) = args.timeout {
        config.agent.run_timeout_secs = secs;
    }

    init_logging(config.agent.debug);

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let mut agent = Sidekick::new(config);
        agent.setup().await?;

        let criteria = args.criteria.unwrap_or_default();
        let result = agent.run(&prompt, &criteria, &[]).await;
        agent.cleanup().await;

        sidekick::cli::print_entries(&result?);
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config);
    repl.run().await?;

    Ok(())
}
