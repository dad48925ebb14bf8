//! Live backend tests
//!
//! Run real tasks against the configured LLM backend and compare worker
//! models. Run with: cargo test --test live_backend -- --ignored

use std::time::{Duration, Instant};

use sidekick::{Config, RunStatus, Sidekick};

/// Result of a single benchmark run
#[derive(Debug)]
pub struct BenchmarkResult {
    pub model: String,
    pub task: String,
    pub success: bool,
    pub supersteps: usize,
    pub duration: Duration,
    pub error: Option<String>,
}

/// Benchmark harness for comparing worker models
pub struct ModelBenchmark {
    pub models: Vec<String>,
    pub max_supersteps: usize,
}

impl Default for ModelBenchmark {
    fn default() -> Self {
        Self {
            models: vec![Config::default().models.worker],
            max_supersteps: 5,
        }
    }
}

impl ModelBenchmark {
    /// Run a task against all models and collect results
    pub async fn run_task(&self, task: &str, criteria: &str) -> Vec<BenchmarkResult> {
        let mut results = Vec::new();

        for model in &self.models {
            println!("\n=== Testing model: {} ===", model);
            results.push(self.run_single(model, task, criteria).await);
        }

        results
    }

    async fn run_single(&self, model: &str, task: &str, criteria: &str) -> BenchmarkResult {
        let mut config = Config::default();
        config.models.worker = model.to_string();
        config.agent.max_supersteps = self.max_supersteps;
        config.agent.run_timeout_secs = 180;

        let mut agent = Sidekick::new(config);
        let failed = |error: String| BenchmarkResult {
            model: model.to_string(),
            task: task.to_string(),
            success: false,
            supersteps: 0,
            duration: Duration::ZERO,
            error: Some(error),
        };

        if let Err(e) = agent.setup().await {
            agent.cleanup().await;
            return failed(format!("Setup error: {}", e));
        }

        let start = Instant::now();
        let session = agent.session_id().to_string();
        let outcome = agent.run_in_session(&session, task, criteria, &[]).await;
        let duration = start.elapsed();
        agent.cleanup().await;

        match outcome {
            Ok(outcome) => {
                let error = match &outcome.status {
                    RunStatus::Aborted(e) => Some(e.to_string()),
                    _ => None,
                };
                BenchmarkResult {
                    model: model.to_string(),
                    task: task.to_string(),
                    success: matches!(outcome.status, RunStatus::CriteriaMet),
                    supersteps: outcome.supersteps,
                    duration,
                    error,
                }
            }
            Err(e) => failed(e.to_string()),
        }
    }

    /// Print results in a formatted table
    pub fn print_results(results: &[BenchmarkResult]) {
        println!("\n{:20} {:8} {:10} {:9} Error", "Model", "Success", "Supersteps", "Duration");
        for result in results {
            println!(
                "{:20} {:8} {:10} {:8.2}s {}",
                result.model,
                if result.success { "yes" } else { "no" },
                result.supersteps,
                result.duration.as_secs_f64(),
                result.error.as_deref().unwrap_or("-")
            );
        }
    }
}

/// Simple arithmetic task (no tools needed)
#[tokio::test]
#[ignore] // Requires a running LLM backend
async fn test_simple_question() {
    let benchmark = ModelBenchmark::default();
    let results = benchmark
        .run_task("What is 2+2?", "A numeric answer")
        .await;
    ModelBenchmark::print_results(&results);
    assert!(results.iter().any(|r| r.success));
}

/// Lookup that needs a knowledge tool
#[tokio::test]
#[ignore]
async fn test_wikipedia_lookup() {
    let benchmark = ModelBenchmark::default();
    let results = benchmark
        .run_task(
            "In which year was the Rust programming language first released? Look it up.",
            "States a year and names the source",
        )
        .await;
    ModelBenchmark::print_results(&results);
    assert!(results.iter().all(|r| r.error.is_none()));
}

/// Browser navigation (requires agent-browser)
#[tokio::test]
#[ignore]
async fn test_browser_navigation() {
    let benchmark = ModelBenchmark::default();
    let results = benchmark
        .run_task(
            "Open https://example.com in the browser and tell me the page heading",
            "Reports the heading text of the page",
        )
        .await;
    ModelBenchmark::print_results(&results);
}
