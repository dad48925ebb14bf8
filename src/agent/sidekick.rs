//! Sidekick - setup, runs and teardown around the superstep controller

use std::sync::Arc;

use crate::agent::capability::{EvaluatorModel, LlmEvaluator, LlmWorker, WorkerModel};
use crate::agent::checkpoint::{InMemoryRunStore, RunStore};
use crate::agent::controller::{RunLimits, RunOutcome, SuperstepController};
use crate::agent::evaluator::EvaluatorStep;
use crate::agent::tool_step::ToolExecutionStep;
use crate::agent::worker::WorkerStep;
use crate::core::config::ToolsConfig;
use crate::core::{Config, HistoryEntry, Result, SidekickError};
use crate::llm::create_provider;
use crate::tools::browser::BrowserProvider;
use crate::tools::files::FileToolsProvider;
use crate::tools::notify::PushProvider;
use crate::tools::python::PythonProvider;
use crate::tools::web::{SearchProvider, WikipediaProvider};
use crate::tools::{ToolProvider, ToolRegistry};

/// Tool providers enabled by the configuration
pub fn default_providers(config: &ToolsConfig) -> Vec<Arc<dyn ToolProvider>> {
    let mut providers: Vec<Arc<dyn ToolProvider>> = Vec::new();

    if config.browser.enabled {
        providers.push(Arc::new(BrowserProvider::new(&config.browser)));
    }
    providers.push(Arc::new(FileToolsProvider::new(config.sandbox_dir.clone())));
    providers.push(Arc::new(SearchProvider::new(&config.search)));
    providers.push(Arc::new(WikipediaProvider::new(&config.wikipedia)));
    providers.push(Arc::new(PushProvider::new(&config.push)));
    providers.push(Arc::new(PythonProvider::new(&config.python)));

    providers
}

/// The task agent
pub struct Sidekick {
    config: Config,
    session_id: String,
    providers: Vec<Arc<dyn ToolProvider>>,
    models: Option<(Arc<dyn WorkerModel>, Arc<dyn EvaluatorModel>)>,
    store: Arc<dyn RunStore>,
    controller: Option<SuperstepController>,
    tool_names: Vec<String>,
}

impl Sidekick {
    /// Create an agent using the configured LLM backend and tool providers.
    /// Nothing is initialized until [`Sidekick::setup`].
    pub fn new(config: Config) -> Self {
        let providers = default_providers(&config.tools);
        Self {
            config,
            session_id: new_session_id(),
            providers,
            models: None,
            store: Arc::new(InMemoryRunStore::new()),
            controller: None,
            tool_names: Vec::new(),
        }
    }

    /// Replace the tool providers
    pub fn with_providers(mut self, providers: Vec<Arc<dyn ToolProvider>>) -> Self {
        self.providers = providers;
        self
    }

    /// Use the given models instead of building them from the LLM backend
    pub fn with_models(
        mut self,
        worker: Arc<dyn WorkerModel>,
        evaluator: Arc<dyn EvaluatorModel>,
    ) -> Self {
        self.models = Some((worker, evaluator));
        self
    }

    /// Replace the session store
    pub fn with_store(mut self, store: Arc<dyn RunStore>) -> Self {
        self.store = store;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_ready(&self) -> bool {
        self.controller.is_some()
    }

    /// Names of the tools available to the worker
    pub fn tool_names(&self) -> &[String] {
        &self.tool_names
    }

    /// Collect tools, build the models and the controller.
    ///
    /// On failure the agent stays not-ready and `run` refuses to start.
    pub async fn setup(&mut self) -> Result<()> {
        self.controller = None;

        match self.build().await {
            Ok((controller, tool_names)) => {
                tracing::info!(
                    session = %self.session_id,
                    tools = tool_names.len(),
                    "sidekick setup completed"
                );
                self.controller = Some(controller);
                self.tool_names = tool_names;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "sidekick setup failed");
                Err(match e {
                    SidekickError::Setup(_) => e,
                    other => SidekickError::setup(other.to_string()),
                })
            }
        }
    }

    async fn build(&self) -> Result<(SuperstepController, Vec<String>)> {
        let registry = ToolRegistry::collect(&self.providers).await;
        let tool_names: Vec<String> = registry.names().into_iter().map(String::from).collect();

        let (worker, evaluator) = match &self.models {
            Some((worker, evaluator)) => (Arc::clone(worker), Arc::clone(evaluator)),
            None => self.llm_models(&registry).await?,
        };

        let controller = SuperstepController::new(
            WorkerStep::new(worker, tool_names.clone()),
            ToolExecutionStep::new(registry),
            EvaluatorStep::new(evaluator),
            Arc::clone(&self.store),
            RunLimits::from_config(&self.config.agent),
        );

        Ok((controller, tool_names))
    }

    async fn llm_models(
        &self,
        registry: &ToolRegistry,
    ) -> Result<(Arc<dyn WorkerModel>, Arc<dyn EvaluatorModel>)> {
        let provider = create_provider(&self.config)?;
        let models = &self.config.models;

        if self.config.agent.verify_models {
            for model in [&models.worker, &models.evaluator] {
                if !provider.is_model_available(model).await? {
                    return Err(SidekickError::ModelNotFound(model.clone()));
                }
            }
        }

        tracing::debug!(
            provider = provider.name(),
            worker = %models.worker,
            evaluator = %models.evaluator,
            "models configured"
        );

        let worker = LlmWorker::new(Arc::clone(&provider), &models.worker)
            .with_tools(registry.definitions());
        let evaluator = LlmEvaluator::new(provider, &models.evaluator);

        Ok((Arc::new(worker), Arc::new(evaluator)))
    }

    /// Run a message in the agent's own session and return the new history.
    ///
    /// Only a not-ready agent is an error; run failures come back as a
    /// history ending in an explanatory assistant turn.
    pub async fn run(
        &self,
        message: &str,
        success_criteria: &str,
        history: &[HistoryEntry],
    ) -> Result<Vec<HistoryEntry>> {
        let outcome = self
            .run_in_session(&self.session_id, message, success_criteria, history)
            .await?;
        Ok(outcome.history)
    }

    /// Run a message in any session. Different sessions may run concurrently.
    pub async fn run_in_session(
        &self,
        session_id: &str,
        message: &str,
        success_criteria: &str,
        history: &[HistoryEntry],
    ) -> Result<RunOutcome> {
        let controller = self.controller.as_ref().ok_or(SidekickError::NotReady)?;

        let criteria = if success_criteria.trim().is_empty() {
            self.config.agent.default_success_criteria.as_str()
        } else {
            success_criteria
        };

        Ok(controller.run(session_id, message, criteria, history).await)
    }

    /// Forget the current session's snapshot and start a new session
    pub async fn reset_session(&mut self) {
        if let Err(e) = self.store.remove(&self.session_id).await {
            tracing::warn!(session = %self.session_id, error = %e, "could not clear session");
        }
        self.session_id = new_session_id();
        tracing::info!(session = %self.session_id, "new session");
    }

    /// Release provider resources. Idempotent and never fails; the agent
    /// must be set up again before the next run.
    pub async fn cleanup(&mut self) {
        for provider in &self.providers {
            tracing::debug!(provider = provider.name(), "cleaning up tool provider");
            provider.cleanup().await;
        }
        if self.controller.take().is_some() {
            tracing::info!(session = %self.session_id, "sidekick cleaned up");
        }
        self.tool_names.clear();
    }
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
