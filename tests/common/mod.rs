//! Scripted models and tools shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use sidekick::agent::{
    EvaluatorModel, EvaluatorStep, EvaluatorVerdict, InMemoryRunStore, RunLimits,
    SuperstepController, ToolExecutionStep, WorkerModel, WorkerReply, WorkerStep,
};
use sidekick::core::{Message, Result, SidekickError, ToolCall};
use sidekick::tools::{Tool, ToolOutput, ToolProvider, ToolRegistry};

/// Worker that replays scripted replies and records every input it sees
pub struct ScriptedWorker {
    replies: Mutex<VecDeque<Result<WorkerReply>>>,
    fallback: WorkerReply,
    delay: Option<Duration>,
    pub inputs: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedWorker {
    pub fn new(replies: Vec<Result<WorkerReply>>) -> Arc<Self> {
        Self::build(replies, WorkerReply::Answer("still working".to_string()), None)
    }

    /// Replies with the same thing forever
    pub fn always(reply: WorkerReply) -> Arc<Self> {
        Self::build(Vec::new(), reply, None)
    }

    /// Sleeps before every reply
    pub fn slow(delay: Duration) -> Arc<Self> {
        Self::build(Vec::new(), WorkerReply::Answer("late".to_string()), Some(delay))
    }

    fn build(replies: Vec<Result<WorkerReply>>, fallback: WorkerReply, delay: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            fallback,
            delay,
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }
}

#[async_trait]
impl WorkerModel for ScriptedWorker {
    async fn respond(&self, messages: &[Message]) -> Result<WorkerReply> {
        self.inputs.lock().unwrap().push(messages.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

/// Evaluator that replays scripted verdicts; once exhausted it keeps
/// rejecting without asking for input
pub struct ScriptedEvaluator {
    verdicts: Mutex<VecDeque<Result<EvaluatorVerdict>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedEvaluator {
    pub fn new(verdicts: Vec<Result<EvaluatorVerdict>>) -> Arc<Self> {
        Arc::new(Self {
            verdicts: Mutex::new(verdicts.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn never_satisfied() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl EvaluatorModel for ScriptedEvaluator {
    async fn judge(&self, _system: &str, prompt: &str) -> Result<EvaluatorVerdict> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.verdicts.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(reject("keep going")))
    }
}

pub fn accept(feedback: &str) -> EvaluatorVerdict {
    EvaluatorVerdict {
        feedback: feedback.to_string(),
        success_criteria_met: true,
        user_input_needed: false,
    }
}

pub fn reject(feedback: &str) -> EvaluatorVerdict {
    EvaluatorVerdict {
        feedback: feedback.to_string(),
        success_criteria_met: false,
        user_input_needed: false,
    }
}

pub fn tool_request(name: &str, args: serde_json::Value) -> WorkerReply {
    WorkerReply::ToolRequests {
        content: String::new(),
        calls: vec![ToolCall::generated(name, args)],
    }
}

pub fn answer(text: &str) -> Result<WorkerReply> {
    Ok(WorkerReply::Answer(text.to_string()))
}

/// Tool that returns a fixed string and counts its calls
pub struct CountingTool {
    name: &'static str,
    reply: &'static str,
    pub calls: AtomicUsize,
}

impl CountingTool {
    pub fn new(name: &'static str, reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for CountingTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Returns a canned reply"
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn call(&self, _arguments: &serde_json::Value) -> Result<ToolOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ToolOutput::text(self.reply))
    }
}

/// Tool that always raises
pub struct BrokenTool;

#[async_trait]
impl Tool for BrokenTool {
    fn name(&self) -> &str {
        "flaky_api"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn call(&self, _arguments: &serde_json::Value) -> Result<ToolOutput> {
        Err(SidekickError::tool("flaky_api", "upstream returned 503"))
    }
}

/// Provider exposing fixed tools and counting cleanups
pub struct StaticProvider {
    name: &'static str,
    tools: Vec<Arc<dyn Tool>>,
    fail: bool,
    pub cleanups: AtomicUsize,
}

impl StaticProvider {
    pub fn new(name: &'static str, tools: Vec<Arc<dyn Tool>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            tools,
            fail: false,
            cleanups: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            tools: Vec::new(),
            fail: true,
            cleanups: AtomicUsize::new(0),
        })
    }

    pub fn cleanup_count(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolProvider for StaticProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn tools(&self) -> Result<Vec<Arc<dyn Tool>>> {
        if self.fail {
            return Err(SidekickError::provider_init(self.name, "binary not installed"));
        }
        Ok(self.tools.clone())
    }

    async fn cleanup(&self) {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
    }
}

/// Build a controller over scripted models and the given tools
pub fn controller(
    worker: Arc<ScriptedWorker>,
    evaluator: Arc<ScriptedEvaluator>,
    tools: Vec<Arc<dyn Tool>>,
    limits: RunLimits,
) -> (SuperstepController, InMemoryRunStore) {
    let mut registry = ToolRegistry::new();
    let mut names = Vec::new();
    for tool in tools {
        names.push(tool.name().to_string());
        registry.register(tool);
    }

    let store = InMemoryRunStore::new();
    let controller = SuperstepController::new(
        WorkerStep::new(worker, names),
        ToolExecutionStep::new(registry),
        EvaluatorStep::new(evaluator),
        Arc::new(store.clone()),
        limits,
    );
    (controller, store)
}

pub fn limits(max_supersteps: usize) -> RunLimits {
    RunLimits::new(max_supersteps, 5, Duration::from_secs(10))
}
