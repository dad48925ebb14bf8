//! Superstep controller - the worker / tools / evaluator state machine
//!
//! ```text
//! start -> WORKER
//! WORKER -> TOOLS       reply has tool requests and the registry is non-empty
//! WORKER -> EVALUATOR   otherwise
//! TOOLS -> WORKER
//! EVALUATOR -> DONE     criteria met or user input needed
//! EVALUATOR -> WORKER   otherwise
//! ```
//!
//! A run is bounded by a superstep cap, a per-superstep tool round cap and a
//! wall-clock timeout covering the whole run.

use std::sync::Arc;
use std::time::Duration;

use crate::agent::capability::WorkerReply;
use crate::agent::checkpoint::{RunStore, Snapshot};
use crate::agent::evaluator::EvaluatorStep;
use crate::agent::state::{error_transcript, ConversationState};
use crate::agent::tool_step::ToolExecutionStep;
use crate::agent::worker::WorkerStep;
use crate::core::config::AgentConfig;
use crate::core::{HistoryEntry, Message, Result, SidekickError, ToolCall};

/// Bounds applied to every run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    /// Maximum worker -> evaluator traversals
    pub max_supersteps: usize,
    /// Maximum TOOLS visits within one superstep
    pub max_tool_rounds: usize,
    /// Wall-clock budget for the whole run
    pub timeout: Duration,
}

impl RunLimits {
    pub fn new(max_supersteps: usize, max_tool_rounds: usize, timeout: Duration) -> Self {
        Self {
            max_supersteps: max_supersteps.max(1),
            max_tool_rounds: max_tool_rounds.max(1),
            timeout,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(
            config.max_supersteps,
            config.max_tool_rounds,
            config.run_timeout(),
        )
    }
}

impl Default for RunLimits {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}

/// States of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Worker,
    Tools,
    Evaluator,
    Done,
}

/// How a run ended
#[derive(Debug)]
pub enum RunStatus {
    CriteriaMet,
    UserInputNeeded,
    /// The run hit a bound or failed; its state changes were discarded
    Aborted(SidekickError),
}

/// Result of one run
#[derive(Debug)]
pub struct RunOutcome {
    /// Prior history plus this run's entries
    pub history: Vec<HistoryEntry>,
    pub status: RunStatus,
    /// Evaluator invocations performed
    pub supersteps: usize,
    /// Phases visited, in order
    pub trace: Vec<Phase>,
    /// State at the point the run stopped
    pub final_state: ConversationState,
}

impl RunOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self.status, RunStatus::Aborted(_))
    }

    /// Number of times a phase was visited
    pub fn visits(&self, phase: Phase) -> usize {
        self.trace.iter().filter(|&&p| p == phase).count()
    }
}

#[derive(Default)]
struct Progress {
    trace: Vec<Phase>,
    supersteps: usize,
}

/// Drives runs through the state machine
pub struct SuperstepController {
    worker: WorkerStep,
    tools: ToolExecutionStep,
    evaluator: EvaluatorStep,
    store: Arc<dyn RunStore>,
    limits: RunLimits,
}

impl SuperstepController {
    pub fn new(
        worker: WorkerStep,
        tools: ToolExecutionStep,
        evaluator: EvaluatorStep,
        store: Arc<dyn RunStore>,
        limits: RunLimits,
    ) -> Self {
        Self {
            worker,
            tools,
            evaluator,
            store,
            limits,
        }
    }

    pub fn limits(&self) -> RunLimits {
        self.limits
    }

    pub fn tools(&self) -> &ToolExecutionStep {
        &self.tools
    }

    /// Run one user message to completion within a session.
    ///
    /// Never fails: bound violations and internal errors produce an
    /// aborted outcome whose history ends with an explanatory turn.
    pub async fn run(
        &self,
        session_id: &str,
        user_message: &str,
        success_criteria: &str,
        prior_history: &[HistoryEntry],
    ) -> RunOutcome {
        let previous = match self.store.load(session_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(session = %session_id, error = %e, "could not load session snapshot, starting fresh");
                None
            }
        };

        let mut state = match &previous {
            Some(snapshot) => {
                ConversationState::resume(snapshot.state.clone(), user_message, success_criteria)
            }
            None => ConversationState::new(user_message, success_criteria),
        };

        tracing::info!(
            session = %session_id,
            resumed = previous.is_some(),
            max_supersteps = self.limits.max_supersteps,
            "run started"
        );

        let mut progress = Progress::default();
        let result = tokio::time::timeout(
            self.limits.timeout,
            self.drive(session_id, &mut state, &mut progress),
        )
        .await
        .unwrap_or(Err(SidekickError::Timeout(self.limits.timeout)));

        match result {
            Ok(()) => {
                let status = if state.success_criteria_met {
                    RunStatus::CriteriaMet
                } else {
                    RunStatus::UserInputNeeded
                };
                tracing::info!(
                    session = %session_id,
                    supersteps = progress.supersteps,
                    status = ?status,
                    "run finished"
                );

                RunOutcome {
                    history: state.transcript(prior_history, user_message),
                    status,
                    supersteps: progress.supersteps,
                    trace: progress.trace,
                    final_state: state,
                }
            }
            Err(e) => {
                tracing::error!(session = %session_id, supersteps = progress.supersteps, error = %e, "run aborted");
                self.rollback(session_id, previous).await;

                RunOutcome {
                    history: error_transcript(prior_history, user_message, &e.to_string()),
                    status: RunStatus::Aborted(e),
                    supersteps: progress.supersteps,
                    trace: progress.trace,
                    final_state: state,
                }
            }
        }
    }

    async fn drive(
        &self,
        session_id: &str,
        state: &mut ConversationState,
        progress: &mut Progress,
    ) -> Result<()> {
        let mut phase = Phase::Worker;
        let mut tool_rounds = 0;
        let mut pending: Vec<ToolCall> = Vec::new();

        loop {
            progress.trace.push(phase);

            phase = match phase {
                Phase::Worker => match self.worker.act(state).await {
                    WorkerReply::ToolRequests { content, calls } if self.tools.has_tools() => {
                        state.push(Message::assistant_with_tools(content, calls.clone()));
                        pending = calls;
                        Phase::Tools
                    }
                    WorkerReply::ToolRequests { content, calls } => {
                        // No tool results will follow, so the calls are not recorded
                        tracing::warn!(session = %session_id, calls = calls.len(), "no tools available, ignoring tool requests");
                        state.push(Message::assistant(content));
                        Phase::Evaluator
                    }
                    reply => {
                        state.push(reply.into_message());
                        Phase::Evaluator
                    }
                },
                Phase::Tools => {
                    tool_rounds += 1;
                    if tool_rounds > self.limits.max_tool_rounds {
                        return Err(SidekickError::ToolRoundLimit(self.limits.max_tool_rounds));
                    }

                    tracing::debug!(session = %session_id, round = tool_rounds, calls = pending.len(), "running tools");
                    for message in self.tools.execute(&pending).await {
                        state.push(message);
                    }
                    pending.clear();
                    Phase::Worker
                }
                Phase::Evaluator => {
                    progress.supersteps += 1;
                    tool_rounds = 0;

                    let verdict = self.evaluator.evaluate(state).await;
                    tracing::info!(
                        session = %session_id,
                        superstep = progress.supersteps,
                        criteria_met = verdict.success_criteria_met,
                        user_input_needed = verdict.user_input_needed,
                        "evaluation complete"
                    );

                    let snapshot = Snapshot::new(session_id, state.clone(), progress.supersteps);
                    if let Err(e) = self.store.save(&snapshot).await {
                        tracing::warn!(session = %session_id, error = %e, "could not save session snapshot");
                    }

                    if state.is_finished() {
                        Phase::Done
                    } else if progress.supersteps >= self.limits.max_supersteps {
                        return Err(SidekickError::SuperstepLimit(self.limits.max_supersteps));
                    } else {
                        Phase::Worker
                    }
                }
                Phase::Done => return Ok(()),
            };
        }
    }

    async fn rollback(&self, session_id: &str, previous: Option<Snapshot>) {
        let restored = match previous {
            Some(snapshot) => self.store.save(&snapshot).await,
            None => self.store.remove(session_id).await,
        };
        if let Err(e) = restored {
            tracing::warn!(session = %session_id, error = %e, "could not roll back session snapshot");
        }
    }
}
