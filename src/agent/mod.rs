//! Agent module - the worker / tools / evaluator loop
//!
//! [`Sidekick`] owns setup and teardown; [`SuperstepController`] drives a
//! single run through the worker, tool and evaluator steps.

pub mod capability;
pub mod checkpoint;
pub mod controller;
pub mod evaluator;
pub mod sidekick;
pub mod state;
pub mod tool_step;
pub mod worker;

pub use capability::{
    EvaluatorModel, EvaluatorVerdict, LlmEvaluator, LlmWorker, WorkerModel, WorkerReply,
};
pub use checkpoint::{InMemoryRunStore, RunStore, Snapshot};
pub use controller::{Phase, RunLimits, RunOutcome, RunStatus, SuperstepController};
pub use evaluator::EvaluatorStep;
pub use sidekick::{default_providers, Sidekick};
pub use state::ConversationState;
pub use tool_step::ToolExecutionStep;
pub use worker::{is_clarifying_question, WorkerStep};
