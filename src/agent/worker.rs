//! Worker step - asks the worker model for the next message

use std::sync::Arc;

use crate::agent::capability::{WorkerModel, WorkerReply};
use crate::agent::state::ConversationState;

/// Prefix the worker is told to use when it needs the user's help
pub const QUESTION_PREFIX: &str = "Question:";

/// Whether an answer is a clarifying question for the user.
///
/// This is a heuristic: it relies on the model following the prompt's
/// `Question:` convention and cannot be relied on as a contract.
pub fn is_clarifying_question(text: &str) -> bool {
    text.lines()
        .any(|line| line.trim_start().starts_with(QUESTION_PREFIX))
}

/// Produces answers or tool requests from the worker model
pub struct WorkerStep {
    model: Arc<dyn WorkerModel>,
    tool_names: Vec<String>,
}

impl WorkerStep {
    pub fn new(model: Arc<dyn WorkerModel>, tool_names: Vec<String>) -> Self {
        Self { model, tool_names }
    }

    /// Build the system prompt for the current state
    pub fn system_prompt(&self, state: &ConversationState, timestamp: &str) -> String {
        let tools_line = if self.tool_names.is_empty() {
            "You have no tools available for this task, so answer from your own knowledge.".to_string()
        } else {
            format!(
                "You have access to various tools to help you: {}.",
                self.tool_names.join(", ")
            )
        };

        let mut prompt = format!(
            "You are a helpful assistant that can use tools to complete tasks.
You keep working on a task until either you have a question or clarification for the user, or the success criteria is met.
{tools_line}
When using the Python tool, remember to include print() statements if you want to see output.
The current date and time is {timestamp}

This is the success criteria:
{criteria}

You should reply either with a question for the user about this assignment, or with your final response.
If you have a question for the user, you need to reply by clearly stating your question. An example might be:

{QUESTION_PREFIX} Please clarify whether you want a summary or a detailed answer

If you've finished, reply with the final answer, and don't ask a question; simply reply with the answer.
",
            criteria = state.success_criteria,
        );

        if let Some(feedback) = &state.feedback_on_work {
            prompt.push_str(&format!(
                "
Previously you thought you completed the assignment, but your reply was rejected because the success criteria was not met.
Here is the feedback on why this was rejected:
{feedback}
With this feedback, please continue the assignment, ensuring that you meet the success criteria or have a question for the user."
            ));
        }

        prompt
    }

    /// Install the system prompt and ask the model for the next message.
    ///
    /// A failed model call becomes an assistant answer describing the
    /// error so the run can still reach the evaluator.
    pub async fn act(&self, state: &mut ConversationState) -> WorkerReply {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let prompt = self.system_prompt(state, &timestamp);
        state.set_system_prompt(prompt);

        match self.model.respond(&state.messages).await {
            Ok(WorkerReply::Answer(text)) => {
                if is_clarifying_question(&text) {
                    tracing::info!("worker asked a clarifying question");
                }
                WorkerReply::Answer(text)
            }
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "worker call failed");
                WorkerReply::Answer(format!("Error in worker: {}", e))
            }
        }
    }
}
