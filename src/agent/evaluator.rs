//! Evaluator step - judges the worker's latest answer

use std::sync::Arc;

use crate::agent::capability::{EvaluatorModel, EvaluatorVerdict};
use crate::agent::state::ConversationState;
use crate::core::Message;

const EVALUATOR_SYSTEM_PROMPT: &str = "You are an evaluator that determines if a task has been completed successfully by an Assistant.
Assess the Assistant's last response based on the given criteria. Respond with your feedback, and with your decision on whether the success criteria has been met,
and whether more input is needed from the user.";

/// Produces verdicts and records them on the state
pub struct EvaluatorStep {
    model: Arc<dyn EvaluatorModel>,
}

impl EvaluatorStep {
    pub fn new(model: Arc<dyn EvaluatorModel>) -> Self {
        Self { model }
    }

    pub fn system_prompt(&self) -> &'static str {
        EVALUATOR_SYSTEM_PROMPT
    }

    /// Build the user-turn prompt for the current state
    pub fn user_prompt(&self, state: &ConversationState) -> String {
        let last_response = state
            .last_message()
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let mut prompt = format!(
            "You are evaluating a conversation between the User and Assistant. You decide what action to take based on the last response from the Assistant.

The entire conversation with the assistant, with the user's original request and all replies, is:
{conversation}

The success criteria for this assignment is:
{criteria}

And the final response from the Assistant that you are evaluating is:
{last_response}

Respond with your feedback, and decide if the success criteria is met by this response.
Also, decide if more user input is required, either because the assistant has a question, needs clarification, or seems to be stuck and unable to answer without help.

If the Assistant says they have completed a task using tools, you should generally trust them unless the response is clearly inadequate.
Overall you should give the Assistant the benefit of the doubt if they say they've done something. But you should reject if you feel that more work should go into this.
",
            conversation = state.format_conversation(),
            criteria = state.success_criteria,
        );

        if let Some(feedback) = &state.feedback_on_work {
            prompt.push_str(&format!(
                "\nAlso, note that in a prior attempt from the Assistant, you provided this feedback: {feedback}\n"
            ));
            prompt.push_str(
                "If you're seeing the Assistant repeating the same mistakes, then consider responding that user input is required.",
            );
        }

        prompt
    }

    /// Judge the latest answer and apply the verdict to the state.
    ///
    /// Never fails: an unusable evaluation yields a verdict that stops the
    /// run and asks for user input.
    pub async fn evaluate(&self, state: &mut ConversationState) -> EvaluatorVerdict {
        let prompt = self.user_prompt(state);

        let verdict = match self.model.judge(self.system_prompt(), &prompt).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(error = %e, "evaluator failed, asking for user input");
                EvaluatorVerdict::failed(e)
            }
        };

        state.push(Message::evaluator_feedback(&verdict.feedback));
        state.feedback_on_work = Some(verdict.feedback.clone());
        state.success_criteria_met = verdict.success_criteria_met;
        state.user_input_needed = verdict.user_input_needed;

        verdict
    }
}
