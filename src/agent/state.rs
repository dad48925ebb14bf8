//! Conversation state threaded through one run
//!
//! Owned exclusively by the controller for the duration of a run. Snapshots
//! of it are what the run store keeps between runs of a session.

use serde::{Deserialize, Serialize};

use crate::core::{HistoryEntry, HistoryRole, Message, Role};

/// State of one run of the superstep loop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Messages in causal order
    pub messages: Vec<Message>,
    /// What the answer must satisfy; fixed at run start
    pub success_criteria: String,
    /// Latest evaluator feedback, read by the next worker step
    pub feedback_on_work: Option<String>,
    /// Set by the evaluator
    pub success_criteria_met: bool,
    /// Set by the evaluator
    pub user_input_needed: bool,
    /// Index of this run's user message; earlier entries belong to
    /// previous runs of the session
    #[serde(default)]
    run_start: usize,
}

impl ConversationState {
    /// Start a fresh run seeded with the user's message
    pub fn new(user_message: impl Into<String>, success_criteria: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(user_message)],
            success_criteria: success_criteria.into(),
            ..Self::default()
        }
    }

    /// Continue a session: earlier messages are kept, the per-run fields
    /// are reset
    pub fn resume(
        previous: ConversationState,
        user_message: impl Into<String>,
        success_criteria: impl Into<String>,
    ) -> Self {
        let mut messages = previous.messages;
        let run_start = messages.len();
        messages.push(Message::user(user_message));
        Self {
            messages,
            success_criteria: success_criteria.into(),
            run_start,
            ..Self::default()
        }
    }

    /// Append a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Install the system prompt, replacing the existing system entry in
    /// place or prepending one if there is none
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        let existing: Vec<usize> = self
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.role == Role::System)
            .map(|(i, _)| i)
            .collect();

        match existing.split_first() {
            Some((&first, stale)) => {
                self.messages[first] = Message::system(prompt);
                for &i in stale.iter().rev() {
                    self.messages.remove(i);
                    if i < self.run_start {
                        self.run_start -= 1;
                    }
                }
            }
            None => {
                self.messages.insert(0, Message::system(prompt));
                self.run_start += 1;
            }
        }
    }

    /// Number of system entries
    pub fn system_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == Role::System)
            .count()
    }

    /// The last message, if any
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Whether the evaluator has ended the run
    pub fn is_finished(&self) -> bool {
        self.success_criteria_met || self.user_input_needed
    }

    /// Messages produced by the current run, starting at its user message
    pub fn run_messages(&self) -> &[Message] {
        &self.messages[self.run_start.min(self.messages.len())..]
    }

    /// Most recent assistant text of this run that is not evaluator
    /// commentary
    pub fn last_answer(&self) -> Option<&Message> {
        self.run_messages().iter().rev().find(|m| {
            m.role == Role::Assistant && !m.is_evaluator_feedback() && !m.content.trim().is_empty()
        })
    }

    /// Most recent evaluator-tagged message of this run
    pub fn last_evaluator_entry(&self) -> Option<&Message> {
        self.run_messages().iter().rev().find(|m| m.is_evaluator_feedback())
    }

    /// Build the caller-visible history for this run: prior history, the
    /// user message, then this run's answer and evaluator feedback when
    /// present
    pub fn transcript(&self, prior: &[HistoryEntry], user_message: &str) -> Vec<HistoryEntry> {
        let mut history = prior.to_vec();
        history.push(HistoryEntry::user(user_message));

        if let Some(answer) = self.last_answer() {
            history.push(HistoryEntry::assistant(answer.content.clone()));
        }
        if let Some(feedback) = self.last_evaluator_entry() {
            history.push(HistoryEntry::assistant(feedback.content.clone()));
        }

        history
    }

    /// Render the exchange for the evaluator. Tool traffic is summarized.
    pub fn format_conversation(&self) -> String {
        let mut out = String::from("Conversation history:\n\n");
        for message in &self.messages {
            match message.role {
                Role::User => {
                    out.push_str(&format!("User: {}\n", message.content));
                }
                Role::Assistant => {
                    let text = if message.content.trim().is_empty() {
                        "[Tool usage]"
                    } else {
                        message.content.as_str()
                    };
                    out.push_str(&format!("Assistant: {}\n", text));
                }
                Role::System | Role::Tool => {}
            }
        }
        out
    }
}

/// Failure transcript: prior history, the user message and a synthetic
/// assistant turn explaining what went wrong
pub fn error_transcript(
    prior: &[HistoryEntry],
    user_message: &str,
    reason: &str,
) -> Vec<HistoryEntry> {
    let mut history = prior.to_vec();
    history.push(HistoryEntry::user(user_message));
    history.push(HistoryEntry {
        role: HistoryRole::Assistant,
        content: format!("I encountered an error: {}", reason),
    });
    history
}
