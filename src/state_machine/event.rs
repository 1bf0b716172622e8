//! Events that can occur in a session

use crate::llm::CompletionError;

/// Events that trigger state transitions
#[derive(Debug)]
pub enum Event {
    // User events
    Start { persona: String },
    UserMessage { text: String },
    Reset,

    // Completion events
    CompletionSucceeded { text: String },
    CompletionFailed { error: CompletionError },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start { .. } => "start",
            Event::UserMessage { .. } => "user_message",
            Event::Reset => "reset",
            Event::CompletionSucceeded { .. } => "completion_succeeded",
            Event::CompletionFailed { .. } => "completion_failed",
        }
    }
}
