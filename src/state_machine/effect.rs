//! Effects produced by state transitions

use crate::llm::CompletionError;

/// Effects to be executed after state transition
#[derive(Debug)]
pub enum Effect {
    /// Send the current transcript to the completion service
    RequestCompletion,

    /// Hand a reply to the caller
    DeliverReply { text: String },

    /// Report a failed completion. `discarded` is the user text that was
    /// rolled back out of the transcript.
    ReportFailure {
        error: CompletionError,
        discarded: String,
    },
}

impl Effect {
    pub fn deliver_reply(text: impl Into<String>) -> Self {
        Effect::DeliverReply { text: text.into() }
    }

    pub fn report_failure(error: CompletionError, discarded: impl Into<String>) -> Self {
        Effect::ReportFailure {
            error,
            discarded: discarded.into(),
        }
    }
}
