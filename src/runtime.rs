//! Runtime for executing chat sessions

mod executor;

pub use executor::ChatSession;

use crate::llm::CompletionError;
use crate::state_machine::TransitionError;
use thiserror::Error;

/// Errors surfaced to whoever drives a session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Rejected locally; the session is unchanged
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The provider call failed and `discarded` was rolled back
    #[error("{error}")]
    Completion {
        #[source]
        error: CompletionError,
        discarded: String,
    },

    #[error("Completion finished without a reply")]
    NoReply,
}
