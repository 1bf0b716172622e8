//! Session state types

use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};

/// Where a conversation session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No persona chosen yet; the transcript is empty
    #[default]
    NotStarted,

    /// Ready for the next user message
    Active,

    /// A user turn has been appended and its completion is in flight
    AwaitingCompletion,
}

impl SessionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::NotStarted => "not_started",
            SessionPhase::Active => "active",
            SessionPhase::AwaitingCompletion => "awaiting_completion",
        }
    }
}

/// Full session state: lifecycle phase plus the transcript it owns
///
/// `NotStarted` always holds an empty transcript; the other phases hold
/// one that begins with the system turn. `AwaitingCompletion` additionally
/// ends with the user turn being answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub transcript: Transcript,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_phase(phase: SessionPhase, transcript: Transcript) -> Self {
        Self { phase, transcript }
    }
}
