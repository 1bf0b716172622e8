//! Pure state transition function
//!
//! Given a state and an event, compute the next state and the effects the
//! runtime must carry out. No I/O happens here.

use super::{Effect, Event, SessionPhase, SessionState};
use crate::transcript::{Transcript, TranscriptError};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("No conversation in progress; start one first")]
    NotStarted,
    #[error("A conversation is already in progress; reset it first")]
    AlreadyStarted,
    #[error("Still waiting for the previous reply")]
    Busy,
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// On error the caller keeps its current state; nothing has changed.
pub fn transition(state: &SessionState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state.phase, event) {
        // ============================================================
        // Session lifecycle
        // ============================================================

        // NotStarted + Start -> Active with only the system turn
        (SessionPhase::NotStarted, Event::Start { persona }) => {
            debug_assert!(state.transcript.is_empty());
            let transcript = Transcript::start(&persona)?;
            Ok(TransitionResult::new(SessionState::with_phase(
                SessionPhase::Active,
                transcript,
            )))
        }

        (SessionPhase::Active, Event::Start { .. }) => Err(TransitionError::AlreadyStarted),

        // Reset discards the transcript; repeating it is harmless
        (SessionPhase::NotStarted | SessionPhase::Active, Event::Reset) => {
            Ok(TransitionResult::new(SessionState::with_phase(
                SessionPhase::NotStarted,
                Transcript::reset(),
            )))
        }

        // ============================================================
        // User messages
        // ============================================================

        // Active + UserMessage -> AwaitingCompletion
        (SessionPhase::Active, Event::UserMessage { text }) => {
            let mut transcript = state.transcript.clone();
            transcript.append_user(text)?;
            Ok(TransitionResult::new(SessionState::with_phase(
                SessionPhase::AwaitingCompletion,
                transcript,
            ))
            .with_effect(Effect::RequestCompletion))
        }

        (SessionPhase::NotStarted, Event::UserMessage { .. }) => Err(TransitionError::NotStarted),

        // Nothing else may touch the transcript while a request is in flight
        (
            SessionPhase::AwaitingCompletion,
            Event::Start { .. } | Event::UserMessage { .. } | Event::Reset,
        ) => Err(TransitionError::Busy),

        // ============================================================
        // Completion results
        // ============================================================

        // AwaitingCompletion + success -> Active with the reply appended
        (SessionPhase::AwaitingCompletion, Event::CompletionSucceeded { text }) => {
            let mut transcript = state.transcript.clone();
            transcript.append_assistant(text.clone());
            Ok(TransitionResult::new(SessionState::with_phase(
                SessionPhase::Active,
                transcript,
            ))
            .with_effect(Effect::deliver_reply(text)))
        }

        // AwaitingCompletion + failure -> Active with the user turn removed
        (SessionPhase::AwaitingCompletion, Event::CompletionFailed { error }) => {
            let mut transcript = state.transcript.clone();
            let discarded = transcript.rollback_last_user()?;
            Ok(TransitionResult::new(SessionState::with_phase(
                SessionPhase::Active,
                transcript,
            ))
            .with_effect(Effect::report_failure(error, discarded.into_text())))
        }

        (
            phase @ (SessionPhase::NotStarted | SessionPhase::Active),
            event @ (Event::CompletionSucceeded { .. } | Event::CompletionFailed { .. }),
        ) => Err(TransitionError::InvalidTransition(format!(
            "{} while {}: no completion pending",
            event.name(),
            phase.as_str()
        ))),
    }
}
