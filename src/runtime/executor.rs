//! Chat session executor

use super::SessionError;
use crate::llm::{Creativity, GenerationParameters, LlmService};
use crate::state_machine::{transition, Effect, Event, SessionState};
use crate::transcript::Transcript;

/// One conversation: its state, its tuning, and the provider it talks to.
///
/// Each operation feeds an event through the pure transition function and
/// runs the resulting effects. Submission takes `&mut self` for the whole
/// round trip, so a second message cannot start before the first resolves.
pub struct ChatSession<L: LlmService> {
    state: SessionState,
    params: GenerationParameters,
    llm: L,
}

impl<L: LlmService> ChatSession<L> {
    pub fn new(llm: L, params: GenerationParameters) -> Self {
        Self {
            state: SessionState::new(),
            params,
            llm,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> crate::state_machine::SessionPhase {
        self.state.phase
    }

    pub fn transcript(&self) -> &Transcript {
        &self.state.transcript
    }

    pub fn params(&self) -> &GenerationParameters {
        &self.params
    }

    /// Persona for the next `start`. A running conversation keeps the
    /// persona it was started with.
    pub fn set_persona(&mut self, persona: impl Into<String>) {
        self.params.persona = persona.into();
    }

    /// Applies from the next request on
    pub fn set_creativity(&mut self, creativity: Creativity) {
        self.params.creativity = creativity;
    }

    /// Begin a conversation with the current persona
    pub async fn start(&mut self) -> Result<(), SessionError> {
        let persona = self.params.persona.clone();
        self.process(Event::Start { persona }).await?;
        tracing::info!(persona = %self.params.persona, "Conversation started");
        Ok(())
    }

    /// Send a user message and wait for the reply.
    ///
    /// On failure the message is removed from the transcript again and
    /// returned inside the error so the caller can offer it for retry.
    pub async fn submit(&mut self, text: impl Into<String>) -> Result<String, SessionError> {
        let reply = self.process(Event::UserMessage { text: text.into() }).await?;
        reply.ok_or(SessionError::NoReply)
    }

    /// Drop the conversation and return to `NotStarted`
    pub async fn reset(&mut self) -> Result<(), SessionError> {
        self.process(Event::Reset).await?;
        tracing::info!("Conversation reset");
        Ok(())
    }

    /// Run an event and every event its effects generate.
    ///
    /// Transitions apply to a working copy; `self.state` is only replaced
    /// once no request is in flight. Dropping the returned future mid-request
    /// therefore leaves the session as it was before the call.
    async fn process(&mut self, event: Event) -> Result<Option<String>, SessionError> {
        let mut state = self.state.clone();
        let mut events_to_process = vec![event];
        let mut reply = None;
        let mut failure = None;

        while let Some(current_event) = events_to_process.pop() {
            let event_name = current_event.name();
            let result = transition(&state, current_event)?;

            tracing::debug!(
                event = event_name,
                from = state.phase.as_str(),
                to = result.new_state.phase.as_str(),
                "Session transition"
            );
            state = result.new_state;

            for effect in result.effects {
                match effect {
                    Effect::RequestCompletion => {
                        events_to_process.push(self.request_completion(&state.transcript).await);
                    }
                    Effect::DeliverReply { text } => reply = Some(text),
                    Effect::ReportFailure { error, discarded } => {
                        tracing::warn!(
                            kind = error.kind().as_str(),
                            discarded_chars = discarded.chars().count(),
                            "Completion failed; user turn rolled back"
                        );
                        failure = Some(SessionError::Completion { error, discarded });
                    }
                }
            }
        }

        self.state = state;
        match failure {
            Some(error) => Err(error),
            None => Ok(reply),
        }
    }

    async fn request_completion(&self, transcript: &Transcript) -> Event {
        match self.llm.complete(transcript, &self.params).await {
            Ok(text) => Event::CompletionSucceeded { text },
            Err(error) => Event::CompletionFailed { error },
        }
    }
}
