//! Conversation transcript
//!
//! An ordered list of turns: one system instruction naming the persona,
//! followed by alternating user and assistant turns. The transcript has no
//! knowledge of the network; it only enforces how it may be extended.


use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Speaker of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Role name as it appears on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single utterance. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    text: String,
}

impl Turn {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Errors from local transcript validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("Please enter a celebrity name")]
    InvalidPersona,
    #[error("Message must not be empty")]
    EmptyMessage,
    #[error("No unanswered user turn to roll back")]
    NothingToRollback,
}

/// Build the system instruction for a persona.
pub fn persona_instruction(persona: &str) -> String {
    format!(
        "You are {persona}. Embody their personality, speaking patterns, and viewpoints. \
         Keep responses conversational and engaging while maintaining their authentic voice. \
         Limit responses to 2-3 sentences for natural conversation flow."
    )
}

/// Ordered sequence of turns.
///
/// Index 0, when present, is always the system turn written by
/// [`Transcript::start`]; nothing can replace or remove it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Begin a conversation with `persona`.
    pub fn start(persona: &str) -> Result<Self, TranscriptError> {
        if persona.trim().is_empty() {
            return Err(TranscriptError::InvalidPersona);
        }

        Ok(Self {
            turns: vec![Turn {
                role: Role::System,
                text: persona_instruction(persona),
            }],
        })
    }

    /// An empty transcript, as held by a session that has not started.
    pub fn reset() -> Self {
        Self::default()
    }

    /// Append a user turn. On error the transcript is left untouched.
    pub fn append_user(&mut self, text: impl Into<String>) -> Result<(), TranscriptError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TranscriptError::EmptyMessage);
        }
        self.turns.push(Turn {
            role: Role::User,
            text,
        });
        Ok(())
    }

    /// Append an assistant turn. Provider output is trusted verbatim.
    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.turns.push(Turn {
            role: Role::Assistant,
            text: text.into(),
        });
    }

    /// Remove the last turn if it is a user turn, returning it.
    pub fn rollback_last_user(&mut self) -> Result<Turn, TranscriptError> {
        match self.last() {
            Some(turn) if turn.role == Role::User => {
                self.turns.pop().ok_or(TranscriptError::NothingToRollback)
            }
            _ => Err(TranscriptError::NothingToRollback),
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// True when the transcript opens with the system turn and ends with a
    /// user turn still waiting for a reply.
    pub fn awaits_reply(&self) -> bool {
        matches!(self.turns.first(), Some(t) if t.role == Role::System)
            && matches!(self.last(), Some(t) if t.role == Role::User)
    }

    /// Text of the most recent user turn
    #[cfg(test)]
    pub fn last_user_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(Turn::text)
    }
}
