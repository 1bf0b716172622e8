//! Completion error types

use thiserror::Error;

/// Failure of a single completion round trip
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Credential missing, or rejected with 401/403
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Connection refused, timeout, DNS failure and the like
    #[error("Transport failure: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Any other non-success status
    #[error("Provider returned HTTP {status}: {message}")]
    Provider {
        status: u16,
        message: String,
        body: String,
    },

    /// Success status, but no generated message could be found
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String, body: String },

    /// Transcript was not in the shape a request needs
    #[error("Invalid transcript: {0}")]
    InvalidTranscript(String),
}

impl CompletionError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn provider(status: u16, message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Provider {
            status,
            message: message.into(),
            body: body.into(),
        }
    }

    pub fn malformed(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
            body: body.into(),
        }
    }

    pub fn kind(&self) -> CompletionErrorKind {
        match self {
            Self::Authentication { .. } => CompletionErrorKind::Authentication,
            Self::Transport { .. } => CompletionErrorKind::Transport,
            Self::Provider { .. } => CompletionErrorKind::Provider,
            Self::MalformedResponse { .. } => CompletionErrorKind::MalformedResponse,
            Self::InvalidTranscript(_) => CompletionErrorKind::InvalidTranscript,
        }
    }

    /// HTTP status, when the provider answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error classification for logging and display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionErrorKind {
    Authentication,
    Transport,
    Provider,
    MalformedResponse,
    InvalidTranscript,
}

impl CompletionErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Transport => "transport",
            Self::Provider => "provider",
            Self::MalformedResponse => "malformed_response",
            Self::InvalidTranscript => "invalid_transcript",
        }
    }
}
