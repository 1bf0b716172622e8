//! Common types for completion requests

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default cap on generated length
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

/// Upper bound of the creativity scale
pub const MAX_CREATIVITY: f32 = 10.0;

/// Divisor taking creativity onto the provider's temperature range [0, 2]
const CREATIVITY_PER_TEMPERATURE: f32 = 5.0;

/// User-facing creativity control, 0 to 10 inclusive
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Creativity(f32);

/// Rejected creativity input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CreativityError {
    #[error("Please enter a number between 0 and 10.")]
    OutOfRange(f32),
    #[error("Please enter a valid number between 0 and 10.")]
    NotANumber(String),
}

impl Creativity {
    pub fn new(value: f32) -> Result<Self, CreativityError> {
        if (0.0..=MAX_CREATIVITY).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CreativityError::OutOfRange(value))
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Sampling temperature sent to the provider
    pub fn temperature(self) -> f32 {
        self.value() / CREATIVITY_PER_TEMPERATURE
    }
}

impl Default for Creativity {
    fn default() -> Self {
        Self(5.0)
    }
}

impl fmt::Display for Creativity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Creativity {
    type Err = CreativityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: f32 = trimmed
            .parse()
            .map_err(|_| CreativityError::NotANumber(trimmed.to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<f32> for Creativity {
    type Error = CreativityError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Creativity> for f32 {
    fn from(c: Creativity) -> Self {
        c.0
    }
}

/// Per-request tuning
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParameters {
    /// Who the assistant impersonates; written into the system turn at start
    pub persona: String,
    pub creativity: Creativity,
    pub max_output_tokens: u32,
}

impl GenerationParameters {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            creativity: Creativity::default(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn temperature(&self) -> f32 {
        self.creativity.temperature()
    }
}
