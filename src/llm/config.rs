//! Provider configuration from the environment

use super::types::DEFAULT_MAX_OUTPUT_TOKENS;
use super::WireProfile;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Credential variables, in lookup order
const API_KEY_VARS: &[&str] = &["OPEN_AI_KEY", "OPENAI_API_KEY"];

/// Invalid configuration value
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid value `{value}` for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Configuration for the completion provider
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Bearer credential; `None` when nothing is configured
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub profile: WireProfile,
    pub max_output_tokens: u32,
    pub timeout: Duration,
    /// Ask the responses endpoint to retain the exchange. Off unless
    /// `CELEBRITY_CHAT_STORE` enables it, whereas the endpoint's own
    /// default (and the Streamlit variant of this chat) is `true`.
    pub store: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            profile: WireProfile::default(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout: DEFAULT_TIMEOUT,
            store: false,
        }
    }
}

impl LlmConfig {
    /// Load `.env` from the working directory if present, then read the
    /// process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env"),
        }
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let api_key = API_KEY_VARS
            .iter()
            .find_map(|&var| get(var))
            .map(|key| key.trim().to_string());

        let profile = match get("CELEBRITY_CHAT_PROFILE") {
            Some(value) => value.parse().map_err(|reason| ConfigError {
                var: "CELEBRITY_CHAT_PROFILE",
                value,
                reason,
            })?,
            None => defaults.profile,
        };

        let max_output_tokens = match get("CELEBRITY_CHAT_MAX_TOKENS") {
            Some(value) => parse_positive("CELEBRITY_CHAT_MAX_TOKENS", value)?,
            None => defaults.max_output_tokens,
        };

        let timeout = match get("CELEBRITY_CHAT_TIMEOUT_SECS") {
            Some(value) => {
                let secs = parse_positive("CELEBRITY_CHAT_TIMEOUT_SECS", value)?;
                Duration::from_secs(secs.into())
            }
            None => defaults.timeout,
        };

        let store = match get("CELEBRITY_CHAT_STORE") {
            Some(value) => parse_flag("CELEBRITY_CHAT_STORE", value)?,
            None => defaults.store,
        };

        Ok(Self {
            api_key,
            model: get("CELEBRITY_CHAT_MODEL").unwrap_or(defaults.model),
            base_url: get("CELEBRITY_CHAT_BASE_URL").unwrap_or(defaults.base_url),
            profile,
            max_output_tokens,
            timeout,
            store,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

fn parse_positive(var: &'static str, value: String) -> Result<u32, ConfigError> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError {
            var,
            value,
            reason: "expected a positive integer".to_string(),
        }),
    }
}

fn parse_flag(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError {
            var,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}
