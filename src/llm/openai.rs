//! `OpenAI`-compatible completion client
//!
//! Speaks two wire profiles against the same provider: the flat
//! chat/completions endpoint and the structured v1/responses endpoint.

use super::config::LlmConfig;
use super::types::GenerationParameters;
use super::{CompletionError, LlmService};
use crate::transcript::{Role, Transcript, Turn};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Request/response shape spoken to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireProfile {
    /// `POST /chat/completions`, reply at `choices[0].message.content`
    #[default]
    Chat,
    /// `POST /responses`, reply in the `output[].content[]` array
    Responses,
}

impl WireProfile {
    pub fn endpoint_path(self) -> &'static str {
        match self {
            WireProfile::Chat => "chat/completions",
            WireProfile::Responses => "responses",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WireProfile::Chat => "chat",
            WireProfile::Responses => "responses",
        }
    }
}

impl fmt::Display for WireProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WireProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" | "chat_completions" | "chat-completions" => Ok(WireProfile::Chat),
            "responses" => Ok(WireProfile::Responses),
            other => Err(format!("unknown wire profile `{other}` (expected chat or responses)")),
        }
    }
}

/// OpenAI-compatible service implementation
pub struct OpenAIService {
    client: Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
    profile: WireProfile,
    store: bool,
}

impl OpenAIService {
    pub fn new(config: &LlmConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::transport("Failed to create HTTP client", e))?;

        let endpoint = format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            config.profile.endpoint_path()
        );

        Ok(Self {
            client,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            endpoint,
            profile: config.profile,
            store: config.store,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(super) fn translate_chat_request<'a>(
        &'a self,
        transcript: &'a Transcript,
        params: &GenerationParameters,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: transcript
                .turns()
                .iter()
                .map(|turn| ChatMessage {
                    role: turn.role().as_str(),
                    content: turn.text(),
                })
                .collect(),
            temperature: params.temperature(),
            max_tokens: params.max_output_tokens,
        }
    }

    pub(super) fn translate_responses_request<'a>(
        &'a self,
        transcript: &'a Transcript,
        params: &GenerationParameters,
    ) -> ResponsesRequest<'a> {
        ResponsesRequest {
            model: &self.model,
            input: transcript.turns().iter().map(responses_input_item).collect(),
            text: ResponsesTextOptions {
                format: ResponsesTextFormat { r#type: "text" },
            },
            temperature: params.temperature(),
            max_output_tokens: params.max_output_tokens,
            top_p: 1.0,
            store: self.store,
        }
    }

    /// POST a JSON body and return the raw success body
    async fn post<B: Serialize + Sync>(
        &self,
        api_key: &str,
        body: &B,
    ) -> Result<String, CompletionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::transport("Failed to read response", e))?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), body));
        }

        Ok(body)
    }
}

#[async_trait]
impl LlmService for OpenAIService {
    async fn complete(
        &self,
        transcript: &Transcript,
        params: &GenerationParameters,
    ) -> Result<String, CompletionError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(CompletionError::auth("No API key configured"));
        };

        if !transcript.awaits_reply() {
            return Err(CompletionError::InvalidTranscript(
                "expected a system turn first and an unanswered user turn last".to_string(),
            ));
        }

        match self.profile {
            WireProfile::Chat => {
                let request = self.translate_chat_request(transcript, params);
                let body = self.post(api_key, &request).await?;
                parse_chat_response(&body)
            }
            WireProfile::Responses => {
                let request = self.translate_responses_request(transcript, params);
                let body = self.post(api_key, &request).await?;
                parse_responses_response(&body)
            }
        }
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

fn responses_input_item(turn: &Turn) -> ResponsesInputItem<'_> {
    let content_type = match turn.role() {
        Role::System | Role::User => "input_text",
        Role::Assistant => "output_text",
    };
    ResponsesInputItem {
        role: turn.role().as_str(),
        content: vec![ResponsesInputContent {
            r#type: content_type,
            text: turn.text(),
        }],
    }
}

fn classify_send_error(e: reqwest::Error) -> CompletionError {
    if e.is_timeout() {
        CompletionError::transport(format!("Request timeout: {e}"), e)
    } else if e.is_connect() {
        CompletionError::transport(format!("Connection failed: {e}"), e)
    } else {
        CompletionError::transport(format!("Request failed: {e}"), e)
    }
}

/// Map a non-success status and its body to an error
pub(crate) fn classify_failure(status: u16, body: String) -> CompletionError {
    let message = serde_json::from_str::<OpenAIErrorResponse>(&body)
        .map_or_else(|_| body.trim().to_string(), |resp| resp.error.message);

    match status {
        401 | 403 => CompletionError::auth(message),
        _ => CompletionError::provider(status, message, body),
    }
}

/// Extract `choices[0].message.content`
pub(crate) fn parse_chat_response(body: &str) -> Result<String, CompletionError> {
    let resp: ChatResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::malformed(format!("Failed to parse response: {e}"), body))?;

    resp.choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::malformed("No choices in response", body))?
        .message
        .content
        .ok_or_else(|| CompletionError::malformed("First choice has no message content", body))
}

/// Extract the first `output_text` of the first message output
pub(crate) fn parse_responses_response(body: &str) -> Result<String, CompletionError> {
    let resp: ResponsesResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::malformed(format!("Failed to parse response: {e}"), body))?;

    for output in resp.output {
        if output.r#type.as_deref().is_some_and(|t| t != "message") {
            // reasoning and tool outputs carry no reply text
            tracing::debug!(output_type = ?output.r#type, "Skipping non-message output");
            continue;
        }
        let text = output
            .content
            .into_iter()
            .flatten()
            .find(|item| item.r#type == "output_text")
            .and_then(|item| item.text);
        if let Some(text) = text {
            return Ok(text);
        }
    }

    Err(CompletionError::malformed("No output_text in response", body))
}

// Chat completions wire types

#[derive(Debug, Serialize)]
pub(super) struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

// Responses API wire types

#[derive(Debug, Serialize)]
pub(super) struct ResponsesRequest<'a> {
    model: &'a str,
    input: Vec<ResponsesInputItem<'a>>,
    text: ResponsesTextOptions,
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    store: bool,
}

#[derive(Debug, Serialize)]
struct ResponsesInputItem<'a> {
    role: &'static str,
    content: Vec<ResponsesInputContent<'a>>,
}

#[derive(Debug, Serialize)]
struct ResponsesInputContent<'a> {
    r#type: &'static str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponsesTextOptions {
    format: ResponsesTextFormat,
}

#[derive(Debug, Serialize)]
struct ResponsesTextFormat {
    r#type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<ResponsesOutput>,
}

#[derive(Debug, Deserialize)]
struct ResponsesOutput {
    #[serde(default)]
    r#type: Option<String>,
    #[serde(default)]
    content: Option<Vec<ResponsesOutputContent>>,
}

#[derive(Debug, Deserialize)]
struct ResponsesOutputContent {
    r#type: String,
    #[serde(default)]
    text: Option<String>,
}
