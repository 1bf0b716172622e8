//! Test doubles for the completion layer
//!
//! `MockLlmClient` replays queued results without any I/O.
//! `ScriptedServer` is a local HTTP endpoint for exercising the real client.

use super::{CompletionError, GenerationParameters, LlmService};
use crate::transcript::Transcript;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ============================================================================
// Mock LLM Client
// ============================================================================

/// How the mock answers once its queue is empty
enum Fallback {
    Fail,
    Echo,
}

/// Mock completion client that returns queued results
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<String, CompletionError>>>,
    fallback: Fallback,
    model_id: String,
    /// Transcripts seen, in call order
    pub requests: Mutex<Vec<Transcript>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: Fallback::Fail,
            model_id: "mock-model".to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with `ECHO:` plus the last user text
    pub fn echo() -> Self {
        Self {
            fallback: Fallback::Echo,
            ..Self::new()
        }
    }

    pub fn queue_response(&self, text: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn queue_error(&self, error: CompletionError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn recorded_requests(&self) -> Vec<Transcript> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlmClient {
    async fn complete(
        &self,
        transcript: &Transcript,
        _params: &GenerationParameters,
    ) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(transcript.clone());
        if let Some(queued) = self.responses.lock().unwrap().pop_front() {
            return queued;
        }
        match self.fallback {
            Fallback::Echo => {
                let last = transcript.last_user_text().unwrap_or_default();
                Ok(format!("ECHO:{last}"))
            }
            Fallback::Fail => Err(CompletionError::InvalidTranscript(
                "No mock response queued".to_string(),
            )),
        }
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Scripted HTTP server
// ============================================================================

/// Canned reply for one incoming request
#[derive(Clone)]
pub enum ScriptedResponse {
    Respond { status: u16, body: String },
    /// Read the request and never answer
    Hang,
}

impl ScriptedResponse {
    pub fn json(status: u16, body: &str) -> Self {
        ScriptedResponse::Respond {
            status,
            body: body.to_string(),
        }
    }
}

/// A request as the server saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request line and headers
    pub head: String,
    pub body: String,
}

/// Local HTTP server answering requests from a script, in order
pub struct ScriptedServer {
    addr: std::net::SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: tokio::sync::oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<()>,
}

impl ScriptedServer {
    pub async fn start(scripts: Vec<ScriptedResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let scripts = Arc::new(Mutex::new(VecDeque::from(scripts)));
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn({
            let requests = Arc::clone(&requests);
            async move {
                loop {
                    tokio::select! {
                        _ = &mut shutdown_rx => break,
                        accept = listener.accept() => {
                            if let Ok((socket, _)) = accept {
                                let requests = Arc::clone(&requests);
                                let scripts = Arc::clone(&scripts);
                                tokio::spawn(async move {
                                    serve_one(socket, requests, scripts).await;
                                });
                            }
                        }
                    }
                }
            }
        });

        Self {
            addr,
            requests,
            shutdown: shutdown_tx,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

async fn serve_one(
    mut socket: TcpStream,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    scripts: Arc<Mutex<VecDeque<ScriptedResponse>>>,
) {
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    requests.lock().unwrap().push(request);

    let script = scripts.lock().unwrap().pop_front();
    match script {
        Some(ScriptedResponse::Respond { status, body }) => {
            let response = format!(
                "HTTP/1.1 {status} {}\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\
                 \r\n\
                 {body}",
                reason_phrase(status),
                body.len(),
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
        Some(ScriptedResponse::Hang) => {
            // Hold the connection open until the client gives up
            let mut buf = [0u8; 64];
            while matches!(socket.read(&mut buf).await, Ok(n) if n > 0) {}
        }
        None => {
            let body = r#"{"error":{"message":"no scripted response"}}"#;
            let response = format!(
                "HTTP/1.1 500 Internal Server Error\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\
                 \r\n\
                 {body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
    }
}

/// Read headers, then as many body bytes as `Content-Length` announces
async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find_subslice(&data, b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
    };

    let head = String::from_utf8_lossy(&data[..header_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while data.len() < body_start + content_length {
        let n = socket.read(&mut buf).await.ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }

    let body_end = data.len().min(body_start + content_length);
    let body = String::from_utf8_lossy(&data[body_start..body_end]).into_owned();
    Some(RecordedRequest { head, body })
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
