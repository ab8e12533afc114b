//! OpenAI-compatible streaming chat-completions agent.
//!
//! Each envelope's `ROLE:` line selects the role's system prompt and
//! sampling settings from the registry, so role prompts never travel
//! inside the user message.

use super::{Agent, AgentError, AgentMessage, AgentStream, AgentUpdate, MessageDelta};
use crate::models::ModelConfig;
use crate::roles::RoleRegistry;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Chat-completions agent for NIM, OpenAI, OpenRouter, and DeepSeek endpoints
pub struct OpenAiCompatAgent {
    client: Client,
    config: ModelConfig,
    registry: Arc<RoleRegistry>,
}

impl OpenAiCompatAgent {
    pub fn new(config: ModelConfig, registry: Arc<RoleRegistry>) -> Result<Self, AgentError> {
        if config.api_key.is_none() {
            return Err(AgentError::config(format!(
                "no API key configured; set {}",
                config.provider.api_key_env()
            )));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            registry,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint())
    }

    /// Build the request body, routing the envelope to its role
    fn build_request<'a>(&'a self, message: &'a AgentMessage) -> ChatRequest<'a> {
        let spec = envelope_role(&message.content).and_then(|name| self.registry.get(name));

        let system = match spec {
            Some(spec) if !spec.prompt.is_empty() => spec.prompt.as_str(),
            _ => self.registry.orchestrator_instructions(),
        };
        let (temperature, max_tokens) = match spec {
            Some(spec) => (spec.settings.temperature, spec.settings.max_completion_tokens),
            None => (self.config.temperature, self.config.max_completion_tokens),
        };

        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &message.content,
        });

        ChatRequest {
            model: &self.config.model,
            messages,
            temperature,
            top_p: self.config.top_p,
            max_tokens,
            stream: true,
            chat_template_kwargs: self
                .config
                .thinking
                .then(|| json!({ "thinking": true })),
        }
    }

    async fn error_from_response(response: reqwest::Response) -> AgentError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(parsed) => AgentError::api(status, parsed.error.message),
            Err(_) => AgentError::api(status, body),
        }
    }
}

#[async_trait]
impl Agent for OpenAiCompatAgent {
    async fn stream(&self, message: AgentMessage) -> Result<AgentStream, AgentError> {
        let request = self.build_request(&message);

        tracing::debug!(
            provider = %self.config.provider.display_name(),
            model = %request.model,
            role = envelope_role(&message.content).unwrap_or("none"),
            max_tokens = request.max_tokens,
            "Sending chat completion request"
        );

        let mut builder = self.client.post(self.completions_url()).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(parse_sse_stream(response.bytes_stream()))
    }
}

/// Role name from the envelope's first line, if it has one
pub fn envelope_role(content: &str) -> Option<&str> {
    content
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("ROLE:"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

// ─────────────────────────────────────────────────────────────────────────────
// SSE Streaming
// ─────────────────────────────────────────────────────────────────────────────

type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, String>> + Send>>;

struct SseState {
    byte_stream: ByteStream,
    buffer: Vec<u8>,
    /// The byte stream has ended; only the buffer remains
    exhausted: bool,
    done: bool,
}

/// Decode a `text/event-stream` body into message deltas.
///
/// Lines are split on raw bytes so multi-byte characters that straddle a
/// chunk boundary survive. Deltas with neither content nor reasoning are
/// skipped.
fn parse_sse_stream<S, B, E>(byte_stream: S) -> AgentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let byte_stream: ByteStream = Box::pin(
        byte_stream.map(|chunk| chunk.map(|b| b.as_ref().to_vec()).map_err(|e| e.to_string())),
    );

    Box::pin(futures::stream::unfold(
        SseState {
            byte_stream,
            buffer: Vec::new(),
            exhausted: false,
            done: false,
        },
        |mut state| async move {
            if state.done {
                return None;
            }

            loop {
                while let Some(line_end) = state.buffer.iter().position(|b| *b == b'\n') {
                    let raw: Vec<u8> = state.buffer.drain(..=line_end).collect();
                    let line = String::from_utf8_lossy(&raw);
                    let line = line.trim();

                    let Some(data) = line.strip_prefix("data:").map(str::trim_start) else {
                        continue;
                    };

                    if data == "[DONE]" {
                        state.done = true;
                        return None;
                    }

                    match decode_chunk(data) {
                        Ok(Some(delta)) => return Some((Ok(AgentUpdate::Message(delta)), state)),
                        Ok(None) => {}
                        Err(e) => {
                            state.done = true;
                            return Some((Err(e), state));
                        }
                    }
                }

                if state.exhausted {
                    return None;
                }

                match state.byte_stream.next().await {
                    Some(Ok(bytes)) => state.buffer.extend_from_slice(&bytes),
                    Some(Err(e)) => {
                        state.done = true;
                        return Some((Err(AgentError::stream(e)), state));
                    }
                    None => {
                        // Terminate an unfinished last line so it is decoded too.
                        state.exhausted = true;
                        if state.buffer.is_empty() {
                            return None;
                        }
                        state.buffer.push(b'\n');
                    }
                }
            }
        },
    ))
}

/// One `data:` payload. `Ok(None)` for keep-alives and empty deltas.
fn decode_chunk(data: &str) -> Result<Option<MessageDelta>, AgentError> {
    let chunk: StreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::trace!(error = %e, "skipping undecodable SSE payload");
            return Ok(None);
        }
    };

    if let Some(error) = chunk.error {
        return Err(AgentError::stream(error.message));
    }

    let delta = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .map(|delta| MessageDelta {
            content: delta.content.filter(|s| !s.is_empty()),
            reasoning_content: delta.reasoning_content.filter(|s| !s.is_empty()),
        })
        .filter(|delta| delta.content.is_some() || delta.reasoning_content.is_some());

    Ok(delta)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_template_kwargs: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
