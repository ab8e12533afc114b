//! # Agent
//!
//! The seam between the pipeline and whatever drives the model.
//!
//! An [`Agent`] accepts one user message (the role envelope) and returns a
//! stream of updates. Each update carries either a single message delta
//! or a snapshot of several messages, and each message may hold ordinary
//! content, reasoning content, or both.
//!
//! ## Implementations
//!
//! - [`openai::OpenAiCompatAgent`] - streaming chat completions over HTTP

pub mod openai;
#[cfg(test)]
pub(crate) mod scripted;

pub use openai::OpenAiCompatAgent;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use thiserror::Error;

/// Error type for agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Transport failure talking to the endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response stream broke off or could not be decoded.
    #[error("Stream error: {0}")]
    Stream(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AgentError {
    /// Create a stream error.
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

/// The single user message sent to an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub content: String,
}

impl AgentMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Which channel a piece of streamed text arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    Content,
    Reasoning,
}

impl FragmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::Content => "content",
            FragmentKind::Reasoning => "reasoning",
        }
    }
}

impl std::fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A piece of streamed text with its channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFragment {
    pub text: String,
    pub kind: FragmentKind,
}

/// One message as seen in a stream update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

impl MessageDelta {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            reasoning_content: None,
        }
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            content: None,
            reasoning_content: Some(text.into()),
        }
    }

    /// Non-empty fragments, content before reasoning
    pub fn fragments(&self) -> impl Iterator<Item = StreamFragment> + '_ {
        [
            (self.content.as_deref(), FragmentKind::Content),
            (self.reasoning_content.as_deref(), FragmentKind::Reasoning),
        ]
        .into_iter()
        .filter_map(|(text, kind)| match text {
            Some(t) if !t.is_empty() => Some(StreamFragment {
                text: t.to_string(),
                kind,
            }),
            _ => None,
        })
    }
}

/// One item of an agent stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentUpdate {
    /// A single streamed message delta
    Message(MessageDelta),
    /// Every message in the conversation so far
    Snapshot(Vec<MessageDelta>),
}

impl AgentUpdate {
    /// Fragments in arrival order: message by message, content before reasoning
    pub fn fragments(&self) -> Vec<StreamFragment> {
        match self {
            AgentUpdate::Message(delta) => delta.fragments().collect(),
            AgentUpdate::Snapshot(messages) => messages.iter().flat_map(|m| m.fragments()).collect(),
        }
    }
}

/// Stream of updates produced by an agent
pub type AgentStream = Pin<Box<dyn Stream<Item = Result<AgentUpdate, AgentError>> + Send>>;

/// Anything that can turn a role envelope into a stream of text
#[async_trait]
pub trait Agent: Send + Sync {
    async fn stream(&self, message: AgentMessage) -> Result<AgentStream, AgentError>;
}
