//! Error types for the pipeline.

use crate::agent::AgentError;
use thiserror::Error;

/// Result type alias using the pipeline error type.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that end a conversation turn.
///
/// Unparseable stage output is not an error; it becomes a fallback artifact.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The stop predicate fired.
    #[error("Stopped by user")]
    Cancelled,

    /// The agent or its transport failed.
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// A stage payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}
