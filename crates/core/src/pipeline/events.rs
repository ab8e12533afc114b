//! # Pipeline Events
//!
//! Lifecycle events published while a conversation runs.

use super::stage::PipelineStage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of pipeline event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineEventKind {
    /// A new question entered the pipeline
    ConversationStarted,
    /// A stage began invoking its role
    StageStarted,
    /// A stage finished; data carries `chars` and `parsed`
    StageCompleted,
    /// A tool-policy or evidence warning was raised
    Warning,
    /// The final answer is ready
    ConversationCompleted,
    /// The stop predicate ended the turn
    ConversationStopped,
}

/// An event in the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: PipelineEventKind,
    /// Stage the event belongs to, if any
    #[serde(default)]
    pub stage: Option<PipelineStage>,
    /// Associated data (JSON)
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl PipelineEvent {
    /// Create a new event
    pub fn new(kind: PipelineEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            stage: None,
            data: None,
        }
    }

    /// Attach the stage the event belongs to
    pub fn with_stage(mut self, stage: PipelineStage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Add data to the event
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = PipelineEvent::new(PipelineEventKind::StageStarted)
            .with_stage(PipelineStage::Research)
            .with_data(serde_json::json!({"role": "research-agent"}));

        assert_eq!(event.kind, PipelineEventKind::StageStarted);
        assert_eq!(event.stage, Some(PipelineStage::Research));
        assert!(event.data.is_some());
    }

    #[test]
    fn test_event_serialization() {
        let event = PipelineEvent::new(PipelineEventKind::ConversationStopped);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("conversation_stopped"));
    }
}
