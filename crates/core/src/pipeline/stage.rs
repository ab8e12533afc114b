//! # Pipeline Stages
//!
//! The fixed stage sequence of one conversation turn.

use crate::roles::Role;
use serde::{Deserialize, Serialize};

/// Stage of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Planner breaking the question into steps
    Plan,
    /// Researcher gathering cited evidence for the first step
    Research,
    /// Main role drafting a candidate answer
    Assemble,
    /// Critic reviewing the candidate
    Critique,
    /// Main role writing the final answer
    Finalize,
    /// Complete
    Complete,
}

impl PipelineStage {
    /// Advance to the next stage. `Complete` stays `Complete`.
    pub fn advance(self) -> Self {
        match self {
            PipelineStage::Plan => PipelineStage::Research,
            PipelineStage::Research => PipelineStage::Assemble,
            PipelineStage::Assemble => PipelineStage::Critique,
            PipelineStage::Critique => PipelineStage::Finalize,
            PipelineStage::Finalize => PipelineStage::Complete,
            PipelineStage::Complete => PipelineStage::Complete,
        }
    }

    /// Role invoked during this stage
    pub fn role(&self) -> Option<Role> {
        match self {
            PipelineStage::Plan => Some(Role::Planner),
            PipelineStage::Research => Some(Role::Research),
            PipelineStage::Assemble | PipelineStage::Finalize => Some(Role::Main),
            PipelineStage::Critique => Some(Role::Critic),
            PipelineStage::Complete => None,
        }
    }

    /// Tag attached to every fragment this stage streams to an observer
    pub fn tag(&self) -> &'static str {
        match self {
            PipelineStage::Plan => "planner",
            PipelineStage::Research => "research",
            PipelineStage::Assemble => "reasoning",
            PipelineStage::Critique => "critic",
            PipelineStage::Finalize => "final",
            PipelineStage::Complete => "complete",
        }
    }

    pub fn is_complete(&self) -> bool {
        *self == PipelineStage::Complete
    }
}
