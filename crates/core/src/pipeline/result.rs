//! Aggregate output of one conversation turn.

use crate::roles::{Artifact, CriticVerdict, PlanArtifact, ResearchRecord};
use serde::{Deserialize, Serialize};

/// Everything a turn produced, raw and parsed, stage by stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationResult {
    pub user_question: String,
    /// Raw planner text
    pub planner: String,
    pub plan: PlanArtifact,
    /// Task handed to the research role
    pub research_focus: String,
    pub research_raw: String,
    pub research: Artifact<ResearchRecord>,
    pub candidate: String,
    pub critic_raw: String,
    pub critic: Artifact<CriticVerdict>,
    #[serde(rename = "final")]
    pub final_answer: String,
    pub warnings: Vec<String>,
}

impl ConversationResult {
    /// Whether any structured stage had to fall back
    pub fn degraded(&self) -> bool {
        !self.plan.is_parsed() || self.research.is_fallback() || self.critic.is_fallback()
    }
}
