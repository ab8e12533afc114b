//! # Roles
//!
//! The four roles the pipeline drives, their bundled prompts, and the
//! artifacts each one produces.
//!
//! ## Roles
//!
//! - `planner-agent` - turns the question into assigned steps (JSON array)
//! - `research-agent` - gathers cited evidence (JSON object)
//! - `critic-agent` - audits the candidate answer (JSON verdict)
//! - `main-agent` - writes the candidate and final answers (plain text)

pub mod artifact;
pub mod assembler;
pub mod critic;
pub(crate) mod lenient;
pub mod planner;
pub mod prompts;
pub mod research;

pub use artifact::{Artifact, ArtifactSource};
pub use critic::{CriticVerdict, Verdict};
pub use planner::PlanArtifact;
pub use research::{
    Citation, ContradictionItem, Entry, EvidenceItem, LooseDate, Reliability, ResearchMethod,
    ResearchPreference, ResearchRecord, SupportItem, TimeWindow,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A role the pipeline can invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "planner-agent")]
    Planner,
    #[serde(rename = "research-agent")]
    Research,
    #[serde(rename = "critic-agent")]
    Critic,
    #[serde(rename = "main-agent")]
    Main,
}

impl Role {
    /// All roles in registry order
    pub fn all() -> [Role; 4] {
        [Role::Planner, Role::Research, Role::Critic, Role::Main]
    }

    /// Name used in the invocation envelope and the prompt registry
    pub fn name(&self) -> &'static str {
        match self {
            Role::Planner => "planner-agent",
            Role::Research => "research-agent",
            Role::Critic => "critic-agent",
            Role::Main => "main-agent",
        }
    }

    pub fn from_name(name: &str) -> Option<Role> {
        Role::all().into_iter().find(|role| role.name() == name)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sampling overrides applied when a role is invoked
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleModelSettings {
    pub temperature: f32,
    pub max_completion_tokens: u32,
}

/// A registered role: its prompt and how to sample for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSpec {
    pub role: Role,
    /// Short label for UIs and logs
    pub description: String,
    /// Full system prompt. Never sent inside the task envelope.
    pub prompt: String,
    pub settings: RoleModelSettings,
}

/// Read-only lookup from role name to role spec.
///
/// Shared between concurrent conversations; the collector consults it for
/// echo suppression and the agent for system prompts.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    specs: HashMap<String, RoleSpec>,
    orchestrator_instructions: String,
}

impl Default for RoleRegistry {
    fn default() -> Self {
        let specs = [
            (Role::Planner, "Planner", prompts::PLANNER, 0.0, 512),
            (Role::Research, "Research (Deep Evidence)", prompts::RESEARCHER, 0.1, 3072),
            (Role::Critic, "Critic", prompts::CRITIC, 0.0, 768),
            (Role::Main, "Main/Assembler", prompts::MAIN, 0.1, 1024),
        ]
        .into_iter()
        .map(|(role, description, prompt, temperature, max_completion_tokens)| RoleSpec {
            role,
            description: description.to_string(),
            prompt: prompt.trim().to_string(),
            settings: RoleModelSettings {
                temperature,
                max_completion_tokens,
            },
        });

        Self::from_specs(specs, prompts::ORCHESTRATOR.trim())
    }
}

impl RoleRegistry {
    /// Build a registry from explicit specs
    pub fn from_specs(
        specs: impl IntoIterator<Item = RoleSpec>,
        orchestrator_instructions: impl Into<String>,
    ) -> Self {
        Self {
            specs: specs
                .into_iter()
                .map(|spec| (spec.role.name().to_string(), spec))
                .collect(),
            orchestrator_instructions: orchestrator_instructions.into(),
        }
    }

    /// Replace one role's prompt, keeping its settings
    pub fn with_prompt(mut self, role: Role, prompt: impl Into<String>) -> Self {
        if let Some(spec) = self.specs.get_mut(role.name()) {
            spec.prompt = prompt.into();
        }
        self
    }

    pub fn get(&self, role_name: &str) -> Option<&RoleSpec> {
        self.specs.get(role_name)
    }

    /// The registered prompt, or an empty string for unknown roles
    pub fn prompt(&self, role_name: &str) -> &str {
        self.get(role_name).map(|spec| spec.prompt.as_str()).unwrap_or("")
    }

    /// Instructions for the hosting agent, outside any role
    pub fn orchestrator_instructions(&self) -> &str {
        &self.orchestrator_instructions
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
