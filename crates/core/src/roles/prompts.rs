//! Default role prompts bundled at compile time.

/// Planner - breaks the objective into assigned steps
pub const PLANNER: &str = include_str!("defaults/planner.md");

/// Researcher - collects cited evidence with search tools
pub const RESEARCHER: &str = include_str!("defaults/research.md");

/// Critic - audits the candidate answer against the evidence
pub const CRITIC: &str = include_str!("defaults/critic.md");

/// Main - assembles candidate and final answers
pub const MAIN: &str = include_str!("defaults/main.md");

/// Top-level instructions for the agent that hosts the roles
pub const ORCHESTRATOR: &str = include_str!("defaults/orchestrator.md");

/// All role prompts with their role names
pub fn all_defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("planner-agent", PLANNER),
        ("research-agent", RESEARCHER),
        ("critic-agent", CRITIC),
        ("main-agent", MAIN),
    ]
}
