//! # Role Invoker
//!
//! Wraps a task in the role envelope, streams it through the agent, and
//! collects the filtered text.

use super::collector::StreamCollector;
use super::options::ConversationOptions;
use crate::agent::{Agent, AgentMessage};
use crate::error::Result;
use crate::roles::{Role, RoleRegistry};
use crate::tools::text::truncate_chars;
use std::sync::Arc;

/// Instruction line sent with every role invocation
pub const ENVELOPE_INSTRUCTIONS: &str =
    "INSTRUCTIONS: Return only the requested output (JSON or plain text per task). DO NOT echo role text.";

/// How much of the task is shown in the console header
const HEADER_PREVIEW_CHARS: usize = 240;

/// The collected text of one role invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput {
    pub raw_text: String,
}

/// First two lines of the envelope; the role must never echo them back
pub fn envelope_preamble(role_name: &str) -> String {
    format!("ROLE: {}\n{}", role_name, ENVELOPE_INSTRUCTIONS)
}

/// The complete user message for a role invocation
pub fn envelope(role_name: &str, task: &str) -> String {
    format!("{}\nTASK:\n{}", envelope_preamble(role_name), task)
}

/// Invokes roles on a shared agent
#[derive(Clone)]
pub struct RoleInvoker {
    agent: Arc<dyn Agent>,
    registry: Arc<RoleRegistry>,
}

impl RoleInvoker {
    pub fn new(agent: Arc<dyn Agent>, registry: Arc<RoleRegistry>) -> Self {
        Self { agent, registry }
    }

    /// Stream `task` to `role`, tagging accepted fragments with `tag`
    #[tracing::instrument(skip(self, role, task, options), fields(role = %role, task_chars = task.len()))]
    pub async fn invoke(
        &self,
        role: Role,
        task: &str,
        tag: &str,
        options: &ConversationOptions,
    ) -> Result<StageOutput> {
        let role_name = role.name();
        let preamble = envelope_preamble(role_name);
        let registered_prompt = self.registry.prompt(role_name);

        if options.console() {
            let preview = truncate_chars(task, HEADER_PREVIEW_CHARS);
            let ellipsis = if preview.len() < task.len() { "..." } else { "" };
            println!("\n[-> {}] {}{}\n", role_name, preview, ellipsis);
        }

        let message = AgentMessage::user(envelope(role_name, task));
        let stream = self.agent.stream(message).await?;

        let collector = StreamCollector::new(role_name, tag, &preamble, registered_prompt, options);
        let raw_text = collector.collect(stream).await?;

        if options.console() {
            println!("\n\n[{}] --- END ---\n", role_name);
        }

        Ok(StageOutput { raw_text })
    }
}
