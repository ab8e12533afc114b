//! Replaying test double for [`Agent`].

use super::openai::envelope_role;
use super::{Agent, AgentError, AgentMessage, AgentStream, AgentUpdate, MessageDelta};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Replays canned updates per role and records every envelope it receives.
///
/// Roles without a script stream nothing. Each invocation of a role
/// consumes the next script queued for it, and the last one is reused once
/// the queue runs dry.
#[derive(Default)]
pub(crate) struct ScriptedAgent {
    scripts: Mutex<HashMap<String, Vec<Vec<AgentUpdate>>>>,
    failing: Mutex<Vec<String>>,
    received: Mutex<Vec<String>>,
}

impl ScriptedAgent {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a script of plain content deltas for `role`
    pub(crate) fn reply(self, role: &str, chunks: &[&str]) -> Self {
        let updates = chunks
            .iter()
            .map(|c| AgentUpdate::Message(MessageDelta::content(*c)))
            .collect();
        self.script(role, updates)
    }

    pub(crate) fn script(self, role: &str, updates: Vec<AgentUpdate>) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(role.to_string()).or_default().push(updates);
        }
        self
    }

    /// Make every invocation of `role` fail before streaming
    pub(crate) fn fail(self, role: &str) -> Self {
        if let Ok(mut failing) = self.failing.lock() {
            failing.push(role.to_string());
        }
        self
    }

    /// Envelopes received so far, in order
    pub(crate) fn received(&self) -> Vec<String> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Envelopes received for one role
    pub(crate) fn received_for(&self, role: &str) -> Vec<String> {
        self.received()
            .into_iter()
            .filter(|envelope| envelope_role(envelope) == Some(role))
            .collect()
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    async fn stream(&self, message: AgentMessage) -> Result<AgentStream, AgentError> {
        let role = envelope_role(&message.content).unwrap_or_default().to_string();

        if let Ok(mut received) = self.received.lock() {
            received.push(message.content.clone());
        }

        let failing = self.failing.lock().map(|f| f.contains(&role)).unwrap_or(false);
        if failing {
            return Err(AgentError::api(503, format!("{} unavailable", role)));
        }

        let updates = match self.scripts.lock() {
            Ok(mut scripts) => match scripts.get_mut(&role) {
                Some(queue) if queue.len() > 1 => queue.remove(0),
                Some(queue) => queue.first().cloned().unwrap_or_default(),
                None => Vec::new(),
            },
            Err(_) => Vec::new(),
        };

        Ok(Box::pin(futures::stream::iter(updates.into_iter().map(Ok))))
    }
}
