//! # Stream Collector
//!
//! Filters an agent stream down to the text worth keeping.
//!
//! Every fragment passes through the same ordered checks: the stop
//! predicate, tool-call markers, echoes of the role envelope or the role's
//! own prompt, planner payload echoes, research filler, duplicates, and
//! slivers. Accepted fragments go to the observer (or the console) and into
//! the accumulator.

use super::options::{ConversationOptions, TextObserver};
use crate::agent::{AgentStream, FragmentKind, StreamFragment};
use crate::error::PipelineError;
use crate::tools::text::normalize_short;
use futures::StreamExt;
use regex::Regex;
use std::collections::HashSet;
use std::io::Write;
use std::sync::OnceLock;

/// Substrings that mark tool-call or agent bookkeeping chatter
pub const TOOL_MARKERS: &[&str] = &["<|tool_call", "<|tool_calls_section", "functions.write_todos"];

/// Lowercase substrings that mark an echo of the planner payload
pub const PLANNER_ECHO_KEYS: &[&str] = &["\"objective\"", "\"constraints\"", "objective:"];

/// Fragments shorter than this (after trimming) are dropped
pub const MIN_FRAGMENT_CHARS: usize = 3;

fn filler_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*i('ll| will) research").expect("filler pattern is valid")
    })
}

/// Why a fragment was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    ToolMarker,
    PreambleEcho,
    PromptEcho,
    PlannerEcho,
    Filler,
    Duplicate,
    TooShort,
}

/// Accumulates the accepted text of one role invocation
pub struct StreamCollector<'a> {
    role_name: &'a str,
    tag: &'a str,
    options: &'a ConversationOptions,
    preamble_norm: String,
    prompt_norm: String,
    seen: HashSet<String>,
    collected: String,
    accepted: usize,
}

impl<'a> StreamCollector<'a> {
    /// `preamble` and `registered_prompt` are the texts the role must not
    /// echo back; either may be empty to disable that check.
    pub fn new(
        role_name: &'a str,
        tag: &'a str,
        preamble: &str,
        registered_prompt: &str,
        options: &'a ConversationOptions,
    ) -> Self {
        Self {
            role_name,
            tag,
            options,
            preamble_norm: normalize_short(preamble),
            prompt_norm: normalize_short(registered_prompt),
            seen: HashSet::new(),
            collected: String::new(),
            accepted: 0,
        }
    }

    /// Run the content checks on one fragment, in order
    pub fn check(&self, text: &str, text_norm: &str) -> Option<Rejection> {
        if TOOL_MARKERS.iter().any(|marker| text.contains(marker)) {
            return Some(Rejection::ToolMarker);
        }
        if !self.preamble_norm.is_empty() && text_norm.contains(&self.preamble_norm) {
            return Some(Rejection::PreambleEcho);
        }
        if !self.prompt_norm.is_empty() && text_norm.contains(&self.prompt_norm) {
            return Some(Rejection::PromptEcho);
        }

        let lowered = text.to_lowercase();
        if PLANNER_ECHO_KEYS.iter().any(|key| lowered.contains(key)) {
            return Some(Rejection::PlannerEcho);
        }
        if filler_pattern().is_match(text.trim().to_lowercase().as_str()) {
            return Some(Rejection::Filler);
        }
        if self.seen.contains(text_norm) {
            return Some(Rejection::Duplicate);
        }
        if text.trim().chars().count() < MIN_FRAGMENT_CHARS {
            return Some(Rejection::TooShort);
        }
        None
    }

    /// Check one fragment and emit it if it survives.
    ///
    /// Returns whether the fragment was accepted.
    pub fn offer(&mut self, fragment: &StreamFragment) -> Result<bool, PipelineError> {
        if self.options.stop_requested() {
            return Err(PipelineError::Cancelled);
        }

        let text_norm = normalize_short(&fragment.text);
        if let Some(reason) = self.check(&fragment.text, &text_norm) {
            tracing::trace!(role = self.role_name, ?reason, "fragment dropped");
            return Ok(false);
        }

        self.emit(fragment);
        self.collected.push_str(&fragment.text);
        self.seen.insert(text_norm);
        self.accepted += 1;
        Ok(true)
    }

    fn emit(&self, fragment: &StreamFragment) {
        match &self.options.observer {
            Some(observer) => notify(observer.as_ref(), self.tag, &fragment.text, fragment.kind),
            None if !self.options.quiet => {
                print!("[{}] {}", self.role_name, fragment.text);
                let _ = std::io::stdout().flush();
            }
            None => {}
        }
    }

    /// Drain an agent stream, polling the stop predicate before every update
    pub async fn collect(mut self, mut stream: AgentStream) -> Result<String, PipelineError> {
        while let Some(update) = stream.next().await {
            if self.options.stop_requested() {
                return Err(PipelineError::Cancelled);
            }
            for fragment in update?.fragments() {
                self.offer(&fragment)?;
            }
        }

        tracing::debug!(
            role = self.role_name,
            accepted = self.accepted,
            chars = self.collected.len(),
            "stream collected"
        );
        Ok(self.collected)
    }
}

/// Deliver a fragment to the observer, discarding its failure
fn notify(observer: &dyn TextObserver, tag: &str, text: &str, kind: FragmentKind) {
    if let Err(e) = observer.on_text(tag, text, kind) {
        tracing::debug!(tag, error = %e, "observer failed; fragment still kept");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentError, AgentUpdate, MessageDelta};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(String, String, FragmentKind)>>>;

    fn recording() -> (ConversationOptions, Seen) {
        let seen: Seen = Arc::default();
        let sink = seen.clone();
        let options = ConversationOptions::new().with_observer(
            move |tag: &str, text: &str, kind: FragmentKind| -> anyhow::Result<()> {
                sink.lock().unwrap().push((tag.to_string(), text.to_string(), kind));
                Ok(())
            },
        );
        (options, seen)
    }

    fn stream_of(updates: Vec<AgentUpdate>) -> AgentStream {
        Box::pin(futures::stream::iter(updates.into_iter().map(Ok)))
    }

    fn content(text: &str) -> AgentUpdate {
        AgentUpdate::Message(MessageDelta::content(text))
    }

    #[test]
    fn test_duplicates_reach_observer_once() {
        let (options, seen) = recording();
        let collector = StreamCollector::new("research-agent", "research", "", "", &options);
        let text = tokio_test::block_on(collector.collect(stream_of(vec![
            content("Evidence A is strong."),
            content("EVIDENCE   a is strong."),
        ])))
        .unwrap();

        assert_eq!(text, "Evidence A is strong.");
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_tool_markers_never_forwarded() {
        let (options, seen) = recording();
        let collector = StreamCollector::new("research-agent", "research", "", "", &options);
        let text = tokio_test::block_on(collector.collect(stream_of(vec![
            content("<|tool_call_begin|>functions.firecrawl_search:0"),
            content("Calling functions.write_todos now"),
            content("Real finding."),
        ])))
        .unwrap();

        assert_eq!(text, "Real finding.");
        assert!(seen.lock().unwrap().iter().all(|(_, t, _)| !t.contains("<|tool_call")));
    }

    #[test]
    fn test_check_order_and_reasons() {
        let options = ConversationOptions::new().quiet(true);
        let preamble = "ROLE: critic-agent\nINSTRUCTIONS: Return only the requested output.";
        let collector =
            StreamCollector::new("critic-agent", "critic", preamble, "You are Critic-Agent.", &options);
        let check = |text: &str| collector.check(text, &normalize_short(text));

        assert_eq!(check("<|tool_calls_section_begin|>"), Some(Rejection::ToolMarker));
        assert_eq!(
            check("role: critic-agent instructions: return only the requested output. ok"),
            Some(Rejection::PreambleEcho)
        );
        assert_eq!(check("As you said: you are critic-agent."), Some(Rejection::PromptEcho));
        assert_eq!(check("{\"objective\": \"x\"}"), Some(Rejection::PlannerEcho));
        assert_eq!(check("Objective: explain"), Some(Rejection::PlannerEcho));
        assert_eq!(check("  I'll research that for you"), Some(Rejection::Filler));
        assert_eq!(check("I will research the topic"), Some(Rejection::Filler));
        assert_eq!(check(" ok "), Some(Rejection::TooShort));
        assert_eq!(check("The answer is 42."), None);
    }

    #[test]
    fn test_observer_gets_tag_and_kind_in_order() {
        let (options, seen) = recording();
        let collector = StreamCollector::new("main-agent", "reasoning", "", "", &options);
        let update = AgentUpdate::Message(MessageDelta {
            content: Some("Visible draft.".into()),
            reasoning_content: Some("Private thought.".into()),
        });
        tokio_test::block_on(collector.collect(stream_of(vec![update]))).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ("reasoning".to_string(), "Visible draft.".to_string(), FragmentKind::Content));
        assert_eq!(seen[1].2, FragmentKind::Reasoning);
    }

    #[test]
    fn test_observer_failure_is_discarded() {
        let options = ConversationOptions::new().with_observer(
            |_: &str, _: &str, _: FragmentKind| -> anyhow::Result<()> { anyhow::bail!("ui closed") },
        );
        let collector = StreamCollector::new("main-agent", "final", "", "", &options);
        let text = tokio_test::block_on(collector.collect(stream_of(vec![
            content("First part. "),
            content("Second part."),
        ])))
        .unwrap();
        assert_eq!(text, "First part. Second part.");
    }

    #[test]
    fn test_stop_between_items_of_one_update() {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let options = ConversationOptions::new()
            .with_observer(move |_: &str, _: &str, _: FragmentKind| -> anyhow::Result<()> {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .with_stop({
                let stop = stop.clone();
                move || stop.load(Ordering::SeqCst)
            });
        let collector = StreamCollector::new("research-agent", "research", "", "", &options);
        let snapshot = AgentUpdate::Snapshot(vec![
            MessageDelta::content("First fragment."),
            MessageDelta::content("Second fragment."),
        ]);
        let result = tokio_test::block_on(collector.collect(stream_of(vec![snapshot])));
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[test]
    fn test_agent_error_propagates() {
        let options = ConversationOptions::new().quiet(true);
        let collector = StreamCollector::new("research-agent", "research", "", "", &options);
        let stream: AgentStream = Box::pin(futures::stream::iter(vec![
            Ok(content("partial")),
            Err(AgentError::stream("connection reset")),
        ]));
        let result = tokio_test::block_on(collector.collect(stream));
        assert!(matches!(result, Err(PipelineError::Agent(_))));
    }
}
