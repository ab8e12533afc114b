//! Per-turn options: output mode, research preference, observer, stop predicate.

use crate::agent::FragmentKind;
use crate::roles::ResearchPreference;
use std::sync::Arc;

/// Receives accepted fragments as `(tag, text, kind)`.
///
/// Errors are logged and discarded; they never affect the pipeline.
pub trait TextObserver: Send + Sync {
    fn on_text(&self, tag: &str, text: &str, kind: FragmentKind) -> anyhow::Result<()>;
}

impl<F> TextObserver for F
where
    F: Fn(&str, &str, FragmentKind) -> anyhow::Result<()> + Send + Sync,
{
    fn on_text(&self, tag: &str, text: &str, kind: FragmentKind) -> anyhow::Result<()> {
        self(tag, text, kind)
    }
}

/// Polled at every suspension point; `true` cancels the turn
pub type StopCheck = Arc<dyn Fn() -> bool + Send + Sync>;

/// Options for one conversation turn
#[derive(Clone, Default)]
pub struct ConversationOptions {
    /// Suppress console output when no observer is set
    pub quiet: bool,
    pub research_preference: ResearchPreference,
    pub observer: Option<Arc<dyn TextObserver>>,
    pub should_stop: Option<StopCheck>,
}

impl ConversationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_research_preference(mut self, preference: ResearchPreference) -> Self {
        self.research_preference = preference;
        self
    }

    pub fn with_observer(mut self, observer: impl TextObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn with_stop(mut self, should_stop: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.should_stop = Some(Arc::new(should_stop));
        self
    }

    /// Evaluate the stop predicate; no predicate means never stop
    pub fn stop_requested(&self) -> bool {
        self.should_stop.as_ref().is_some_and(|stop| stop())
    }

    /// Console output happens only without an observer and when not quiet
    pub fn console(&self) -> bool {
        self.observer.is_none() && !self.quiet
    }
}

impl std::fmt::Debug for ConversationOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationOptions")
            .field("quiet", &self.quiet)
            .field("research_preference", &self.research_preference)
            .field("observer", &self.observer.is_some())
            .field("should_stop", &self.should_stop.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_console_mode() {
        assert!(ConversationOptions::new().console());
        assert!(!ConversationOptions::new().quiet(true).console());
        let observed = ConversationOptions::new()
            .with_observer(|_: &str, _: &str, _: FragmentKind| -> anyhow::Result<()> { Ok(()) });
        assert!(!observed.console());
    }

    #[test]
    fn test_stop_predicate() {
        let flag = Arc::new(AtomicBool::new(false));
        let options = {
            let flag = flag.clone();
            ConversationOptions::new().with_stop(move || flag.load(Ordering::SeqCst))
        };
        assert!(!options.stop_requested());
        flag.store(true, Ordering::SeqCst);
        assert!(options.stop_requested());
        assert!(!ConversationOptions::new().stop_requested());
    }
}
