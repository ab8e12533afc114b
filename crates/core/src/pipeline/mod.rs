//! # Pipeline
//!
//! One conversation turn, end to end.
//!
//! ## Modules
//!
//! - `stage` - The fixed stage sequence and each stage's role and tag
//! - `collector` - Stream filtering and accumulation
//! - `invoker` - Role envelopes and per-role streaming
//! - `orchestrator` - The five-stage conversation driver
//! - `events` - Lifecycle events for observers of the whole turn
//! - `options` - Per-turn options, observer, and stop predicate
//! - `result` - Aggregate turn output

pub mod collector;
pub mod events;
pub mod invoker;
pub mod options;
pub mod orchestrator;
pub mod result;
pub mod stage;

pub use collector::{Rejection, StreamCollector};
pub use events::{PipelineEvent, PipelineEventKind};
pub use invoker::{RoleInvoker, StageOutput};
pub use options::{ConversationOptions, StopCheck, TextObserver};
pub use orchestrator::Orchestrator;
pub use result::ConversationResult;
pub use stage::PipelineStage;
