//! # Text Tools
//!
//! Deterministic helpers that turn loosely formatted model text into
//! comparable strings and parseable JSON.
//!
//! ## Modules
//!
//! - `text` - Whitespace/case normalization used for echo and duplicate checks
//! - `json` - First-fragment JSON extraction and planner step recovery

pub mod json;
pub mod text;
