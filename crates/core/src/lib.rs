//! # Kairox Core
//!
//! The staged research conversation pipeline: plan, research, assemble,
//! critique, finalize.
//!
//! ## Architecture
//!
//! - `agent/` - The streaming agent seam and an OpenAI-compatible client
//! - `models` - Provider and sampling configuration
//! - `roles/` - Role registry, bundled prompts, and per-stage artifacts
//! - `pipeline/` - Stream collection, role invocation, and orchestration
//! - `tools/` - Text normalization and JSON extraction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kairox_core::agent::OpenAiCompatAgent;
//! use kairox_core::models::ModelConfig;
//! use kairox_core::pipeline::{ConversationOptions, Orchestrator};
//! use kairox_core::roles::RoleRegistry;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(RoleRegistry::default());
//! let agent = OpenAiCompatAgent::new(ModelConfig::from_env()?, registry.clone())?;
//! let orchestrator = Orchestrator::new(Arc::new(agent), registry);
//! let result = orchestrator
//!     .run_conversation("What is ARC-AGI?", &ConversationOptions::new())
//!     .await?;
//! ```

pub mod agent;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod roles;
pub mod tools;

pub use error::{PipelineError, Result};
