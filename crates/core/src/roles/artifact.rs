//! Stage artifact wrapper.
//!
//! Every structured stage result is either what the model produced or a
//! fallback built by the pipeline. The wrapper keeps that distinction
//! visible to callers instead of hiding it behind a nullable map.

use serde::{Deserialize, Serialize};

/// Where an artifact's value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactSource {
    /// Parsed from the model's output
    Parsed,
    /// Substituted because the output had no usable structure
    Fallback,
}

/// A structured stage result tagged with its origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact<T> {
    pub value: T,
    pub source: ArtifactSource,
}

impl<T> Artifact<T> {
    pub fn parsed(value: T) -> Self {
        Self {
            value,
            source: ArtifactSource::Parsed,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            source: ArtifactSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == ArtifactSource::Fallback
    }
}
