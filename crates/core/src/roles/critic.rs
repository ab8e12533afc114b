//! # Critic Artifacts
//!
//! Verdict parsing for the critic role, plus the payload it reviews.

use super::artifact::Artifact;
use super::lenient::{lenient_number, lenient_string, lenient_strings};
use super::research::ResearchRecord;
use crate::tools::json::parse_json_lenient;
use crate::tools::text::truncate_chars;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::str::FromStr;

/// Fix recorded when the critic's output has no usable structure
pub const UNPARSABLE_FIX: &str = "Critic output unparsable - request a follow-up.";

/// How much raw critic text is kept as notes in the fallback verdict
pub const FALLBACK_NOTES_CHARS: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Accept,
    /// Also stands in for a missing or unrecognised verdict
    #[default]
    Revise,
    Reject,
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ACCEPT" => Ok(Verdict::Accept),
            "REVISE" => Ok(Verdict::Revise),
            "REJECT" => Ok(Verdict::Reject),
            other => Err(format!("unknown verdict: {}", other)),
        }
    }
}

fn lenient_verdict<'de, D>(deserializer: D) -> Result<Verdict, D::Error>
where
    D: Deserializer<'de>,
{
    let verdict = lenient_string(deserializer)?;
    Ok(match verdict.as_deref().map(str::parse::<Verdict>) {
        Some(Ok(verdict)) => verdict,
        _ => {
            tracing::debug!(verdict = ?verdict, "unrecognised critic verdict, using REVISE");
            Verdict::Revise
        }
    })
}

/// The critic's review of a candidate answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticVerdict {
    #[serde(default, deserialize_with = "lenient_verdict")]
    pub verdict: Verdict,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub fixes: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// 0..100
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CriticVerdict {
    /// Parse critic output, substituting [`CriticVerdict::fallback`] when it
    /// is not a non-empty JSON object.
    pub fn from_output(raw: &str) -> Artifact<CriticVerdict> {
        match parse_json_lenient(raw) {
            Some(Value::Object(map)) if !map.is_empty() => {
                match serde_json::from_value(Value::Object(map)) {
                    Ok(verdict) => Artifact::parsed(verdict),
                    Err(e) => {
                        tracing::debug!(error = %e, "critic verdict rejected");
                        Artifact::fallback(Self::fallback(raw))
                    }
                }
            }
            _ => Artifact::fallback(Self::fallback(raw)),
        }
    }

    /// REVISE with a single follow-up fix and the raw text as notes
    pub fn fallback(raw: &str) -> Self {
        Self {
            verdict: Verdict::Revise,
            fixes: vec![UNPARSABLE_FIX.to_string()],
            notes: Some(truncate_chars(raw, FALLBACK_NOTES_CHARS).to_string()),
            ..Default::default()
        }
    }

    pub fn accepted(&self) -> bool {
        self.verdict == Verdict::Accept
    }
}

/// Task text for the critic role
pub fn critic_payload(
    candidate: &str,
    research: &ResearchRecord,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "candidate_answer": candidate,
        "research_summary": research,
    }))
}
