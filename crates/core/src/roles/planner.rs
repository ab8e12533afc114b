//! # Planner Artifacts
//!
//! The planner is asked for a JSON array of steps but is free to return
//! anything; [`PlanArtifact`] records what actually came back.

use crate::tools::json::{
    extract_first_step_description, first_step_in_document, parse_json_lenient, step_description,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Constraints sent with every planning request
pub const PLANNER_CONSTRAINTS: &[&str] = &["include 3 concrete action steps if recommending usage"];

/// Parsed planner output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanArtifact {
    /// A JSON array, normally of step objects
    Steps(Vec<Value>),
    /// A JSON object, possibly wrapping the steps under some key
    Document(Map<String, Value>),
    /// Neither text nor any fragment of it parsed
    Unparsed,
    /// Valid JSON that is neither array nor object
    Scalar(Value),
}

impl PlanArtifact {
    /// Parse planner output: whole text first, then the first JSON fragment
    pub fn from_output(raw: &str) -> Self {
        match parse_json_lenient(raw) {
            Some(Value::Array(steps)) => PlanArtifact::Steps(steps),
            Some(Value::Object(map)) => PlanArtifact::Document(map),
            Some(other) => PlanArtifact::Scalar(other),
            None => PlanArtifact::Unparsed,
        }
    }

    pub fn is_parsed(&self) -> bool {
        !matches!(self, PlanArtifact::Unparsed)
    }

    /// Pick the research focus for the next stage.
    ///
    /// Uses the first step's description when the plan has one. Otherwise
    /// falls back to [`extract_first_step_description`] over the raw text,
    /// and finally to the question itself.
    pub fn research_focus(&self, raw: &str, question: &str) -> String {
        let from_plan = match self {
            PlanArtifact::Steps(steps) => steps.first().map(|first| match first {
                Value::String(s) if !s.is_empty() => s.clone(),
                other => step_description(other),
            }),
            PlanArtifact::Document(map) => first_step_in_document(map).map(step_description),
            PlanArtifact::Unparsed | PlanArtifact::Scalar(_) => None,
        };

        from_plan
            .or_else(|| extract_first_step_description(raw))
            .unwrap_or_else(|| question.to_string())
    }
}

/// Task text for the planner role
pub fn planner_payload(question: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "objective": question,
        "constraints": PLANNER_CONSTRAINTS,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARC_PLAN: &str = r#"[{"step_id":"1","description":"Research ARC-AGI definition","assigned_to":"research-agent","expected_artifact":"summary"}]"#;

    #[test]
    fn test_focus_from_step_array() {
        let plan = PlanArtifact::from_output(ARC_PLAN);
        assert!(matches!(plan, PlanArtifact::Steps(ref s) if s.len() == 1));
        assert_eq!(
            plan.research_focus(ARC_PLAN, "What is ARC-AGI?"),
            "Research ARC-AGI definition"
        );
    }

    #[test]
    fn test_focus_from_wrapped_steps_in_prose() {
        let raw = format!("Here is the plan:\n{{\"steps\": {}}}\nDone.", ARC_PLAN);
        let plan = PlanArtifact::from_output(&raw);
        assert!(matches!(plan, PlanArtifact::Document(_)));
        assert_eq!(plan.research_focus(&raw, "q"), "Research ARC-AGI definition");
    }

    #[test]
    fn test_focus_serializes_step_without_description() {
        let raw = r#"[{"step_id":"1"}]"#;
        let plan = PlanArtifact::from_output(raw);
        assert_eq!(plan.research_focus(raw, "q"), r#"{"step_id":"1"}"#);
    }

    #[test]
    fn test_focus_empty_plan_falls_back_to_excerpt() {
        let plan = PlanArtifact::from_output("[]");
        assert_eq!(plan.research_focus("[]", "q"), "[]...");
    }

    #[test]
    fn test_focus_unparsed_uses_question_when_text_empty() {
        let plan = PlanArtifact::from_output("   ");
        assert_eq!(plan, PlanArtifact::Unparsed);
        assert_eq!(plan.research_focus("   ", "What is ARC-AGI?"), "What is ARC-AGI?");
    }

    #[test]
    fn test_planner_payload_shape() {
        let payload = planner_payload("What is ARC-AGI?").unwrap();
        let value: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["objective"], "What is ARC-AGI?");
        assert_eq!(value["constraints"][0], PLANNER_CONSTRAINTS[0]);
        assert!(payload.starts_with("{\n  \"objective\""));
    }

    #[test]
    fn test_unparsed_serializes_as_null() {
        assert_eq!(serde_json::to_value(PlanArtifact::Unparsed).unwrap(), Value::Null);
    }
}
