//! # JSON Extraction
//!
//! Pulls structured fragments out of free-form model output.
//!
//! Model output routinely wraps JSON in prose, markdown fences or tool
//! chatter. These helpers recover the first balanced fragment without
//! needing the model to be well-behaved.

use super::text::{normalize, truncate_chars};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Find the first balanced `{...}` / `[...]` fragment that parses as JSON.
///
/// The scan starts at the first opening bracket and keeps a naive stack of
/// openers. Every time the stack empties, the text from the first opener up
/// to the current closer is tried as JSON. A closer with nothing open
/// stops the scan.
///
/// Brackets inside string literals are counted like any other bracket, so a
/// value such as `"a } b"` can desynchronize the counter.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let mut depth = 0usize;

    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        match byte {
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                if depth == 0 {
                    let candidate = &text[start..=start + offset];
                    if serde_json::from_str::<Value>(candidate).is_ok() {
                        return Some(candidate);
                    }
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse `text` as JSON, falling back to the first extracted fragment.
///
/// Returns `None` only when both attempts fail.
pub fn parse_json_lenient(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }
    extract_json(text).and_then(|fragment| serde_json::from_str(fragment).ok())
}

/// Describe the first planner step, however the planner chose to format it.
///
/// Tries a JSON parse of the whole text, then a regex for a
/// `"description": "..."` pair, then a normalized excerpt of the text.
pub fn extract_first_step_description(planner_text: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<Value>(planner_text) {
        match &parsed {
            Value::Array(steps) => {
                if let Some(step @ Value::Object(_)) = steps.first() {
                    return Some(step_description(step));
                }
            }
            Value::Object(map) => {
                if let Some(step) = first_step_in_document(map) {
                    return Some(step_description(step));
                }
            }
            _ => {}
        }
    }

    if let Some(captures) = description_pattern().captures(planner_text) {
        return Some(captures[1].to_string());
    }

    let excerpt = normalize(planner_text, 400);
    if excerpt.is_empty() {
        None
    } else {
        Some(format!("{}...", truncate_chars(&excerpt, 350)))
    }
}

/// First object entry of the first non-empty array value in a planner document.
pub(crate) fn first_step_in_document(map: &serde_json::Map<String, Value>) -> Option<&Value> {
    map.values().find_map(|value| match value {
        Value::Array(entries) => entries.first().filter(|entry| entry.is_object()),
        _ => None,
    })
}

/// A step's non-empty `description`, or the whole step serialized.
pub(crate) fn step_description(step: &Value) -> String {
    match step.get("description") {
        Some(Value::String(description)) if !description.is_empty() => description.clone(),
        _ => step.to_string(),
    }
}

fn description_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""description"\s*:\s*"([^"]+)""#).expect("description pattern is valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json_from_noise() {
        let payloads = [
            json!({"a": 1, "b": [1, 2, {"c": null}]}),
            json!([{"step_id": "1"}, {"step_id": "2"}]),
            json!({}),
            json!([]),
        ];
        for value in payloads {
            let text = format!("noise before {} more noise", value);
            let fragment = extract_json(&text).expect("fragment");
            let parsed: Value = serde_json::from_str(fragment).unwrap();
            assert_eq!(parsed, value);
        }
    }

    #[test]
    fn test_extract_json_without_brackets_is_absent() {
        assert_eq!(extract_json(""), None);
        assert_eq!(extract_json("plain prose, nothing structured here"), None);
    }

    #[test]
    fn test_extract_json_keeps_start_after_failed_candidate() {
        // `{oops}` fails to parse; the start index stays put, so the next
        // balanced point spans both groups and is still invalid.
        let text = "{oops} {\"ok\": true}";
        assert_eq!(extract_json(text), None);
    }

    #[test]
    fn test_extract_json_stray_closer_stops_scan() {
        assert_eq!(extract_json("[1]] {\"x\": 1}"), Some("[1]"));
        assert_eq!(extract_json("[oops]] {\"x\": 1}"), None);
    }

    #[test]
    fn test_extract_json_brace_in_string_is_known_limitation() {
        // The counter does not look inside string literals: the `}` in the
        // value closes the object early and the real object is never tried.
        let text = r#"result: {"note": "a } b"} trailing"#;
        assert_eq!(extract_json(text), None);

        // Balanced brackets inside strings happen to survive.
        let text = r#"result: {"note": "{x}"} trailing"#;
        assert_eq!(extract_json(text), Some(r#"{"note": "{x}"}"#));
    }

    #[test]
    fn test_parse_json_lenient_prefers_whole_text() {
        assert_eq!(parse_json_lenient("\"just a string\""), Some(json!("just a string")));
        assert_eq!(parse_json_lenient("```json\n{\"a\": 2}\n```"), Some(json!({"a": 2})));
        assert_eq!(parse_json_lenient("not json"), None);
    }

    #[test]
    fn test_first_step_from_array() {
        let text = r#"[{"step_id":"1","description":"Research ARC-AGI definition","assigned_to":"research-agent","expected_artifact":"summary"}]"#;
        assert_eq!(
            extract_first_step_description(text).as_deref(),
            Some("Research ARC-AGI definition")
        );
    }

    #[test]
    fn test_first_step_from_document() {
        let text = r#"{"title": "plan", "steps": [{"step_id": "1"}]}"#;
        assert_eq!(
            extract_first_step_description(text).as_deref(),
            Some(r#"{"step_id":"1"}"#)
        );
    }

    #[test]
    fn test_first_step_regex_fallback() {
        let text = r#"Here you go: {"description": "Find sources", oops"#;
        assert_eq!(extract_first_step_description(text).as_deref(), Some("Find sources"));
    }

    #[test]
    fn test_first_step_excerpt_fallback() {
        let text = "Step one:   LOOK things up";
        assert_eq!(
            extract_first_step_description(text).as_deref(),
            Some("step one: look things up...")
        );
        assert_eq!(extract_first_step_description("   "), None);
    }
}
