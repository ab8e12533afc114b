//! Per-field tolerant deserializers for model-produced JSON.
//!
//! A malformed field degrades to its default instead of failing the
//! whole record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize `T`, or fall back to `T::default()` when the value has the wrong shape.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Strings pass through, other scalars are rendered, everything else is absent.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(&value))
}

/// A list of strings; non-string items are rendered as JSON, a non-list is empty.
pub(crate) fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Any JSON number, or a string holding one.
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient")]
        items: Vec<u32>,
        #[serde(default, deserialize_with = "lenient_string")]
        label: Option<String>,
        #[serde(default, deserialize_with = "lenient_strings")]
        tags: Vec<String>,
        #[serde(default, deserialize_with = "lenient_number")]
        score: Option<f64>,
    }

    #[test]
    fn test_wrong_shapes_degrade_to_defaults() {
        let probe: Probe = serde_json::from_value(json!({
            "items": "not a list",
            "label": {"nested": true},
            "tags": "solo",
            "score": "n/a"
        }))
        .unwrap();
        assert!(probe.items.is_empty());
        assert_eq!(probe.label, None);
        assert!(probe.tags.is_empty());
        assert_eq!(probe.score, None);
    }

    #[test]
    fn test_good_shapes_pass_through() {
        let probe: Probe = serde_json::from_value(json!({
            "items": [1, 2],
            "label": 7,
            "tags": ["a", 3],
            "score": "0.5"
        }))
        .unwrap();
        assert_eq!(probe.items, vec![1, 2]);
        assert_eq!(probe.label.as_deref(), Some("7"));
        assert_eq!(probe.tags, vec!["a".to_string(), "3".to_string()]);
        assert_eq!(probe.score, Some(0.5));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let probe: Probe = serde_json::from_value(json!({})).unwrap();
        assert!(probe.items.is_empty());
        assert_eq!(probe.label, None);
    }
}
