//! # Research Artifacts
//!
//! The research role returns a cited evidence record. Models drift from the
//! schema in small ways (a string where a list belongs, a made-up
//! reliability grade), so every field is deserialized on its own and
//! degrades to its default without discarding its neighbours.

use super::artifact::Artifact;
use super::lenient::{lenient, lenient_number, lenient_string, lenient_strings};
use crate::tools::json::parse_json_lenient;
use crate::tools::text::normalize;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

/// Width of the answer kept when research output cannot be parsed
pub const FALLBACK_ANSWER_CHARS: usize = 1000;

/// How many sources the finalize stage sees
pub const TOP_SOURCES: usize = 3;

pub const NO_EVIDENCE_WARNING: &str =
    "Research returned no citations/sources. Tools may be unavailable or prompts need tuning.";
pub const TAVILY_UNUSED_WARNING: &str =
    "Deep Research requested, but Tavily internet_search tool was not used.";
pub const FIRECRAWL_UNUSED_WARNING: &str =
    "Research did not use Firecrawl tools. Check Firecrawl availability or prompts.";

/// Which search backend the research role is steered towards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchPreference {
    /// Crawl-based research (the default)
    #[default]
    Firecrawl,
    /// Deep research through Tavily's `internet_search`
    Tavily,
}

impl ResearchPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchPreference::Firecrawl => "firecrawl",
            ResearchPreference::Tavily => "tavily",
        }
    }

    /// Substring that must appear in some `method.tools_used` entry
    pub fn expected_tool(&self) -> &'static str {
        match self {
            ResearchPreference::Firecrawl => "firecrawl",
            ResearchPreference::Tavily => "internet_search",
        }
    }

    fn unused_tool_warning(&self) -> &'static str {
        match self {
            ResearchPreference::Firecrawl => FIRECRAWL_UNUSED_WARNING,
            ResearchPreference::Tavily => TAVILY_UNUSED_WARNING,
        }
    }
}

impl FromStr for ResearchPreference {
    type Err = std::convert::Infallible;

    /// Anything starting with `tav` (any case) selects Tavily
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().to_lowercase().starts_with("tav") {
            Ok(ResearchPreference::Tavily)
        } else {
            Ok(ResearchPreference::Firecrawl)
        }
    }
}

impl fmt::Display for ResearchPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source grade assigned by the research role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reliability {
    Primary,
    Secondary,
    Tertiary,
}

impl FromStr for Reliability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" => Ok(Reliability::Primary),
            "secondary" => Ok(Reliability::Secondary),
            "tertiary" => Ok(Reliability::Tertiary),
            other => Err(format!("unknown reliability grade: {}", other)),
        }
    }
}

fn lenient_reliability<'de, D>(deserializer: D) -> Result<Option<Reliability>, D::Error>
where
    D: Deserializer<'de>,
{
    let grade = lenient_string(deserializer)?;
    Ok(grade.and_then(|g| g.parse().ok()))
}

/// A date as the model wrote it: parsed when it is `YYYY-MM-DD`, kept as text otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseDate {
    Date(NaiveDate),
    Text(String),
}

impl LooseDate {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            LooseDate::Date(date) => Some(*date),
            LooseDate::Text(_) => None,
        }
    }
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<LooseDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = lenient_string(deserializer)?.filter(|s| !s.trim().is_empty());
    Ok(text.map(|t| match t.trim().parse::<NaiveDate>() {
        Ok(date) => LooseDate::Date(date),
        Err(_) => LooseDate::Text(t),
    }))
}

/// A list element: typed when it is an object, otherwise the value as given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry<T> {
    Typed(T),
    Raw(Value),
}

impl<T> Entry<T> {
    pub fn typed(&self) -> Option<&T> {
        match self {
            Entry::Typed(item) => Some(item),
            Entry::Raw(_) => None,
        }
    }
}

/// Null, `false`, zero, and empty strings, lists, or objects
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// A list as given; a lone non-blank value becomes a one-element list
fn loose_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other if is_blank(&other) => Vec::new(),
        other => vec![other],
    }
}

fn lenient_values<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_list(Value::deserialize(deserializer)?))
}

fn lenient_entries<'de, D, T>(deserializer: D) -> Result<Vec<Entry<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = loose_list(Value::deserialize(deserializer)?);
    Ok(items
        .into_iter()
        .map(|item| match item {
            Value::Object(_) => serde_json::from_value(item.clone())
                .map(Entry::Typed)
                .unwrap_or(Entry::Raw(item)),
            other => Entry::Raw(other),
        })
        .collect())
}

/// Date window the research covered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(default, deserialize_with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub from: Option<LooseDate>,
    #[serde(default, deserialize_with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub to: Option<LooseDate>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchMethod {
    #[serde(default, deserialize_with = "lenient_strings", skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<String>,
    /// Exact tool names, checked against the research preference
    #[serde(default, deserialize_with = "lenient_strings")]
    pub tools_used: Vec<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportItem {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContradictionItem {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One claim with the quotes that back or contradict it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub claim: Option<String>,
    #[serde(default, deserialize_with = "lenient_entries", skip_serializing_if = "Vec::is_empty")]
    pub support: Vec<Entry<SupportItem>>,
    #[serde(default, deserialize_with = "lenient_entries", skip_serializing_if = "Vec::is_empty")]
    pub contradictions: Vec<Entry<ContradictionItem>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub published: Option<LooseDate>,
    #[serde(default, deserialize_with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub accessed: Option<LooseDate>,
    #[serde(default, deserialize_with = "lenient_reliability", skip_serializing_if = "Option::is_none")]
    pub reliability: Option<Reliability>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub archive_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Structured research output.
///
/// Keys outside the known schema are kept in `extra`, and list elements
/// that do not fit their schema are kept as [`Entry::Raw`], so the record
/// can be handed to later stages without losing anything the model said.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchRecord {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub short_answer: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings", skip_serializing_if = "Vec::is_empty")]
    pub key_points: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub method: ResearchMethod,
    #[serde(default, deserialize_with = "lenient_entries", skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Entry<EvidenceItem>>,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub citations: Vec<Entry<Citation>>,
    /// Loosely shaped source list some prompts produce instead of citations
    #[serde(default, deserialize_with = "lenient_values", skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_values", skip_serializing_if = "Vec::is_empty")]
    pub evidence_table: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_strings", skip_serializing_if = "Vec::is_empty")]
    pub limitations: Vec<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Set by the role when a required tool was unavailable
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResearchRecord {
    /// Parse research output, substituting [`ResearchRecord::fallback`] when
    /// it is not a non-empty JSON object.
    pub fn from_output(raw: &str) -> Artifact<ResearchRecord> {
        match parse_json_lenient(raw) {
            Some(Value::Object(map)) if !map.is_empty() => {
                match serde_json::from_value(Value::Object(map)) {
                    Ok(record) => Artifact::parsed(record),
                    Err(e) => {
                        tracing::debug!(error = %e, "research record rejected");
                        Artifact::fallback(Self::fallback(raw))
                    }
                }
            }
            _ => Artifact::fallback(Self::fallback(raw)),
        }
    }

    /// Minimal record carrying the normalized raw text as the answer
    pub fn fallback(raw: &str) -> Self {
        Self {
            answer: Some(normalize(raw, FALLBACK_ANSWER_CHARS)),
            ..Default::default()
        }
    }

    /// Any non-blank citations, sources, evidence, or evidence table field
    pub fn has_evidence(&self) -> bool {
        !self.citations.is_empty()
            || !self.sources.is_empty()
            || !self.evidence.is_empty()
            || !self.evidence_table.is_empty()
    }

    /// Cumulative tool-policy warnings for this record
    pub fn warnings(&self, preference: ResearchPreference) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.has_evidence() {
            warnings.push(NO_EVIDENCE_WARNING.to_string());
        }

        let expected = preference.expected_tool();
        let used = self
            .method
            .tools_used
            .iter()
            .any(|tool| tool.to_lowercase().contains(expected));
        if !used {
            warnings.push(preference.unused_tool_warning().to_string());
        }

        warnings
    }

    /// The short answer, or the full answer when it is missing or empty
    pub fn headline(&self) -> Option<&str> {
        self.short_answer
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.answer.as_deref())
    }

    /// Condensed view handed to the finalize stage
    pub fn summary(&self) -> Value {
        let top_sources: Vec<Value> = if !self.sources.is_empty() {
            self.sources.iter().take(TOP_SOURCES).cloned().collect()
        } else {
            self.citations
                .iter()
                .take(TOP_SOURCES)
                .filter_map(|c| serde_json::to_value(c).ok())
                .collect()
        };

        json!({
            "short_answer": self.headline(),
            "top_sources": top_sources,
        })
    }
}

/// Task text for the research role
pub fn research_instruction(focus: &str, preference: ResearchPreference) -> String {
    format!(
        "Research task (brief): {}\n\n\
         Runtime preference: {}.\n\
         Return JSON ONLY as per your role schema. Include method.tools_used listing exact tool names used.\n\
         Do NOT echo the planner/objective or any tool-call logs.",
        focus, preference
    )
}
