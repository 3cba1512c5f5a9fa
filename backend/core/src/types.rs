use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Output language for document types and tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageMode {
    English,
    French,
    #[default]
    Both,
}

impl LanguageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageMode::English => "english",
            LanguageMode::French => "french",
            LanguageMode::Both => "both",
        }
    }
}

impl fmt::Display for LanguageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" => Ok(LanguageMode::English),
            "french" => Ok(LanguageMode::French),
            "both" => Ok(LanguageMode::Both),
            other => Err(format!(
                "unknown language mode '{other}' (expected english, french, or both)"
            )),
        }
    }
}

/// Document type as returned by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DocType {
    SingleLanguage(String),
    Bilingual {
        en: Option<String>,
        fr: Option<String>,
    },
}

/// Keyword tags as returned by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Tags {
    SingleLanguage(Vec<String>),
    Bilingual { en: Vec<String>, fr: Vec<String> },
}

/// Structured classification of one document.
///
/// Built from the analysis service's JSON with [`AnalysisResult::from_json`],
/// which settles the shape of every field once so downstream code never has
/// to inspect raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub doc_date: Option<String>,
    pub sender: Option<String>,
    pub doc_type: Option<DocType>,
    pub tags: Option<Tags>,
    /// Suggested filename from the model. Never used for filing.
    pub new_filename: Option<String>,
}

impl AnalysisResult {
    /// Interpret an analysis JSON object.
    ///
    /// Total over any input: null, empty, or wrongly shaped fields become
    /// `None` (or empty lists inside a bilingual mapping).
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        Self {
            doc_date: non_empty_string(obj.get("doc_date")),
            sender: non_empty_string(obj.get("sender")),
            doc_type: parse_doc_type(obj.get("doc_type")),
            tags: parse_tags(obj.get("tags")),
            new_filename: non_empty_string(obj.get("new_filename")),
        }
    }
}

/// PDF document-info fields derived from an [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_doc_type(value: Option<&Value>) -> Option<DocType> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(DocType::SingleLanguage(s.clone())),
        Value::Number(n) => Some(DocType::SingleLanguage(n.to_string())),
        Value::Object(map) if !map.is_empty() => Some(DocType::Bilingual {
            en: map.get("en").and_then(scalar_string),
            fr: map.get("fr").and_then(scalar_string),
        }),
        _ => None,
    }
}

fn parse_tags(value: Option<&Value>) -> Option<Tags> {
    match value? {
        Value::Array(items) if !items.is_empty() => Some(Tags::SingleLanguage(string_list(items))),
        Value::Object(map) if !map.is_empty() => Some(Tags::Bilingual {
            en: list_field(map, "en"),
            fr: list_field(map, "fr"),
        }),
        _ => None,
    }
}

fn list_field(map: &Map<String, Value>, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(items)) => string_list(items),
        _ => Vec::new(),
    }
}

fn string_list(items: &[Value]) -> Vec<String> {
    items.iter().filter_map(scalar_string).collect()
}
