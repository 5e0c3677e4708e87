//! Extract structured payloads from model output
//!
//! Models wrap JSON in prose or code fences often enough that every caller
//! goes through `extract_json` / `extract_json_array` before deserializing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::error::{QuestError, Result};

/// A scenario rewritten for a reading level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedScenario {
    pub title: String,
    pub situation: String,
    /// Rewritten option texts by display index (may be shorter than the source)
    #[serde(default)]
    pub options: Vec<String>,
}

/// A scenario authored from a problem description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedScenario {
    pub title: String,
    pub situation: String,
    pub options: Vec<String>,
    pub correct_option: usize,
}

fn extract_between(response: &str, open: char, close: char) -> Result<&str> {
    let start = response
        .find(open)
        .ok_or_else(|| QuestError::MalformedResponse(format!("no '{}' found in response", open)))?;
    let end = response
        .rfind(close)
        .ok_or_else(|| QuestError::MalformedResponse(format!("no closing '{}' in response", close)))?;
    if end < start {
        return Err(QuestError::MalformedResponse("unbalanced JSON in response".into()));
    }
    Ok(&response[start..=end])
}

/// Extract the JSON object from a response (handles surrounding text and fences)
pub fn extract_json(response: &str) -> Result<&str> {
    extract_between(response, '{', '}')
}

/// Extract the JSON array from a response
pub fn extract_json_array(response: &str) -> Result<&str> {
    extract_between(response, '[', ']')
}

/// Deserialize the object embedded in `response`
pub fn parse_object<T: DeserializeOwned>(response: &str) -> Result<T> {
    let json = extract_json(response)?;
    serde_json::from_str(json).map_err(|e| QuestError::MalformedResponse(e.to_string()))
}

/// Deserialize the array embedded in `response`
pub fn parse_array<T: DeserializeOwned>(response: &str) -> Result<Vec<T>> {
    let json = extract_json_array(response)?;
    serde_json::from_str(json).map_err(|e| QuestError::MalformedResponse(e.to_string()))
}

/// Theme name from a naming response: quotes dropped, trimmed, capped
pub fn clean_theme_name(response: &str, max_chars: usize) -> Option<String> {
    let name: String = response
        .trim()
        .chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect();
    let name: String = name.trim().chars().take(max_chars).collect();
    let name = name.trim_end().to_string();
    (!name.is_empty()).then_some(name)
}
