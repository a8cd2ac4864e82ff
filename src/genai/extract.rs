use serde_json::Value;

use crate::error::{AdPulseError, Result};

type Strategy = fn(&str) -> Option<Value>;

/// Tried in order, first success wins
const STRATEGIES: &[(&str, Strategy)] = &[
    ("direct", parse_direct),
    ("fenced", parse_fenced),
    ("braces", parse_braces),
];

/// Recover a JSON document from model output that may be wrapped in prose or
/// markdown code fences.
pub fn extract_json(text: &str) -> Result<Value> {
    for (name, strategy) in STRATEGIES {
        if let Some(value) = strategy(text) {
            tracing::trace!("Extracted JSON using {} strategy", name);
            return Ok(value);
        }
    }
    Err(AdPulseError::Extraction)
}

fn parse_direct(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

fn parse_fenced(text: &str) -> Option<Value> {
    let start = text.find("```json")? + "```json".len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    serde_json::from_str(rest[..end].trim()).ok()
}

fn parse_braces(text: &str) -> Option<Value> {
    let first = text.find('{')?;
    let last = text.rfind('}')?;
    if last < first {
        return None;
    }
    serde_json::from_str(&text[first..=last]).ok()
}
