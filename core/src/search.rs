use serde::Serialize;
use serde_json::Value;

use crate::error::ContentError;
use crate::item::coerce_i64;

pub const DEFAULT_SEARCH_TOP: u64 = 10;
pub const MAX_SEARCH_TOP: u64 = 100;

/// Normalized view of one upstream search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub excerpt: Option<String>,
}

impl SearchHit {
    pub fn from_result(result: &Value) -> Self {
        let text = |key: &str| result.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            id: coerce_i64(result.get("id")),
            title: text("title"),
            url: text("url"),
            kind: text("type"),
            excerpt: text("excerpt"),
        }
    }
}

/// Trimmed search term; blank terms are rejected.
pub fn validate_term(q: &str) -> Result<&str, ContentError> {
    let term = q.trim();
    if term.is_empty() {
        return Err(ContentError::invalid_input(
            "q",
            "Search term 'q' must not be empty",
        ));
    }
    Ok(term)
}

/// Apply the optional exact `type` filter, then keep the first `top` results.
pub fn select_hits(payload: &Value, kind: Option<&str>, top: usize) -> Vec<SearchHit> {
    let Some(results) = payload.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };
    results
        .iter()
        .filter(|result| match kind {
            Some(kind) => result.get("type").and_then(Value::as_str) == Some(kind),
            None => true,
        })
        .take(top)
        .map(SearchHit::from_result)
        .collect()
}
