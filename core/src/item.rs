use serde::Serialize;
use serde_json::Value;

/// Stable summary of a content node. Derived per request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSummary {
    pub slug: String,
    pub id: Option<i64>,
    /// Never empty: falls back to the slug when the node carries no title
    pub title: String,
    pub url: Option<String>,
}

/// Title sources in priority order: editorial title, flat title, SEO title.
const TITLE_POINTERS: [&str; 3] = ["/content/title", "/title", "/seo/title"];
const ID_POINTERS: [&str; 2] = ["/id", "/meta/id"];
const URL_POINTER: &str = "/meta/url";

pub fn normalize_item(slug: &str, node: &Value) -> ItemSummary {
    ItemSummary {
        slug: slug.to_string(),
        id: item_id(node),
        title: item_title(node).unwrap_or(slug).to_string(),
        url: non_empty_str(node.pointer(URL_POINTER)).map(str::to_string),
    }
}

/// Identifier from the top-level field, falling back to nested metadata.
pub fn item_id(node: &Value) -> Option<i64> {
    ID_POINTERS
        .iter()
        .find_map(|pointer| coerce_i64(node.pointer(pointer)))
}

/// True if either identifier location equals `id`. Both are checked so a
/// node whose top-level id is absent or malformed can still match on meta.
pub fn item_has_id(node: &Value, id: i64) -> bool {
    ID_POINTERS
        .iter()
        .any(|pointer| coerce_i64(node.pointer(pointer)) == Some(id))
}

pub fn item_title(node: &Value) -> Option<&str> {
    TITLE_POINTERS
        .iter()
        .find_map(|pointer| non_empty_str(node.pointer(pointer)))
}

/// Integers, integral floats, and integer-valued strings.
pub fn coerce_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}
