use serde_json::{Map, Value};

use crate::error::ContentError;

/// Built-in client-side synonyms, in declaration order.
pub const DEFAULT_ALIASES: [(&str, &str); 4] = [
    ("blogs", "posts"),
    ("blog", "posts"),
    ("events", "mec-events"),
    ("event", "mec-events"),
];

/// Maps user-facing content-type tokens to canonical backend names.
///
/// Keys are stored lower-cased and matched case-insensitively. Targets are
/// never looked up again, and construction rejects tables where a target is
/// itself a key, so resolving twice always equals resolving once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    entries: Vec<(String, String)>,
}

impl AliasTable {
    pub fn new<I, K, V>(entries: I) -> Result<Self, ContentError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut out: Vec<(String, String)> = Vec::new();
        for (alias, target) in entries {
            let alias = alias.as_ref().trim().to_lowercase();
            let target = target.as_ref().trim().to_string();
            if alias.is_empty() || target.is_empty() {
                return Err(ContentError::InvalidAliasTable(
                    "alias names and targets must not be empty".to_string(),
                ));
            }
            if out.iter().any(|(existing, _)| *existing == alias) {
                return Err(ContentError::InvalidAliasTable(format!(
                    "alias '{alias}' is declared more than once"
                )));
            }
            out.push((alias, target));
        }

        for (alias, target) in &out {
            let target_key = target.to_lowercase();
            if out.iter().any(|(key, _)| *key == target_key) {
                return Err(ContentError::InvalidAliasTable(format!(
                    "alias '{alias}' points at '{target}', which is itself an alias"
                )));
            }
        }

        Ok(Self { entries: out })
    }

    /// Parse `alias=target` pairs separated by commas, e.g.
    /// `blogs=posts,events=mec-events`.
    pub fn parse(raw: &str) -> Result<Self, ContentError> {
        let mut pairs = Vec::new();
        for chunk in raw.split(',') {
            let chunk = chunk.trim();
            if chunk.is_empty() {
                continue;
            }
            let (alias, target) = chunk.split_once('=').ok_or_else(|| {
                ContentError::InvalidAliasTable(format!(
                    "expected alias=target, got '{chunk}'"
                ))
            })?;
            pairs.push((alias.to_string(), target.to_string()));
        }
        Self::new(pairs)
    }

    /// Canonical name for `token`, or `token` itself when no alias matches.
    pub fn resolve(&self, token: &str) -> String {
        let needle = token.to_lowercase();
        self.entries
            .iter()
            .find(|(alias, _)| *alias == needle)
            .map(|(_, target)| target.clone())
            .unwrap_or_else(|| token.to_string())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(alias, target)| (alias.as_str(), target.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON object in declaration order.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (alias, target) in &self.entries {
            map.insert(alias.clone(), Value::String(target.clone()));
        }
        Value::Object(map)
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_ALIASES
                .iter()
                .map(|(alias, target)| (alias.to_string(), target.to_string()))
                .collect(),
        }
    }
}
