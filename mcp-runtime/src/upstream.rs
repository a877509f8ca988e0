use cms_core::error::body_snippet;
use cms_core::ContentError;
use reqwest::Url;
use reqwest::header::ACCEPT;
use serde_json::{Map, Value};

use crate::config::UpstreamConfig;

/// Single-attempt JSON GET client for the content API. No timeout, no retry.
#[derive(Clone, Debug)]
pub struct UpstreamClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// `{base}/{version}/{segments..}`. Each segment is percent-encoded, so
    /// caller-supplied values can never add path levels or a query.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ContentError> {
        let raw_base = self.config.base_url.trim_end_matches('/');
        let invalid = |message: String| ContentError::UpstreamConnection {
            url: raw_base.to_string(),
            message,
        };
        let mut url =
            Url::parse(raw_base).map_err(|e| invalid(format!("invalid upstream URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| invalid("upstream URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(
                self.config
                    .api_version
                    .split('/')
                    .filter(|part| !part.is_empty()),
            )
            .extend(segments);
        Ok(url)
    }

    pub async fn fetch_json(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Value, ContentError> {
        let mut url = self.endpoint(segments)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let url_text = url.to_string();
        tracing::debug!(url = %url_text, "upstream request");

        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ContentError::UpstreamConnection {
                url: url_text.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url_text, status = status.as_u16(), "upstream returned non-success status");
            let body = response.text().await.unwrap_or_default();
            return Err(ContentError::Upstream {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                url: url_text,
                body: body_snippet(&body),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ContentError::UpstreamConnection {
                url: url_text.clone(),
                message: format!("failed to read response body: {e}"),
            })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(url = %url_text, error = %e, "upstream returned malformed JSON");
            ContentError::MalformedJson {
                url: url_text,
                message: e.to_string(),
            }
        })
    }

    pub async fn content_types(&self, domain: &str) -> Result<Value, ContentError> {
        let domain = path_segment("domain", domain)?;
        self.fetch_json(&["content", domain, "content_types.json"], &[])
            .await
    }

    /// Slug-keyed item map for one canonical content type.
    pub async fn content_map(
        &self,
        domain: &str,
        content_type: &str,
    ) -> Result<Map<String, Value>, ContentError> {
        let domain = path_segment("domain", domain)?;
        let file = format!("{}.json", path_segment("contentType", content_type)?);
        let segments = ["content", domain, file.as_str()];
        let body = self.fetch_json(&segments, &[]).await?;
        self.expect_object(&segments, body)
    }

    pub async fn redirects(&self, domain: &str) -> Result<Value, ContentError> {
        let domain = path_segment("domain", domain)?;
        self.fetch_json(&["content", domain, "redirects.json"], &[])
            .await
    }

    pub async fn search(&self, domain: &str, term: &str) -> Result<Value, ContentError> {
        self.fetch_json(&["search", ""], &[("site", domain), ("term", term)])
            .await
    }

    /// Keyed maps may arrive as `[]` when empty.
    pub fn expect_object(
        &self,
        segments: &[&str],
        body: Value,
    ) -> Result<Map<String, Value>, ContentError> {
        match body {
            Value::Object(map) => Ok(map),
            Value::Array(items) if items.is_empty() => Ok(Map::new()),
            other => Err(ContentError::MalformedJson {
                url: self
                    .endpoint(segments)
                    .map(String::from)
                    .unwrap_or_else(|_| segments.join("/")),
                message: format!("expected a JSON object keyed by slug, got {}", json_kind(&other)),
            }),
        }
    }
}

/// A caller-supplied value used as one whole path segment.
fn path_segment<'a>(field: &str, value: &'a str) -> Result<&'a str, ContentError> {
    let forbidden = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '?', '#']);
    if forbidden {
        return Err(ContentError::invalid_input(
            field,
            format!("'{field}' must be a single path segment without '/', '\\', '?' or '#', got '{value}'"),
        ));
    }
    Ok(value)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
