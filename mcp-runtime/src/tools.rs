use cms_core::item::item_has_id;
use cms_core::search::{select_hits, validate_term};
use cms_core::{AliasTable, ContentError, Registry, build_registry, normalize_item, paginate};
use serde_json::{Value, json};

use crate::upstream::UpstreamClient;

/// Handlers for the generic tools. Each call is one upstream GET (or none)
/// followed by in-memory shaping; nothing is cached between calls.
#[derive(Clone, Debug)]
pub struct ContentTools {
    upstream: UpstreamClient,
    aliases: AliasTable,
}

impl ContentTools {
    pub fn new(upstream: UpstreamClient, aliases: AliasTable) -> Self {
        Self { upstream, aliases }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub async fn list_content_types(&self, domain: &str) -> Result<Value, ContentError> {
        self.upstream.content_types(domain).await
    }

    pub async fn list_items(
        &self,
        domain: &str,
        content_type: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Value, ContentError> {
        let resolved = self.aliases.resolve(content_type);
        let map = self.upstream.content_map(domain, &resolved).await?;
        let page = paginate(&map, limit, offset);
        Ok(json!({
            "domain": domain,
            "contentType": resolved,
            "total": page.total,
            "limit": page.limit,
            "offset": page.offset,
            "items": page.items,
        }))
    }

    pub async fn get_item_by_slug(
        &self,
        domain: &str,
        content_type: &str,
        slug: &str,
    ) -> Result<Value, ContentError> {
        let resolved = self.aliases.resolve(content_type);
        let map = self.upstream.content_map(domain, &resolved).await?;
        let node = map.get(slug).ok_or_else(|| ContentError::NotFound {
            key_kind: "slug",
            key: slug.to_string(),
            content_type: resolved.clone(),
        })?;
        Ok(json!({
            "domain": domain,
            "contentType": resolved,
            "item": normalize_item(slug, node),
            "raw": node,
        }))
    }

    /// First entry in upstream order whose id matches; duplicates are not an error.
    pub async fn get_item_by_id(
        &self,
        domain: &str,
        content_type: &str,
        id: i64,
    ) -> Result<Value, ContentError> {
        let resolved = self.aliases.resolve(content_type);
        let map = self.upstream.content_map(domain, &resolved).await?;
        let (slug, node) = map
            .iter()
            .find(|(_, node)| item_has_id(node, id))
            .ok_or_else(|| ContentError::NotFound {
                key_kind: "id",
                key: id.to_string(),
                content_type: resolved.clone(),
            })?;
        Ok(json!({
            "domain": domain,
            "contentType": resolved,
            "item": normalize_item(slug, node),
            "raw": node,
        }))
    }

    pub async fn list_redirects(&self, domain: &str) -> Result<Value, ContentError> {
        self.upstream.redirects(domain).await
    }

    /// An unmapped path is `to: null`, not an error.
    pub async fn lookup_redirect(
        &self,
        domain: &str,
        from_path: &str,
    ) -> Result<Value, ContentError> {
        let redirects = self.upstream.redirects(domain).await?;
        let to = redirects
            .get(from_path)
            .filter(|target| !target.is_null())
            .cloned()
            .unwrap_or(Value::Null);
        Ok(json!({
            "domain": domain,
            "from": from_path,
            "to": to,
        }))
    }

    pub async fn search_content(
        &self,
        domain: &str,
        q: &str,
        top: usize,
        kind: Option<&str>,
    ) -> Result<Value, ContentError> {
        let term = validate_term(q)?;
        let raw = self.upstream.search(domain, term).await?;
        let results = select_hits(&raw, kind, top);
        Ok(json!({
            "domain": domain,
            "q": term,
            "type": kind,
            "count": results.len(),
            "results": results,
            "raw": raw,
        }))
    }

    pub async fn tool_registry(&self, domain: &str) -> Result<Registry, ContentError> {
        let content_types = self.upstream.content_types(domain).await?;
        Ok(build_registry(domain, &content_types, &self.aliases))
    }
}
