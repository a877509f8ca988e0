use cms_core::page::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use cms_core::registry::tool_names;
use cms_core::search::{DEFAULT_SEARCH_TOP, MAX_SEARCH_TOP};
use serde_json::{Value, json};

/// Handler bound to a tool name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    ListContentTypes,
    ListItems,
    GetItemBySlug,
    GetItemById,
    ListRedirects,
    LookupRedirect,
    SearchContent,
    GetToolRegistry,
}

#[derive(Debug)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    pub kind: ToolKind,
}

#[derive(Debug)]
pub struct ResourceDefinition {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const CONTENT_TYPES_RESOURCE: &str = "cms://content-types";
pub const REDIRECTS_RESOURCE: &str = "cms://redirects";

fn domain_property() -> Value {
    json!({
        "type": "string",
        "description": "Site domain, e.g. example.com. Defaults to the server's configured domain."
    })
}

fn content_type_property() -> Value {
    json!({
        "type": "string",
        "description": "Content type name or alias (e.g. posts, blogs, events)."
    })
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: tool_names::GET_TOOL_REGISTRY,
            description: "Discover every concrete call valid for a domain: one group per content type and alias, plus redirect and search helpers, each with a worked example.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "domain": domain_property()
                },
                "additionalProperties": false
            }),
            kind: ToolKind::GetToolRegistry,
        },
        ToolDefinition {
            name: tool_names::LIST_CONTENT_TYPES,
            description: "Raw content-types document for a domain.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "domain": domain_property()
                },
                "additionalProperties": false
            }),
            kind: ToolKind::ListContentTypes,
        },
        ToolDefinition {
            name: tool_names::LIST_ITEMS,
            description: "Paginated item summaries (slug, id, title, url) for one content type, in upstream order.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "domain": domain_property(),
                    "contentType": content_type_property(),
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_PAGE_LIMIT,
                        "default": DEFAULT_PAGE_LIMIT
                    },
                    "offset": { "type": "integer", "minimum": 0, "default": 0 }
                },
                "required": ["contentType"],
                "additionalProperties": false
            }),
            kind: ToolKind::ListItems,
        },
        ToolDefinition {
            name: tool_names::GET_ITEM_BY_SLUG,
            description: "One item by slug: normalized summary plus the raw node.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "domain": domain_property(),
                    "contentType": content_type_property(),
                    "slug": { "type": "string" }
                },
                "required": ["contentType", "slug"],
                "additionalProperties": false
            }),
            kind: ToolKind::GetItemBySlug,
        },
        ToolDefinition {
            name: tool_names::GET_ITEM_BY_ID,
            description: "One item by numeric id (first match in upstream order): normalized summary plus the raw node.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "domain": domain_property(),
                    "contentType": content_type_property(),
                    "id": { "type": "integer" }
                },
                "required": ["contentType", "id"],
                "additionalProperties": false
            }),
            kind: ToolKind::GetItemById,
        },
        ToolDefinition {
            name: tool_names::LIST_REDIRECTS,
            description: "Raw from-path to to-path redirect map for a domain.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "domain": domain_property()
                },
                "additionalProperties": false
            }),
            kind: ToolKind::ListRedirects,
        },
        ToolDefinition {
            name: tool_names::LOOKUP_REDIRECT,
            description: "Resolve a single path against the redirect map; 'to' is null when unmapped.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "domain": domain_property(),
                    "fromPath": { "type": "string" }
                },
                "required": ["fromPath"],
                "additionalProperties": false
            }),
            kind: ToolKind::LookupRedirect,
        },
        ToolDefinition {
            name: tool_names::SEARCH_CONTENT,
            description: "Site-wide search with an optional exact type filter; returns summaries and the raw upstream payload.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "domain": domain_property(),
                    "q": { "type": "string", "minLength": 1 },
                    "top": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_SEARCH_TOP,
                        "default": DEFAULT_SEARCH_TOP
                    },
                    "type": { "type": "string", "description": "Keep only results whose type equals this value." }
                },
                "required": ["q"],
                "additionalProperties": false
            }),
            kind: ToolKind::SearchContent,
        },
    ]
}

pub fn resource_definitions() -> Vec<ResourceDefinition> {
    vec![
        ResourceDefinition {
            uri: CONTENT_TYPES_RESOURCE,
            name: "Content Types",
            description: "Content-types document for the default domain",
        },
        ResourceDefinition {
            uri: REDIRECTS_RESOURCE,
            name: "Redirects",
            description: "Redirect map for the default domain",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tool_names_are_unique_and_complete() {
        let tools = tool_definitions();
        let names: HashSet<_> = tools.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), tools.len());
        assert_eq!(tools.len(), 8);
        for name in [
            "list_content_types",
            "list_items",
            "get_item_by_slug",
            "get_item_by_id",
            "list_redirects",
            "lookup_redirect",
            "search_content",
            "get_tool_registry",
        ] {
            assert!(names.contains(name), "missing tool {name}");
        }
    }

    #[test]
    fn every_required_field_is_a_declared_property() {
        for tool in tool_definitions() {
            let props = tool.input_schema["properties"].as_object().unwrap();
            assert!(props.contains_key("domain"), "{} lacks domain", tool.name);
            if let Some(required) = tool.input_schema["required"].as_array() {
                for field in required {
                    assert!(props.contains_key(field.as_str().unwrap()), "{}", tool.name);
                }
            }
        }
    }

    #[test]
    fn list_items_schema_declares_bounds_and_defaults() {
        let tool = tool_definitions()
            .into_iter()
            .find(|tool| tool.kind == ToolKind::ListItems)
            .expect("list_items must exist");
        let props = &tool.input_schema["properties"];
        assert_eq!(props["limit"]["default"], 20);
        assert_eq!(props["limit"]["maximum"], 100);
        assert_eq!(props["offset"]["minimum"], 0);
    }
}
