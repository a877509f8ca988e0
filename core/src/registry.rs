//! Virtual tool registry.
//!
//! Expands a domain's content types (plus every alias whose target exists)
//! into concrete, copy-pasteable tool descriptors, so an agent can discover
//! which calls are valid for that domain without prior knowledge of the
//! generic tool surface. Output ordering is part of the contract: canonical
//! types sorted, then present aliases in table order, then `_redirects`, then
//! `_search`. Identical inputs serialize byte-identically.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Value, json};

use crate::alias::AliasTable;
use crate::page::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::search::{DEFAULT_SEARCH_TOP, MAX_SEARCH_TOP};

/// Names of the generic tools the descriptors point at.
pub mod tool_names {
    pub const LIST_CONTENT_TYPES: &str = "list_content_types";
    pub const LIST_ITEMS: &str = "list_items";
    pub const GET_ITEM_BY_SLUG: &str = "get_item_by_slug";
    pub const GET_ITEM_BY_ID: &str = "get_item_by_id";
    pub const LIST_REDIRECTS: &str = "list_redirects";
    pub const LOOKUP_REDIRECT: &str = "lookup_redirect";
    pub const SEARCH_CONTENT: &str = "search_content";
    pub const GET_TOOL_REGISTRY: &str = "get_tool_registry";
}

pub const REDIRECTS_GROUP: &str = "_redirects";
pub const SEARCH_GROUP: &str = "_search";

const EXAMPLE_SLUG: &str = "example-slug";
const EXAMPLE_ID: i64 = 1;
const EXAMPLE_FROM_PATH: &str = "/old-path/";
const EXAMPLE_QUERY: &str = "example";
const EXAMPLE_SEARCH_TYPE: &str = "post";

/// A worked invocation of a generic tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallExample {
    pub tool: &'static str,
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualTool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    pub example: ToolCallExample,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolGroup {
    #[serde(rename = "contentType")]
    pub content_type: String,
    /// Canonical content type, set only on alias groups
    #[serde(rename = "aliasOf", skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
    pub tools: Vec<VirtualTool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registry {
    pub domain: String,
    pub registry: Vec<ToolGroup>,
    /// The full alias table, including aliases omitted from `registry`
    pub aliases: Value,
}

impl Registry {
    pub fn group(&self, content_type: &str) -> Option<&ToolGroup> {
        self.registry
            .iter()
            .find(|group| group.content_type == content_type)
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.registry
            .iter()
            .map(|group| group.content_type.as_str())
            .collect()
    }
}

/// Canonical content-type names from an upstream content-types document.
/// Only the key set of an object matters; an array of names is accepted too.
pub fn content_type_names(content_types: &Value) -> BTreeSet<String> {
    match content_types {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => BTreeSet::new(),
    }
}

pub fn build_registry(domain: &str, content_types: &Value, aliases: &AliasTable) -> Registry {
    let canonical = content_type_names(content_types);
    let mut registry = Vec::with_capacity(canonical.len() + aliases.len() + 2);

    for content_type in &canonical {
        registry.push(ToolGroup {
            content_type: content_type.clone(),
            alias_of: None,
            tools: content_type_tools(domain, content_type, content_type, None),
        });
    }

    for (alias, target) in aliases.entries() {
        if !canonical.contains(target) {
            continue;
        }
        registry.push(ToolGroup {
            content_type: alias.to_string(),
            alias_of: Some(target.to_string()),
            tools: content_type_tools(domain, alias, target, Some(target)),
        });
    }

    registry.push(ToolGroup {
        content_type: REDIRECTS_GROUP.to_string(),
        alias_of: None,
        tools: redirect_tools(domain),
    });
    registry.push(ToolGroup {
        content_type: SEARCH_GROUP.to_string(),
        alias_of: None,
        tools: search_tools(domain),
    });

    Registry {
        domain: domain.to_string(),
        registry,
        aliases: aliases.to_value(),
    }
}

fn content_type_tools(
    domain: &str,
    label: &str,
    canonical: &str,
    alias_of: Option<&str>,
) -> Vec<VirtualTool> {
    let suffix = alias_of
        .map(|target| format!(" (alias of '{target}')"))
        .unwrap_or_default();

    vec![
        VirtualTool {
            name: format!("{label}.list"),
            description: format!("List '{label}' items on {domain}, paginated{suffix}."),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_PAGE_LIMIT,
                        "default": DEFAULT_PAGE_LIMIT
                    },
                    "offset": { "type": "integer", "minimum": 0, "default": 0 }
                },
                "additionalProperties": false
            }),
            example: ToolCallExample {
                tool: tool_names::LIST_ITEMS,
                arguments: json!({
                    "domain": domain,
                    "contentType": canonical,
                    "limit": DEFAULT_PAGE_LIMIT,
                    "offset": 0
                }),
            },
        },
        VirtualTool {
            name: format!("{label}.get_by_slug"),
            description: format!("Fetch one '{label}' item on {domain} by slug{suffix}."),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "slug": { "type": "string" }
                },
                "required": ["slug"],
                "additionalProperties": false
            }),
            example: ToolCallExample {
                tool: tool_names::GET_ITEM_BY_SLUG,
                arguments: json!({
                    "domain": domain,
                    "contentType": canonical,
                    "slug": EXAMPLE_SLUG
                }),
            },
        },
        VirtualTool {
            name: format!("{label}.get_by_id"),
            description: format!("Fetch one '{label}' item on {domain} by numeric id{suffix}."),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "integer" }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
            example: ToolCallExample {
                tool: tool_names::GET_ITEM_BY_ID,
                arguments: json!({
                    "domain": domain,
                    "contentType": canonical,
                    "id": EXAMPLE_ID
                }),
            },
        },
    ]
}

fn redirect_tools(domain: &str) -> Vec<VirtualTool> {
    vec![
        VirtualTool {
            name: "redirects.map".to_string(),
            description: format!("Full from-path to to-path redirect map for {domain}."),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
            example: ToolCallExample {
                tool: tool_names::LIST_REDIRECTS,
                arguments: json!({ "domain": domain }),
            },
        },
        VirtualTool {
            name: "redirects.lookup".to_string(),
            description: format!(
                "Resolve one path against the {domain} redirect map; 'to' is null when unmapped."
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "fromPath": { "type": "string" }
                },
                "required": ["fromPath"],
                "additionalProperties": false
            }),
            example: ToolCallExample {
                tool: tool_names::LOOKUP_REDIRECT,
                arguments: json!({ "domain": domain, "fromPath": EXAMPLE_FROM_PATH }),
            },
        },
    ]
}

fn search_tools(domain: &str) -> Vec<VirtualTool> {
    let top_schema = json!({
        "type": "integer",
        "minimum": 1,
        "maximum": MAX_SEARCH_TOP,
        "default": DEFAULT_SEARCH_TOP
    });
    vec![
        VirtualTool {
            name: "search.site".to_string(),
            description: format!("Site-wide full-text search on {domain}."),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "q": { "type": "string", "minLength": 1 },
                    "top": top_schema
                },
                "required": ["q"],
                "additionalProperties": false
            }),
            example: ToolCallExample {
                tool: tool_names::SEARCH_CONTENT,
                arguments: json!({
                    "domain": domain,
                    "q": EXAMPLE_QUERY,
                    "top": DEFAULT_SEARCH_TOP
                }),
            },
        },
        VirtualTool {
            name: "search.by_type".to_string(),
            description: format!(
                "Search on {domain}, keeping only results whose type matches exactly."
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "q": { "type": "string", "minLength": 1 },
                    "type": { "type": "string" },
                    "top": top_schema
                },
                "required": ["q", "type"],
                "additionalProperties": false
            }),
            example: ToolCallExample {
                tool: tool_names::SEARCH_CONTENT,
                arguments: json!({
                    "domain": domain,
                    "q": EXAMPLE_QUERY,
                    "top": DEFAULT_SEARCH_TOP,
                    "type": EXAMPLE_SEARCH_TYPE
                }),
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_alias_table() -> AliasTable {
        AliasTable::new([("blogs", "posts"), ("events", "mec-events")]).unwrap()
    }

    #[test]
    fn groups_are_sorted_then_present_aliases_then_fixed_groups() {
        let content_types = json!({ "posts": { "label": "Posts" }, "page": { "label": "Pages" } });
        let registry = build_registry("example.com", &content_types, &two_alias_table());
        assert_eq!(
            registry.group_names(),
            vec!["page", "posts", "blogs", "_redirects", "_search"]
        );
        assert!(registry.group("events").is_none());
    }

    #[test]
    fn aliases_document_lists_the_full_table() {
        let content_types = json!({ "posts": {} });
        let registry = build_registry("example.com", &content_types, &two_alias_table());
        assert_eq!(
            registry.aliases,
            json!({ "blogs": "posts", "events": "mec-events" })
        );
    }

    #[test]
    fn each_content_type_gets_three_descriptors() {
        let registry = build_registry("example.com", &json!({ "posts": {} }), &AliasTable::default());
        let posts = registry.group("posts").unwrap();
        let names: Vec<_> = posts.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["posts.list", "posts.get_by_slug", "posts.get_by_id"]
        );
        assert_eq!(posts.alias_of, None);

        let list = &posts.tools[0];
        assert_eq!(list.input_schema["properties"]["limit"]["default"], 20);
        assert_eq!(list.input_schema["properties"]["limit"]["minimum"], 1);
        assert_eq!(list.input_schema["properties"]["limit"]["maximum"], 100);
        assert_eq!(list.input_schema["properties"]["offset"]["default"], 0);
        assert_eq!(list.example.tool, tool_names::LIST_ITEMS);

        let by_id = &posts.tools[2];
        assert_eq!(by_id.input_schema["properties"]["id"]["type"], "integer");
        assert_eq!(by_id.input_schema["required"], json!(["id"]));
    }

    #[test]
    fn alias_examples_point_at_canonical_type() {
        let registry = build_registry(
            "example.com",
            &json!({ "posts": {}, "mec-events": {} }),
            &AliasTable::default(),
        );
        assert_eq!(
            registry.group_names(),
            vec![
                "mec-events",
                "posts",
                "blogs",
                "blog",
                "events",
                "event",
                "_redirects",
                "_search"
            ]
        );
        let blogs = registry.group("blogs").unwrap();
        assert_eq!(blogs.alias_of.as_deref(), Some("posts"));
        assert_eq!(blogs.tools[0].name, "blogs.list");
        for tool in &blogs.tools {
            assert_eq!(tool.example.arguments["contentType"], "posts");
            assert_eq!(tool.example.arguments["domain"], "example.com");
        }
    }

    #[test]
    fn fixed_groups_do_not_depend_on_content_types() {
        let registry = build_registry("example.com", &json!({}), &AliasTable::default());
        assert_eq!(registry.group_names(), vec!["_redirects", "_search"]);

        let redirects = registry.group(REDIRECTS_GROUP).unwrap();
        assert_eq!(redirects.tools[0].example.tool, tool_names::LIST_REDIRECTS);
        assert_eq!(redirects.tools[1].example.tool, tool_names::LOOKUP_REDIRECT);

        let search = registry.group(SEARCH_GROUP).unwrap();
        assert_eq!(search.tools[1].example.arguments["type"], "post");
    }

    #[test]
    fn serialization_is_byte_identical_across_builds() {
        let content_types = json!({ "zeta": {}, "alpha": {}, "posts": {} });
        let first =
            serde_json::to_string(&build_registry("a.test", &content_types, &AliasTable::default()))
                .unwrap();
        let second =
            serde_json::to_string(&build_registry("a.test", &content_types, &AliasTable::default()))
                .unwrap();
        assert_eq!(first, second);
        assert!(first.find("\"alpha\"").unwrap() < first.find("\"zeta\"").unwrap());
    }

    #[test]
    fn alias_group_serializes_alias_of_and_camel_case_keys() {
        let registry = build_registry("example.com", &json!({ "posts": {} }), &two_alias_table());
        let value = serde_json::to_value(&registry).unwrap();
        assert_eq!(value["registry"][1]["contentType"], "blogs");
        assert_eq!(value["registry"][1]["aliasOf"], "posts");
        assert!(value["registry"][0].get("aliasOf").is_none());
        assert!(value["registry"][0]["tools"][0].get("inputSchema").is_some());
    }

    #[test]
    fn content_type_names_accept_arrays_and_ignore_scalars() {
        assert_eq!(content_type_names(&json!(["b", "a", 3])).len(), 2);
        assert!(content_type_names(&json!("posts")).is_empty());
    }
}
