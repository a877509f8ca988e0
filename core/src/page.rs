use serde::Serialize;
use serde_json::{Map, Value};

use crate::item::{ItemSummary, normalize_item};

pub const DEFAULT_PAGE_LIMIT: u64 = 20;
pub const MAX_PAGE_LIMIT: u64 = 100;

/// One window over a content map, in the map's insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub items: Vec<ItemSummary>,
}

/// Slice `map` to `[offset, offset + limit)`. An offset past the end yields
/// an empty page with `total` unchanged.
pub fn paginate(map: &Map<String, Value>, limit: usize, offset: usize) -> Page {
    let items = map
        .iter()
        .skip(offset)
        .take(limit)
        .map(|(slug, node)| normalize_item(slug, node))
        .collect();
    Page {
        total: map.len(),
        limit,
        offset,
        items,
    }
}
