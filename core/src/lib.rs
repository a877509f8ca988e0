//! Domain logic for the headless CMS MCP adapter: alias resolution, item
//! normalization, pagination, search hit shaping, and the virtual tool
//! registry. Everything here is pure; HTTP lives in `cms-mcp-runtime`.

pub mod alias;
pub mod error;
pub mod item;
pub mod page;
pub mod registry;
pub mod search;

pub use alias::AliasTable;
pub use error::ContentError;
pub use item::{ItemSummary, normalize_item};
pub use page::{Page, paginate};
pub use registry::{Registry, build_registry};
pub use search::SearchHit;
