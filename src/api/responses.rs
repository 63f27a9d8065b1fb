// src/api/responses.rs
//! Wire types for Notion API responses.
//!
//! Block, page and database bodies are parsed with notion-client's types.
//! The fields those types leave out (timestamps, authors, parents) are read
//! from the same JSON through the small structs below.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use notion_client::objects::{
    block::Block as NotionBlock, database::Database as NotionDatabase, error::Error as NotionError,
    page::Page as NotionPage,
};

/// Generic paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub object: String,
    pub results: Vec<T>,
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Fields shared by every page, database and block object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_edited_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    #[serde(default)]
    pub last_edited_by: Option<UserRef>,
    #[serde(default)]
    pub parent: Option<WireParent>,
}

/// A `{ "object": "user", "id": ... }` reference.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub id: String,
}

/// Parent reference as sent by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireParent {
    PageId { page_id: String },
    DatabaseId { database_id: String },
    BlockId { block_id: String },
    Workspace,
    #[serde(other)]
    Other,
}

/// The subset of a user object needed to print an author.
#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Search request body
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub page_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_meta_reads_authors_and_parent() {
        let meta: ObjectMeta = serde_json::from_value(json!({
            "object": "page",
            "created_time": "2024-01-01T00:00:00.000Z",
            "last_edited_time": "2024-01-02T10:30:00.000Z",
            "created_by": { "object": "user", "id": "user-1" },
            "last_edited_by": { "object": "user", "id": "user-2" },
            "parent": { "type": "database_id", "database_id": "abc" }
        }))
        .unwrap();

        assert_eq!(meta.created_by.unwrap().id, "user-1");
        assert_eq!(meta.last_edited_by.unwrap().id, "user-2");
        assert!(matches!(meta.parent, Some(WireParent::DatabaseId { .. })));
        assert_eq!(
            meta.last_edited_time.unwrap().to_rfc3339(),
            "2024-01-02T10:30:00+00:00"
        );
    }

    #[test]
    fn test_unknown_parent_kind_is_tolerated() {
        let meta: ObjectMeta = serde_json::from_value(json!({
            "parent": { "type": "data_source_id", "data_source_id": "x" }
        }))
        .unwrap();
        assert!(matches!(meta.parent, Some(WireParent::Other)));
    }

    #[test]
    fn test_search_request_omits_missing_cursor() {
        let body = serde_json::to_value(SearchRequest {
            page_size: 100,
            start_cursor: None,
        })
        .unwrap();
        assert_eq!(body, json!({ "page_size": 100 }));
    }
}
