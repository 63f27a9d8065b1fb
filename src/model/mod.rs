mod block;
pub mod blocks;
pub mod common;
mod property_value;

pub use block::{walk_blocks, Block};
pub use blocks::*;
pub use common::*;
pub use property_value::PropertyValue;

use crate::types::{plain_text_of, BlockId, DatabaseId, NotionId, PageId, PropertyName, RichTextItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A top-level object returned by workspace search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NotionObject {
    Page(Page),
    Database(Database),
}

impl NotionObject {
    pub fn id(&self) -> NotionId {
        match self {
            NotionObject::Page(page) => NotionId::from(&page.id),
            NotionObject::Database(database) => NotionId::from(&database.id),
        }
    }

    pub fn parent(&self) -> Option<&Parent> {
        match self {
            NotionObject::Page(page) => page.parent.as_ref(),
            NotionObject::Database(database) => database.parent.as_ref(),
        }
    }
}

/// A Notion page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub title: PageTitle,
    pub url: String,
    pub created_time: DateTime<Utc>,
    pub last_edited_time: DateTime<Utc>,
    /// User ids of the author and last editor.
    pub created_by: Option<String>,
    pub last_edited_by: Option<String>,
    pub parent: Option<Parent>,
    pub properties: HashMap<PropertyName, PropertyValue>,
    pub blocks: Vec<Block>,
}

impl Page {
    /// Get the page title
    pub fn title(&self) -> &PageTitle {
        &self.title
    }
}

/// A Notion database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub id: DatabaseId,
    pub title: DatabaseTitle,
    pub url: String,
    pub parent: Option<Parent>,
    /// Names of the columns in the database schema.
    pub property_names: BTreeSet<PropertyName>,
}

impl Database {
    /// Get the database title
    pub fn title(&self) -> &DatabaseTitle {
        &self.title
    }
}

/// Parent reference with typed IDs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Parent {
    #[serde(rename = "page_id")]
    Page { page_id: PageId },
    #[serde(rename = "database_id")]
    Database { database_id: DatabaseId },
    #[serde(rename = "block_id")]
    Block { block_id: BlockId },
    #[serde(rename = "workspace")]
    Workspace,
}

/// Page title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTitle(String);

impl PageTitle {
    pub fn new(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseTitle(Vec<RichTextItem>);

impl DatabaseTitle {
    pub fn new(items: Vec<RichTextItem>) -> Self {
        Self(items)
    }

    pub fn as_plain_text(&self) -> String {
        plain_text_of(&self.0)
    }
}

impl std::fmt::Display for DatabaseTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_plain_text())
    }
}
