// src/api/mod.rs
//! Notion API interaction: the ability to read a workspace.
//!
//! Business logic depends on the `NotionRepository` trait, never on HTTP
//! details, so exports can run against an in-memory workspace in tests.

pub mod client;
pub mod notion_client_adapter;
mod pagination;
pub mod parser;
pub mod responses;

use crate::error::AppError;
use crate::model::{Block, Database, NotionObject, Page};
use crate::types::NotionId;

/// The ability to retrieve content from a Notion workspace.
///
/// Listing operations return every item, following cursors to the end.
#[async_trait::async_trait]
pub trait NotionRepository: Send + Sync {
    async fn retrieve_page(&self, id: &NotionId) -> Result<Page, AppError>;
    async fn retrieve_database(&self, id: &NotionId) -> Result<Database, AppError>;
    async fn retrieve_block(&self, id: &NotionId) -> Result<Block, AppError>;
    async fn retrieve_children(&self, parent: &NotionId) -> Result<Vec<Block>, AppError>;
    async fn query_rows(&self, database: &NotionId) -> Result<Vec<Page>, AppError>;

    /// Display name of a user, or the id itself when the name is hidden.
    async fn retrieve_user_name(&self, user_id: &str) -> Result<String, AppError>;

    /// Every page and database shared with the integration.
    async fn search_all(&self) -> Result<Vec<NotionObject>, AppError>;
}

pub use client::NotionHttpClient;
