// src/lib.rs
//! notion2markdown library: exports a Notion workspace into a tree of
//! markdown files with frontmatter and downloaded attachments.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ValidationError`
//! - **Configuration**: `ExportConfig`, `DedupConfig`
//! - **Domain model**: `NotionObject`, `Page`, `Database`, `Block`, etc.
//! - **API client**: `NotionRepository`, `NotionHttpClient`
//! - **Operations**: `run_full_export`, `run_retry`, `run_dedup`

pub mod api;
pub mod attachments;
pub mod config;
pub mod constants;
pub mod dedup;
pub mod error;
pub mod error_recovery;
pub mod export;
pub mod formatting;
pub mod model;
pub mod output;
pub mod resume;
pub mod types;

// --- Error Handling ---
pub use crate::error::AppError;
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, Command, DedupConfig, ExportConfig};

// --- Domain Model ---
pub use crate::model::{Block, Database, NotionObject, Page, Parent, PropertyValue};

// --- Domain Types ---
pub use crate::types::{ApiKey, BlockId, NotionId, PropertyName, RichTextItem};

// --- API Client ---
pub use crate::api::{NotionHttpClient, NotionRepository};

// --- Operations ---
pub use crate::dedup::{run_dedup, DedupReport};
pub use crate::export::{run_full_export, ExportStats, ExportSummary};
pub use crate::resume::run_retry;
