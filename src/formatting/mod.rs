// src/formatting/mod.rs
//! Renders loaded Notion pages into markdown documents.

pub mod block_renderer;
pub mod frontmatter;
mod properties;
mod rich_text;
mod state;

pub use block_renderer::{render_blocks, AttachmentLinks, RenderContext};
pub use frontmatter::{build_frontmatter, render_database_document, render_page_document, Authors};
pub use properties::{extract_property, FrontmatterValue};
pub use rich_text::render_rich_text;
