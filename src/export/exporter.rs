// src/export/exporter.rs
//! Walks pages, their blocks, child pages and databases, writing one
//! markdown file per page.
//!
//! Failures are caught at the scope they belong to. A block that cannot be
//! loaded or materialized is dropped (or linked remotely) and logged; a page
//! or database that cannot be fetched or written is logged and skipped. None
//! of them stop the walk.

use super::edit_time::content_updated_time;
use super::layout::{child_targets, needs_folder, ChildTarget};
use super::session::ExportSession;
use crate::api::NotionRepository;
use crate::attachments::{suggested_base_name, AttachmentStore, AttachmentTimes};
use crate::error::AppError;
use crate::formatting::{
    render_blocks, render_database_document, render_page_document, AttachmentLinks, Authors,
    RenderContext,
};
use crate::model::{walk_blocks, Block, MediaBlock, Page};
use crate::output::{
    database_description_path, database_dir, get_relative_path, page_file_path,
    stamp_file_times, write_file,
};
use crate::types::NotionId;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Drives the export of pages and databases into one output tree.
pub struct TreeExporter<'a> {
    repo: &'a dyn NotionRepository,
    attachments: AttachmentStore,
    edit_time_cutoff: Option<DateTime<Utc>>,
}

impl<'a> TreeExporter<'a> {
    pub fn new(
        repo: &'a dyn NotionRepository,
        attachments: AttachmentStore,
        edit_time_cutoff: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            repo,
            attachments,
            edit_time_cutoff,
        }
    }

    pub fn repository(&self) -> &'a dyn NotionRepository {
        self.repo
    }

    /// Persists run-level state. Call once the walk is over.
    pub fn finish(self) -> Result<(), AppError> {
        self.attachments.save_manifest()
    }

    // --- Pages ---

    /// Fetches and exports a page, then everything below it.
    pub async fn export_page(
        &mut self,
        session: &mut ExportSession,
        page_id: &NotionId,
        parent_dir: &Path,
    ) {
        if session.is_visited(page_id) {
            log::trace!("Page {} already exported", page_id);
            return;
        }
        match self.repo.retrieve_page(page_id).await {
            Ok(page) => self.export_loaded_page(session, page, parent_dir).await,
            Err(e) => {
                session.mark_visited(page_id);
                session.record_page_error(page_id, &e);
            }
        }
    }

    /// Exports a page whose metadata is already at hand, e.g. a database row.
    pub async fn export_loaded_page(
        &mut self,
        session: &mut ExportSession,
        page: Page,
        parent_dir: &Path,
    ) {
        let page_id = NotionId::from(&page.id);
        if !session.mark_visited(&page_id) {
            log::trace!("Page {} already exported", page_id);
            return;
        }

        log::info!("Exporting page \"{}\"", page.title());
        match self.write_page(session, page, parent_dir).await {
            Ok(Some((children, child_dir))) => {
                for child in children {
                    Box::pin(self.export_child(session, child, &child_dir)).await;
                }
            }
            Ok(None) => {}
            Err(e) => session.record_page_error(&page_id, &e),
        }
    }

    async fn export_child(
        &mut self,
        session: &mut ExportSession,
        child: ChildTarget,
        parent_dir: &Path,
    ) {
        match child {
            ChildTarget::Page(id) => self.export_page(session, &id, parent_dir).await,
            ChildTarget::Database(id) => self.export_database(session, &id, parent_dir).await,
        }
    }

    /// Loads, renders and writes one page.
    ///
    /// Returns the child pages and databases to export next and the folder
    /// they go in, or `None` when the page has none.
    async fn write_page(
        &mut self,
        session: &mut ExportSession,
        mut page: Page,
        parent_dir: &Path,
    ) -> Result<Option<(Vec<ChildTarget>, PathBuf)>, AppError> {
        page.blocks = self
            .load_children(session, &NotionId::from(&page.id))
            .await?;

        let content_updated = content_updated_time(&page, self.edit_time_cutoff);
        let modified = content_updated.unwrap_or(page.last_edited_time);
        let as_folder = needs_folder(&page.blocks);
        let path = page_file_path(parent_dir, page.title().as_str(), as_folder);

        let times = AttachmentTimes {
            created: Some(page.created_time),
            modified: Some(modified),
        };
        let links = self
            .materialize_attachments(session, &page.blocks, &path, times)
            .await;
        let body = render_blocks(&page.blocks, &RenderContext::new(&links));

        let authors = Authors {
            created_by: self.author_name(session, page.created_by.as_deref()).await,
            last_edited_by: self.author_name(session, page.last_edited_by.as_deref()).await,
        };
        let document = render_page_document(&page, &authors, content_updated, &body);

        write_file(&path, &document)?;
        stamp_file_times(&path, Some(page.created_time), Some(modified))?;
        session.page_written();
        log::debug!("Wrote {}", path.display());

        if !as_folder {
            return Ok(None);
        }
        let child_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| parent_dir.to_path_buf());
        Ok(Some((child_targets(&page.blocks), child_dir)))
    }

    async fn author_name(
        &self,
        session: &mut ExportSession,
        user_id: Option<&str>,
    ) -> Option<String> {
        match user_id {
            Some(id) => Some(session.user_name(self.repo, id).await),
            None => None,
        }
    }

    // --- Block tree ---

    /// Fetches a block's children and, recursively, theirs.
    ///
    /// Stops at child pages and child databases. A failure below the first
    /// level drops only the block whose children could not be fetched.
    async fn load_children(
        &self,
        session: &mut ExportSession,
        parent: &NotionId,
    ) -> Result<Vec<Block>, AppError> {
        let blocks = self.repo.retrieve_children(parent).await?;
        let mut loaded = Vec::with_capacity(blocks.len());

        for mut block in blocks {
            if block.has_children() && !block.is_child_boundary() {
                let block_id = NotionId::from(block.id());
                match Box::pin(self.load_children(session, &block_id)).await {
                    Ok(children) => block.set_children(children),
                    Err(e) => {
                        session.record_block_error(block.id(), &e);
                        continue;
                    }
                }
            }
            loaded.push(block);
        }

        Ok(loaded)
    }

    // --- Attachments ---

    /// Downloads every image, file and PDF in the tree.
    ///
    /// Blocks that fail keep their remote URL when rendered.
    async fn materialize_attachments(
        &mut self,
        session: &mut ExportSession,
        blocks: &[Block],
        page_path: &Path,
        times: AttachmentTimes,
    ) -> AttachmentLinks {
        let mut media: Vec<&MediaBlock> = Vec::new();
        walk_blocks(blocks, &mut |block| {
            if let Some(attachment) = block.as_attachment() {
                media.push(attachment);
            }
        });

        let mut links = AttachmentLinks::new();
        for attachment in media {
            let result = self
                .attachments
                .materialize(
                    attachment.source.url(),
                    &suggested_base_name(attachment),
                    times,
                )
                .await
                .and_then(|done| {
                    let link = get_relative_path(page_path, &done.path)?;
                    Ok((done.downloaded, link))
                });

            match result {
                Ok((downloaded, link)) => {
                    if downloaded {
                        session.attachment_downloaded();
                    }
                    links.insert(attachment.common.id.clone(), link);
                }
                Err(e) => session.record_block_error(&attachment.common.id, &e),
            }
        }
        links
    }

    // --- Databases ---

    /// Exports a database folder: description file plus one export per row.
    ///
    /// Databases without properties are linked views that cannot be
    /// queried; they are skipped without touching the statistics.
    pub async fn export_database(
        &mut self,
        session: &mut ExportSession,
        database_id: &NotionId,
        parent_dir: &Path,
    ) {
        if !session.mark_visited(database_id) {
            log::trace!("Database {} already exported", database_id);
            return;
        }

        match self.write_database(session, database_id, parent_dir).await {
            Ok(Some((rows, dir))) => {
                for row in rows {
                    Box::pin(self.export_loaded_page(session, row, &dir)).await;
                }
            }
            Ok(None) => {}
            Err(e) => session.record_database_error(database_id, &e),
        }
    }

    async fn write_database(
        &mut self,
        session: &mut ExportSession,
        database_id: &NotionId,
        parent_dir: &Path,
    ) -> Result<Option<(Vec<Page>, PathBuf)>, AppError> {
        let database = self.repo.retrieve_database(database_id).await?;
        if database.property_names.is_empty() {
            log::info!(
                "Skipping database \"{}\": it has no properties",
                database.title()
            );
            return Ok(None);
        }

        let title = database.title().as_plain_text();
        log::info!("Exporting database \"{}\"", title);
        let rows = self.repo.query_rows(database_id).await?;

        let dir = database_dir(parent_dir, &title);
        let description = render_database_document(&database, rows.len());
        write_file(&database_description_path(&dir, &title), &description)?;
        session.database_written();

        Ok(Some((rows, dir)))
    }
}
