// src/resume.rs
//! Retry mode: re-export exactly what a previous run failed on.
//!
//! The previous run's error log is the work queue. Every `Process block`
//! line is traced up to the page that owns the block; `Process page` and
//! `Process database` lines name their target directly.

use crate::api::NotionRepository;
use crate::attachments::AttachmentStore;
use crate::config::ExportConfig;
use crate::error::AppError;
use crate::export::layout::resolve_parent_dir;
use crate::export::{
    ExportSession, ExportStats, ExportSummary, TreeExporter, BLOCK_MARKER, DATABASE_MARKER,
    PAGE_MARKER,
};
use crate::model::Parent;
use crate::types::NotionId;
use indexmap::IndexSet;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

/// Guards the parent walk against a malformed, cyclic parent chain.
const MAX_PARENT_DEPTH: usize = 64;

lazy_static! {
    static ref FAILURE_MARKER: Regex = Regex::new(&format!(
        r"({}|{}|{}) ([0-9a-fA-F]{{8}}-?[0-9a-fA-F]{{4}}-?[0-9a-fA-F]{{4}}-?[0-9a-fA-F]{{4}}-?[0-9a-fA-F]{{12}})",
        BLOCK_MARKER, PAGE_MARKER, DATABASE_MARKER
    ))
    .expect("Failed to compile failure marker regex - this is a bug in the code");
}

/// A failure found in an error log.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailureMarker {
    Block(NotionId),
    Page(NotionId),
    Database(NotionId),
}

/// Something the retry pass exports again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RetryTarget {
    Page(NotionId),
    Database(NotionId),
}

/// Failure markers in log order, without repeats.
pub fn parse_failure_markers(log_text: &str) -> Vec<FailureMarker> {
    let mut markers = IndexSet::new();

    for captures in FAILURE_MARKER.captures_iter(log_text) {
        let (Some(kind), Some(raw_id)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        let id = match NotionId::parse(raw_id.as_str()) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("Ignoring malformed id in error log: {}", e);
                continue;
            }
        };
        let marker = match kind.as_str() {
            BLOCK_MARKER => FailureMarker::Block(id),
            PAGE_MARKER => FailureMarker::Page(id),
            _ => FailureMarker::Database(id),
        };
        markers.insert(marker);
    }

    markers.into_iter().collect()
}

/// The page or database a block belongs to, found by walking its parents.
pub async fn resolve_owner(
    repo: &dyn NotionRepository,
    block_id: &NotionId,
) -> Result<RetryTarget, AppError> {
    let unresolved = |reason: &str| AppError::UnresolvedOwner {
        block_id: block_id.to_hyphenated(),
        reason: reason.to_string(),
    };

    let mut current = block_id.clone();
    for _ in 0..MAX_PARENT_DEPTH {
        let block = repo.retrieve_block(&current).await?;
        match &block.common().parent {
            Some(Parent::Page { page_id }) => return Ok(RetryTarget::Page(page_id.into())),
            Some(Parent::Database { database_id }) => {
                return Ok(RetryTarget::Database(database_id.into()))
            }
            Some(Parent::Block { block_id: parent }) => current = parent.into(),
            Some(Parent::Workspace) | None => {
                return Err(unresolved("parent chain ends without a page"))
            }
        }
    }

    Err(unresolved("parent chain is too deep"))
}

/// Pages and databases to export again, in the order they failed.
///
/// Blocks whose owner cannot be resolved are logged and dropped.
pub async fn list_failed_targets(
    repo: &dyn NotionRepository,
    log_text: &str,
) -> IndexSet<RetryTarget> {
    let mut targets = IndexSet::new();

    for marker in parse_failure_markers(log_text) {
        match marker {
            FailureMarker::Page(id) => {
                targets.insert(RetryTarget::Page(id));
            }
            FailureMarker::Database(id) => {
                targets.insert(RetryTarget::Database(id));
            }
            FailureMarker::Block(id) => match resolve_owner(repo, &id).await {
                Ok(target) => {
                    log::debug!("Block {} belongs to {:?}", id, target);
                    targets.insert(target);
                }
                Err(e) => log::warn!("Dropping block {} from the retry: {}", id, e),
            },
        }
    }

    targets
}

/// Re-exports the targets named in `config.error_log`.
///
/// Afterwards the log holds only this pass's own failures, or is removed
/// when there are none.
pub async fn run_retry(
    repo: &dyn NotionRepository,
    config: &ExportConfig,
) -> Result<ExportSummary, AppError> {
    let log_text = match std::fs::read_to_string(&config.error_log) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!(
                "No error log at {}, nothing to retry",
                config.error_log.display()
            );
            return Ok(ExportSummary {
                stats: ExportStats::default(),
                error_log: None,
            });
        }
        Err(e) => return Err(e.into()),
    };

    let targets = list_failed_targets(repo, &log_text).await;
    log::info!("Retrying {} pages and databases", targets.len());

    let attachments = AttachmentStore::open(&config.output_dir)?;
    let mut session = ExportSession::new();
    let mut exporter = TreeExporter::new(repo, attachments, config.edit_time_cutoff);

    for target in targets {
        retry_target(&mut exporter, &mut session, target, &config.output_dir).await;
    }
    exporter.finish()?;

    let summary = session.finish(&config.error_log)?;
    log::info!("Retry finished: {}", summary.stats);
    Ok(summary)
}

/// Exports one target where a full export would have put it.
async fn retry_target(
    exporter: &mut TreeExporter<'_>,
    session: &mut ExportSession,
    target: RetryTarget,
    root: &Path,
) {
    let repo = exporter.repository();
    match target {
        RetryTarget::Page(id) => match repo.retrieve_page(&id).await {
            Ok(page) => {
                let dir = resolve_parent_dir(repo, page.parent.as_ref(), root).await;
                exporter.export_loaded_page(session, page, &dir).await;
            }
            Err(e) => session.record_page_error(&id, &e),
        },
        RetryTarget::Database(id) => match repo.retrieve_database(&id).await {
            Ok(database) => {
                let dir = resolve_parent_dir(repo, database.parent.as_ref(), root).await;
                exporter.export_database(session, &id, &dir).await;
            }
            Err(e) => session.record_database_error(&id, &e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_markers_are_parsed_in_order_without_repeats() {
        let log = "\
[2024-05-01T10:00:00Z] Process block 11111111-2222-3333-4444-555555555555: timed out
[2024-05-01T10:00:01Z] Process page 66666666777788889999aaaaaaaaaaaa: HTTP 502
[2024-05-01T10:00:02Z] Process block 11111111-2222-3333-4444-555555555555: timed out
[2024-05-01T10:00:03Z] Process database 0123456789abcdef0123456789abcdef: gone
[2024-05-01T10:00:04Z] Something else entirely
";
        let markers = parse_failure_markers(log);
        assert_eq!(
            markers,
            vec![
                FailureMarker::Block(NotionId::parse("11111111222233334444555555555555").unwrap()),
                FailureMarker::Page(NotionId::parse("66666666777788889999aaaaaaaaaaaa").unwrap()),
                FailureMarker::Database(
                    NotionId::parse("0123456789abcdef0123456789abcdef").unwrap()
                ),
            ]
        );
    }

    #[test]
    fn test_log_without_markers_yields_nothing() {
        assert!(parse_failure_markers("").is_empty());
        assert!(parse_failure_markers("[x] Process block not-an-id: oops").is_empty());
    }
}
