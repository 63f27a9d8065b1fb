// src/export/session.rs
//! Run-scoped state of one export: visited set, statistics, error log.

use crate::api::NotionRepository;
use crate::error::AppError;
use crate::output::write_file;
use crate::types::{BlockId, NotionId};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Context prefix for a block that failed to load or materialize.
///
/// The resume controller parses this exact shape back out of the log.
pub const BLOCK_MARKER: &str = "Process block";
/// Context prefix for a page that failed as a whole.
pub const PAGE_MARKER: &str = "Process page";
/// Context prefix for a database that failed as a whole.
pub const DATABASE_MARKER: &str = "Process database";

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub pages: usize,
    pub databases: usize,
    pub attachments: usize,
    pub errors: usize,
}

impl fmt::Display for ExportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pages, {} databases, {} attachments, {} errors",
            self.pages, self.databases, self.attachments, self.errors
        )
    }
}

/// One recoverable failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub at: DateTime<Utc>,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.context,
            // One record per line
            self.message.replace(['\r', '\n'], " ")
        )
    }
}

/// What a finished run reports back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub stats: ExportStats,
    /// Set when errors were written to the log.
    pub error_log: Option<PathBuf>,
}

/// Mutable state owned by one run and threaded through the exporter.
#[derive(Debug, Default)]
pub struct ExportSession {
    visited: HashSet<NotionId>,
    stats: ExportStats,
    errors: Vec<ErrorRecord>,
    user_names: HashMap<String, String>,
}

impl ExportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an object as visited. Returns false if it already was.
    pub fn mark_visited(&mut self, id: &NotionId) -> bool {
        self.visited.insert(id.clone())
    }

    pub fn is_visited(&self, id: &NotionId) -> bool {
        self.visited.contains(id)
    }

    pub fn stats(&self) -> ExportStats {
        self.stats
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    pub fn page_written(&mut self) {
        self.stats.pages += 1;
    }

    pub fn database_written(&mut self) {
        self.stats.databases += 1;
    }

    pub fn attachment_downloaded(&mut self) {
        self.stats.attachments += 1;
    }

    /// Records a recoverable failure.
    pub fn record_error(&mut self, context: impl Into<String>, error: &dyn fmt::Display) {
        let record = ErrorRecord {
            at: Utc::now(),
            context: context.into(),
            message: error.to_string(),
        };
        log::error!("{}: {}", record.context, record.message);
        self.stats.errors += 1;
        self.errors.push(record);
    }

    pub fn record_block_error(&mut self, block_id: &BlockId, error: &dyn fmt::Display) {
        self.record_error(format!("{} {}", BLOCK_MARKER, block_id.to_dashed()), error);
    }

    pub fn record_page_error(&mut self, page_id: &NotionId, error: &dyn fmt::Display) {
        self.record_error(format!("{} {}", PAGE_MARKER, page_id.to_hyphenated()), error);
    }

    pub fn record_database_error(&mut self, database_id: &NotionId, error: &dyn fmt::Display) {
        self.record_error(
            format!("{} {}", DATABASE_MARKER, database_id.to_hyphenated()),
            error,
        );
    }

    /// Display name for a user id, looked up at most once per run.
    ///
    /// Lookup failures fall back to the id and are not counted as errors.
    pub async fn user_name(&mut self, repo: &dyn NotionRepository, user_id: &str) -> String {
        if let Some(name) = self.user_names.get(user_id) {
            return name.clone();
        }

        let name = match repo.retrieve_user_name(user_id).await {
            Ok(name) => name,
            Err(e) => {
                log::warn!("Could not resolve user {}: {}", user_id, e);
                user_id.to_string()
            }
        };
        self.user_names.insert(user_id.to_string(), name.clone());
        name
    }

    /// Writes the error log, or removes a stale one when the run was clean.
    pub fn persist_error_log(&self, path: &Path) -> Result<Option<PathBuf>, AppError> {
        if self.errors.is_empty() {
            match std::fs::remove_file(path) {
                Ok(()) => log::info!("Removed stale error log {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            return Ok(None);
        }

        let content: String = self
            .errors
            .iter()
            .map(|record| format!("{}\n", record))
            .collect();
        write_file(path, &content)?;
        Ok(Some(path.to_path_buf()))
    }

    /// Final summary, persisting the error log on the way.
    pub fn finish(self, error_log: &Path) -> Result<ExportSummary, AppError> {
        let error_log = self.persist_error_log(error_log)?;
        Ok(ExportSummary {
            stats: self.stats,
            error_log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn notion_id(n: u32) -> NotionId {
        NotionId::parse(&format!("{:032x}", n)).unwrap()
    }

    #[test]
    fn test_visited_is_check_and_set() {
        let mut session = ExportSession::new();
        assert!(session.mark_visited(&notion_id(1)));
        assert!(!session.mark_visited(&notion_id(1)));
        assert!(session.is_visited(&notion_id(1)));
        assert!(!session.is_visited(&notion_id(2)));
    }

    #[test]
    fn test_block_error_carries_marker() {
        let mut session = ExportSession::new();
        let block = BlockId::parse("abcdef0123456789abcdef0123456789").unwrap();
        session.record_block_error(&block, &"timed out\nafter 3 attempts");

        assert_eq!(session.stats().errors, 1);
        let line = session.errors()[0].to_string();
        assert!(line.starts_with('['));
        assert!(line.ends_with(
            "] Process block abcdef01-2345-6789-abcd-ef0123456789: timed out after 3 attempts"
        ));
    }

    #[test]
    fn test_error_log_written_then_removed_when_clean() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("export-errors.log");

        let mut failing = ExportSession::new();
        failing.record_page_error(&notion_id(9), &"boom");
        assert_eq!(
            failing.persist_error_log(&log_path).unwrap(),
            Some(log_path.clone())
        );
        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("Process page 00000000-0000-0000-0000-000000000009: boom"));

        let clean = ExportSession::new();
        assert_eq!(clean.persist_error_log(&log_path).unwrap(), None);
        assert!(!log_path.exists());
    }
}
