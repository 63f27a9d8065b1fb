// src/dedup/mod.rs
//! Attachment deduplication over an existing export.

mod apply;
mod detect;

pub use apply::{apply_duplicates, DedupReport};
pub use detect::{find_duplicates, DuplicatePair};

use crate::config::DedupConfig;
use crate::constants::ATTACHMENTS_DIR;
use crate::error::AppError;
use std::path::Path;

/// Finds duplicate attachments and, when confirmed, removes them.
///
/// Without confirmation this only lists what would happen and returns an
/// empty report.
pub fn run_dedup(config: &DedupConfig) -> Result<DedupReport, AppError> {
    let attachments_dir = config.output_dir.join(ATTACHMENTS_DIR);
    if !attachments_dir.is_dir() {
        log::info!(
            "No attachments directory at {}, nothing to do",
            attachments_dir.display()
        );
        return Ok(DedupReport::default());
    }

    let pairs = find_duplicates(&attachments_dir, config.min_size)?;
    if pairs.is_empty() {
        log::info!("No duplicate attachments found");
        return Ok(DedupReport::default());
    }

    for pair in &pairs {
        log::info!(
            "{} duplicates {}",
            relative_to(&config.output_dir, &pair.loser),
            relative_to(&config.output_dir, &pair.keeper)
        );
    }

    if !config.confirmed {
        log::info!(
            "{} duplicates found; run again with --yes to remove them",
            pairs.len()
        );
        return Ok(DedupReport::default());
    }

    let report = apply_duplicates(&config.output_dir, &pairs)?;
    log::info!(
        "Rewrote {} references in {} files, trashed {} and deleted {} duplicates",
        report.references_rewritten,
        report.files_rewritten,
        report.trashed,
        report.deleted
    );
    Ok(report)
}

fn relative_to(root: &Path, path: &Path) -> String {
    pathdiff::diff_paths(path, root)
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
