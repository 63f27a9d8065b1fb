// src/export/mod.rs
//! The tree exporter and the full-workspace entry point.

mod discovery;
pub mod edit_time;
mod exporter;
pub mod layout;
mod session;

pub use discovery::export_workspace;
pub use edit_time::{content_updated_time, recover_true_edit_time};
pub use exporter::TreeExporter;
pub use session::{
    ErrorRecord, ExportSession, ExportStats, ExportSummary, BLOCK_MARKER, DATABASE_MARKER,
    PAGE_MARKER,
};

use crate::api::NotionRepository;
use crate::attachments::AttachmentStore;
use crate::config::ExportConfig;
use crate::error::AppError;
use crate::output::create_directory;

/// Exports the whole workspace into `config.output_dir`.
///
/// Recoverable failures end up in the error log; only problems that make
/// the run itself impossible are returned as `Err`.
pub async fn run_full_export(
    repo: &dyn NotionRepository,
    config: &ExportConfig,
) -> Result<ExportSummary, AppError> {
    create_directory(&config.output_dir)?;
    let attachments = AttachmentStore::open(&config.output_dir)?;
    let mut session = ExportSession::new();
    let mut exporter = TreeExporter::new(repo, attachments, config.edit_time_cutoff);

    export_workspace(&mut exporter, &mut session, &config.output_dir).await?;
    exporter.finish()?;

    let summary = session.finish(&config.error_log)?;
    log::info!("Export finished: {}", summary.stats);
    Ok(summary)
}
