// src/export/discovery.rs
//! Finds the roots of the workspace and exports everything reachable.

use super::exporter::TreeExporter;
use super::session::ExportSession;
use crate::error::AppError;
use crate::model::{NotionObject, Parent};
use crate::types::NotionId;
use std::path::Path;

/// Exports the whole workspace in two search passes.
///
/// Objects at the top of the workspace go first so that everything
/// reachable from them lands in its natural folder. The second pass picks
/// up whatever is still unvisited, such as pages whose parent is not shared
/// with the integration, and puts it directly under `root`.
pub async fn export_workspace(
    exporter: &mut TreeExporter<'_>,
    session: &mut ExportSession,
    root: &Path,
) -> Result<(), AppError> {
    let objects = exporter.repository().search_all().await?;
    let top_level: Vec<NotionObject> = objects
        .into_iter()
        .filter(|object| matches!(object.parent(), Some(Parent::Workspace)))
        .collect();
    log::info!("Found {} top-level pages and databases", top_level.len());

    for object in top_level {
        export_object(exporter, session, object, root).await;
    }

    let objects = exporter.repository().search_all().await?;
    let orphans: Vec<NotionObject> = objects
        .into_iter()
        .filter(|object| !session.is_visited(&object.id()))
        .collect();
    if !orphans.is_empty() {
        log::info!(
            "Exporting {} pages and databases not reachable from the top level",
            orphans.len()
        );
    }

    for object in orphans {
        export_object(exporter, session, object, root).await;
    }

    Ok(())
}

async fn export_object(
    exporter: &mut TreeExporter<'_>,
    session: &mut ExportSession,
    object: NotionObject,
    parent_dir: &Path,
) {
    match object {
        NotionObject::Page(page) => exporter.export_loaded_page(session, page, parent_dir).await,
        NotionObject::Database(database) => {
            let id = NotionId::from(&database.id);
            exporter.export_database(session, &id, parent_dir).await
        }
    }
}
