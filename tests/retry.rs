// tests/retry.rs
//! Retry passes driven by a previous run's error log.

mod common;

use common::*;
use notion2markdown::{run_full_export, run_retry, ApiKey, ExportConfig};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

fn config(root: &Path) -> ExportConfig {
    ExportConfig {
        api_key: ApiKey::new("secret_abcdefghijklmnopqrstuvwxyz").unwrap(),
        output_dir: root.to_path_buf(),
        error_log: root.join("export-errors.log"),
        edit_time_cutoff: None,
    }
}

/// Home ── Notes (toggle inside)
///      └─ Tasks database ── Write docs
fn workspace() -> FakeWorkspace {
    let mut ws = FakeWorkspace::new();
    ws.add_page(1, "Home", in_workspace());
    ws.add_blocks(
        in_page(1),
        vec![child_page(2, "Notes"), child_database(3, "Tasks")],
    );
    ws.add_page(2, "Notes", in_page(1));
    ws.add_blocks(
        in_page(2),
        vec![toggle(202, "More", vec![paragraph(203, "Hidden")])],
    );
    ws.add_database(3, "Tasks", in_page(1), &["Name"]);
    ws.add_page(4, "Write docs", in_database(3));
    ws
}

#[tokio::test]
async fn test_retry_reexports_only_the_owning_page() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let ws = workspace();

    ws.fail_children_of(&notion_id(202));
    let first = run_full_export(&ws, &config).await.unwrap();
    assert_eq!(first.stats.errors, 1);

    ws.heal(&notion_id(202));
    ws.clear_requests();
    let summary = run_retry(&ws, &config).await.unwrap();

    assert_eq!(summary.stats.pages, 1);
    assert_eq!(summary.stats.errors, 0);
    assert_eq!(summary.error_log, None);
    assert!(!config.error_log.exists());
    assert_eq!(ws.children_requests(), vec![notion_id(2), notion_id(202)]);

    let notes = fs::read_to_string(dir.path().join("Home/Notes.md")).unwrap();
    assert!(notes.contains("<details><summary>More</summary>\n\nHidden\n\n</details>"));
}

#[tokio::test]
async fn test_retry_keeps_failures_that_happen_again() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let ws = workspace();

    ws.fail_children_of(&notion_id(202));
    run_full_export(&ws, &config).await.unwrap();
    let summary = run_retry(&ws, &config).await.unwrap();

    assert_eq!(summary.stats.errors, 1);
    let log = fs::read_to_string(&config.error_log).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.contains("Process block 00000000-0000-0000-0000-0000000000ca"));
}

#[tokio::test]
async fn test_page_and_database_markers_land_in_their_folders() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let ws = workspace();

    fs::write(
        &config.error_log,
        "[2024-05-01T10:00:00Z] Process page 00000000-0000-0000-0000-000000000004: HTTP 502\n\
         [2024-05-01T10:00:01Z] Process database 00000000000000000000000000000003: timed out\n",
    )
    .unwrap();

    let summary = run_retry(&ws, &config).await.unwrap();

    assert_eq!(summary.stats.databases, 1);
    // The row is exported once even though the database lists it again
    assert_eq!(summary.stats.pages, 1);
    assert!(dir.path().join("Home/Tasks/Write docs.md").is_file());
    assert!(dir.path().join("Home/Tasks/00_Tasks.md").is_file());
    assert!(!dir.path().join("Write docs.md").exists());
}

#[tokio::test]
async fn test_unresolvable_block_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let ws = workspace();

    fs::write(
        &config.error_log,
        "[2024-05-01T10:00:00Z] Process block 00000000-0000-0000-0000-0000000003e7: gone\n",
    )
    .unwrap();

    let summary = run_retry(&ws, &config).await.unwrap();
    assert_eq!(summary.stats.pages, 0);
    assert_eq!(summary.stats.errors, 0);
    assert!(!config.error_log.exists());
}

#[tokio::test]
async fn test_missing_log_means_nothing_to_retry() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace();

    let summary = run_retry(&ws, &config(dir.path())).await.unwrap();

    assert_eq!(summary.stats.pages, 0);
    assert!(ws.children_requests().is_empty());
}
