// src/output/paths.rs
//! Pure functions for path calculations and filename generation.
//!
//! This module handles all path-related operations without
//! performing any I/O operations.

use crate::constants::{DATABASE_DESCRIPTION_PREFIX, FILENAME_MAX_CHARS};
use crate::error::AppError;
use std::path::{Path, PathBuf};

const UNTITLED: &str = "Untitled";

/// Sanitizes a title to be safe for use as a file or folder name.
///
/// Characters illegal on common filesystems are dropped, runs of
/// whitespace collapse to one space, and the result is capped at
/// `FILENAME_MAX_CHARS` characters.
pub fn sanitize_filename(name: &str) -> String {
    let stripped: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    let capped: String = collapsed.chars().take(FILENAME_MAX_CHARS).collect();

    // Windows refuses names ending in a dot or space
    let safe_name = capped.trim().trim_matches('.').trim();

    if safe_name.is_empty() {
        UNTITLED.to_string()
    } else {
        safe_name.to_string()
    }
}

/// Where a page's markdown file goes.
///
/// A page with subordinate exports becomes `<parent>/<title>/<title>.md`;
/// otherwise it is `<parent>/<title>.md`.
pub fn page_file_path(parent_dir: &Path, title: &str, as_folder: bool) -> PathBuf {
    let name = sanitize_filename(title);
    let file_name = format!("{}.md", name);
    if as_folder {
        parent_dir.join(&name).join(file_name)
    } else {
        parent_dir.join(file_name)
    }
}

/// Folder for a database: `<parent>/<title>/`.
pub fn database_dir(parent_dir: &Path, title: &str) -> PathBuf {
    parent_dir.join(sanitize_filename(title))
}

/// Description file inside a database folder, sorting before member pages.
pub fn database_description_path(database_dir: &Path, title: &str) -> PathBuf {
    database_dir.join(format!(
        "{}{}.md",
        DATABASE_DESCRIPTION_PREFIX,
        sanitize_filename(title)
    ))
}

/// `stem.ext`, or `stem_N.ext` for the Nth collision.
pub fn numbered_filename(stem: &str, extension: &str, counter: usize) -> String {
    if counter == 0 {
        format!("{}.{}", stem, extension)
    } else {
        format!("{}_{}.{}", stem, counter, extension)
    }
}

/// Calculates a relative path from one file to another.
pub fn get_relative_path(from: &Path, to: &Path) -> Result<String, AppError> {
    let from_dir = from.parent().unwrap_or_else(|| Path::new("."));

    let relative = pathdiff::diff_paths(to, from_dir).ok_or_else(|| {
        AppError::PathError(format!(
            "Could not calculate relative path from {} to {}",
            from.display(),
            to.display()
        ))
    })?;

    // Ensure forward slashes for Markdown compatibility
    Ok(relative.to_string_lossy().replace('\\', "/"))
}
