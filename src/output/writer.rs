// src/output/writer.rs
//! Whole-file writes and timestamp stamping for the export tree.
//!
//! Pages are written in one call so that a crash mid-run never leaves a
//! half-written markdown file behind.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Writes content to a file, creating parent directories as needed.
pub fn write_file(path: &Path, content: &str) -> Result<usize, AppError> {
    log::debug!("Writing {} bytes to {}", content.len(), path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, content)?;

    log::debug!("Wrote file: {}", path.display());
    Ok(content.len())
}

/// Creates a directory.
pub fn create_directory(path: &Path) -> Result<(), AppError> {
    if path.exists() {
        if path.is_dir() {
            return Ok(());
        }
        return Err(AppError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Path exists but is not a directory: {}", path.display()),
        )));
    }

    fs::create_dir_all(path)?;
    log::debug!("Created directory: {}", path.display());
    Ok(())
}

/// Sets a file's modification time (now when absent) and, where the
/// platform allows it, its creation time.
///
/// Failing to set the creation time is logged and otherwise ignored.
pub fn stamp_file_times(
    path: &Path,
    created: Option<DateTime<Utc>>,
    modified: Option<DateTime<Utc>>,
) -> Result<(), AppError> {
    let modified = modified.map(SystemTime::from).unwrap_or_else(SystemTime::now);
    let file = fs::OpenOptions::new().write(true).open(path)?;
    file.set_modified(modified)?;

    if let Some(created) = created {
        if let Err(e) = set_creation_time(&file, created.into()) {
            log::debug!("Creation time not set on {}: {}", path.display(), e);
        }
    }
    Ok(())
}

#[cfg(any(windows, target_os = "macos"))]
fn set_creation_time(file: &File, created: SystemTime) -> io::Result<()> {
    #[cfg(target_os = "macos")]
    use std::os::macos::fs::FileTimesExt;
    #[cfg(windows)]
    use std::os::windows::fs::FileTimesExt;

    file.set_times(fs::FileTimes::new().set_created(created))
}

#[cfg(not(any(windows, target_os = "macos")))]
fn set_creation_time(_file: &File, _created: SystemTime) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "creation time cannot be set on this platform",
    ))
}
