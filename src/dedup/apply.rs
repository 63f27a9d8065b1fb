// src/dedup/apply.rs
//! Rewrites references to duplicate attachments, then removes them.

use super::detect::DuplicatePair;
use crate::attachments::AttachmentManifest;
use crate::constants::{ATTACHMENTS_DIR, DEDUP_TRASH_DIR};
use crate::error::AppError;
use crate::output::{numbered_filename, write_file};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What an applied deduplication changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupReport {
    pub files_rewritten: usize,
    pub references_rewritten: usize,
    pub trashed: usize,
    pub deleted: usize,
}

/// Points every markdown reference at the keepers, then moves the losers
/// to `<root>/.dedup-trash`.
///
/// Files are only removed once every rewrite has been written; any
/// rewrite failure aborts before anything is removed.
pub fn apply_duplicates(root: &Path, pairs: &[DuplicatePair]) -> Result<DedupReport, AppError> {
    let mut report = DedupReport::default();
    let renames = file_name_map(pairs)?;
    if renames.is_empty() {
        return Ok(report);
    }

    let rewriter = Rewriter::new(&renames)?;
    for path in markdown_files(root)? {
        let content = fs::read_to_string(&path)?;
        let (rewritten, count) = rewriter.rewrite(&content);
        if count > 0 {
            write_file(&path, &rewritten)?;
            report.files_rewritten += 1;
            report.references_rewritten += count;
            log::debug!("Rewrote {} references in {}", count, path.display());
        }
    }

    let attachments_dir = root.join(ATTACHMENTS_DIR);
    let mut manifest = AttachmentManifest::load(&attachments_dir)?;
    let repointed: usize = renames
        .iter()
        .map(|(loser, keeper)| manifest.rename_file(loser, keeper))
        .sum();
    if repointed > 0 {
        manifest.save(&attachments_dir)?;
    }

    let trash = root.join(DEDUP_TRASH_DIR);
    for pair in pairs {
        match move_to_trash(&pair.loser, &trash) {
            Ok(destination) => {
                log::debug!("Moved {} to {}", pair.loser.display(), destination.display());
                report.trashed += 1;
            }
            Err(e) => {
                log::warn!(
                    "Could not move {} to the trash ({}), deleting it",
                    pair.loser.display(),
                    e
                );
                fs::remove_file(&pair.loser)?;
                report.deleted += 1;
            }
        }
    }

    Ok(report)
}

/// Loser file name to keeper file name.
fn file_name_map(pairs: &[DuplicatePair]) -> Result<HashMap<String, String>, AppError> {
    pairs
        .iter()
        .map(|pair| Ok((file_name(&pair.loser)?, file_name(&pair.keeper)?)))
        .collect()
}

fn file_name(path: &Path) -> Result<String, AppError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| AppError::PathError(format!("Not a file name: {}", path.display())))
}

/// Replaces every loser name with its keeper in a single pass.
struct Rewriter<'a> {
    pattern: Regex,
    renames: &'a HashMap<String, String>,
}

impl<'a> Rewriter<'a> {
    fn new(renames: &'a HashMap<String, String>) -> Result<Self, AppError> {
        let mut names: Vec<&String> = renames.keys().collect();
        // Longest first so that `a_1.png` wins over `a_1.pn`
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = names
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&alternation).map_err(|e| AppError::InternalError {
            message: format!("Could not build rewrite pattern: {}", e),
            source: None,
        })?;
        Ok(Self { pattern, renames })
    }

    fn rewrite(&self, content: &str) -> (String, usize) {
        let mut count = 0;
        let rewritten = self.pattern.replace_all(content, |caps: &regex::Captures| {
            count += 1;
            self.renames
                .get(&caps[0])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        });
        (rewritten.into_owned(), count)
    }
}

/// Every `.md` file below `root`, skipping the trash.
fn markdown_files(root: &Path) -> Result<Vec<PathBuf>, AppError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != DEDUP_TRASH_DIR);

    for entry in walker {
        let entry = entry?;
        let is_markdown = entry.path().extension().is_some_and(|ext| ext == "md");
        if entry.file_type().is_file() && is_markdown {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn move_to_trash(path: &Path, trash: &Path) -> Result<PathBuf, AppError> {
    fs::create_dir_all(trash)?;
    let name = file_name(path)?;
    let stem = Path::new(&name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(&name)
        .to_string();
    let extension = Path::new(&name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_string();

    let mut counter = 0;
    let destination = loop {
        let candidate = if extension.is_empty() {
            trash.join(if counter == 0 {
                stem.clone()
            } else {
                format!("{}_{}", stem, counter)
            })
        } else {
            trash.join(numbered_filename(&stem, &extension, counter))
        };
        if !candidate.exists() {
            break candidate;
        }
        counter += 1;
    };

    fs::rename(path, &destination)?;
    Ok(destination)
}
