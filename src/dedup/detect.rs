// src/dedup/detect.rs
//! Finds attachments with identical content.

use crate::constants::{ATTACHMENT_MANIFEST_FILE, PARTIAL_DOWNLOAD_SUFFIX};
use crate::error::AppError;
use indexmap::IndexMap;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// A file to remove in favour of an identical, older one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicatePair {
    pub loser: PathBuf,
    pub keeper: PathBuf,
}

#[derive(Debug, Clone)]
struct Candidate {
    path: PathBuf,
    size: u64,
    /// Earlier of modification and creation time.
    oldest: SystemTime,
}

/// Duplicate pairs among the attachments in `attachments_dir`.
///
/// Files are grouped by size, then confirmed by SHA-256. In each set of
/// identical files the keeper is the one with the earliest timestamp,
/// ties going to the first in name order; every other member is a loser
/// of that keeper.
pub fn find_duplicates(
    attachments_dir: &Path,
    min_size: u64,
) -> Result<Vec<DuplicatePair>, AppError> {
    let candidates = list_candidates(attachments_dir, min_size)?;
    log::info!(
        "Scanning {} attachments of at least {} bytes",
        candidates.len(),
        min_size
    );

    let mut by_size: BTreeMap<u64, Vec<Candidate>> = BTreeMap::new();
    for candidate in candidates {
        by_size.entry(candidate.size).or_default().push(candidate);
    }

    let to_hash: Vec<&Candidate> = by_size
        .values()
        .filter(|group| group.len() >= 2)
        .flatten()
        .collect();
    log::debug!("Hashing {} files that share a size", to_hash.len());

    let hashed: Vec<(String, &Candidate)> = to_hash
        .par_iter()
        .filter_map(|candidate| match hash_file(&candidate.path) {
            Ok(hash) => Some((hash, *candidate)),
            Err(e) => {
                log::warn!("Skipping {}: {}", candidate.path.display(), e);
                None
            }
        })
        .collect();

    // Size is part of the key so that equal hashes never mix size groups
    let mut classes: IndexMap<(u64, String), Vec<&Candidate>> = IndexMap::new();
    for (hash, candidate) in hashed {
        classes.entry((candidate.size, hash)).or_default().push(candidate);
    }

    let mut pairs = Vec::new();
    for members in classes.values().filter(|members| members.len() >= 2) {
        pairs.extend(pair_with_oldest(members));
    }
    pairs.sort_by(|a, b| a.loser.cmp(&b.loser));
    Ok(pairs)
}

/// Every member except the oldest, paired with the oldest.
fn pair_with_oldest(members: &[&Candidate]) -> Vec<DuplicatePair> {
    let Some(keeper) = members.iter().min_by_key(|c| c.oldest) else {
        return Vec::new();
    };
    members
        .iter()
        .filter(|c| c.path != keeper.path)
        .map(|c| DuplicatePair {
            loser: c.path.clone(),
            keeper: keeper.path.clone(),
        })
        .collect()
}

fn list_candidates(attachments_dir: &Path, min_size: u64) -> Result<Vec<Candidate>, AppError> {
    let mut candidates = Vec::new();

    for entry in WalkDir::new(attachments_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() || is_internal(entry.path()) {
            continue;
        }
        let metadata = entry.metadata()?;
        if metadata.len() < min_size {
            continue;
        }

        let modified = metadata.modified()?;
        let oldest = match metadata.created() {
            Ok(created) => created.min(modified),
            Err(_) => modified,
        };
        candidates.push(Candidate {
            path: entry.path().to_path_buf(),
            size: metadata.len(),
            oldest,
        });
    }

    Ok(candidates)
}

/// Manifest, partial downloads and dotfiles are never attachments.
fn is_internal(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    name == ATTACHMENT_MANIFEST_FILE || name.ends_with(PARTIAL_DOWNLOAD_SUFFIX) || name.starts_with('.')
}

fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::time::Duration;

    fn set_modified(path: &Path, time: SystemTime) {
        fs::OpenOptions::new()
            .write(true)
            .open(path)
            .and_then(|file| file.set_modified(time))
            .unwrap();
    }

    fn write(dir: &Path, name: &str, content: &[u8], age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        set_modified(&path, SystemTime::now() - Duration::from_secs(age_secs));
        path
    }

    #[test]
    fn test_older_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let data = vec![7u8; 2048];
        let newer = write(dir.path(), "a.png", &data, 10);
        let older = write(dir.path(), "b.png", &data, 1000);

        let pairs = find_duplicates(dir.path(), 1024).unwrap();
        assert_eq!(
            pairs,
            vec![DuplicatePair {
                loser: newer,
                keeper: older
            }]
        );
    }

    #[test]
    fn test_three_copies_all_point_at_the_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let data = vec![1u8; 4096];
        let a = write(dir.path(), "a.bin", &data, 50);
        let b = write(dir.path(), "b.bin", &data, 5000);
        let c = write(dir.path(), "c.bin", &data, 500);

        let pairs = find_duplicates(dir.path(), 1024).unwrap();
        assert_eq!(
            pairs,
            vec![
                DuplicatePair {
                    loser: a,
                    keeper: b.clone()
                },
                DuplicatePair { loser: c, keeper: b },
            ]
        );
    }

    #[test]
    fn test_same_size_different_content_and_small_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "x.bin", &[1u8; 2048], 10);
        write(dir.path(), "y.bin", &[2u8; 2048], 20);
        write(dir.path(), "s1.txt", b"tiny", 10);
        write(dir.path(), "s2.txt", b"tiny", 20);
        write(dir.path(), "copy.bin.part", &[1u8; 2048], 30);

        assert!(find_duplicates(dir.path(), 1024).unwrap().is_empty());
    }
}
