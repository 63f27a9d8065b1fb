// src/export/layout.rs
//! Where pages and databases land in the export tree.

use crate::api::NotionRepository;
use crate::error::AppError;
use crate::model::{walk_blocks, Block, Parent};
use crate::output::sanitize_filename;
use crate::types::NotionId;
use std::path::{Path, PathBuf};

/// Guards the parent walk against a malformed, cyclic parent chain.
const MAX_ANCESTOR_DEPTH: usize = 64;

/// A page or database exported as its own file below the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildTarget {
    Page(NotionId),
    Database(NotionId),
}

/// Child page and child database references, in document order.
pub fn child_targets(blocks: &[Block]) -> Vec<ChildTarget> {
    let mut targets = Vec::new();
    walk_blocks(blocks, &mut |block| match block {
        Block::ChildPage(child) => targets.push(ChildTarget::Page(NotionId::from(&child.common.id))),
        Block::ChildDatabase(child) => {
            targets.push(ChildTarget::Database(NotionId::from(&child.common.id)))
        }
        _ => {}
    });
    targets
}

/// Whether a page needs its own folder for subordinate exports.
pub fn needs_folder(blocks: &[Block]) -> bool {
    let mut found = false;
    walk_blocks(blocks, &mut |block| found |= block.is_child_boundary());
    found
}

/// Directory a full export would place an object with this parent in.
///
/// Walks the parent chain upward. Anything that cannot be resolved puts the
/// object directly under `root`.
pub async fn resolve_parent_dir(
    repo: &dyn NotionRepository,
    parent: Option<&Parent>,
    root: &Path,
) -> PathBuf {
    let mut segments: Vec<String> = Vec::new();
    let mut current = parent.cloned();

    for _ in 0..MAX_ANCESTOR_DEPTH {
        match step(repo, current.as_ref()).await {
            Ok(Step::Root) => return join_segments(root, &segments),
            Ok(Step::Folder(name, next)) => {
                segments.push(name);
                current = next;
            }
            Ok(Step::Through(next)) => current = next,
            Err(e) => {
                log::warn!(
                    "Could not resolve the location of {:?}, using the export root: {}",
                    parent,
                    e
                );
                return root.to_path_buf();
            }
        }
    }

    log::warn!("Parent chain of {:?} is too deep, using the export root", parent);
    root.to_path_buf()
}

enum Step {
    Root,
    /// An ancestor that is a folder in the export tree.
    Folder(String, Option<Parent>),
    /// A block between a child and its page; contributes no folder.
    Through(Option<Parent>),
}

async fn step(repo: &dyn NotionRepository, parent: Option<&Parent>) -> Result<Step, AppError> {
    match parent {
        None | Some(Parent::Workspace) => Ok(Step::Root),
        Some(Parent::Page { page_id }) => {
            let page = repo.retrieve_page(&NotionId::from(page_id)).await?;
            Ok(Step::Folder(
                sanitize_filename(page.title.as_str()),
                page.parent,
            ))
        }
        Some(Parent::Database { database_id }) => {
            let database = repo
                .retrieve_database(&NotionId::from(database_id))
                .await?;
            Ok(Step::Folder(
                sanitize_filename(&database.title.as_plain_text()),
                database.parent,
            ))
        }
        Some(Parent::Block { block_id }) => {
            let block = repo.retrieve_block(&NotionId::from(block_id)).await?;
            Ok(Step::Through(block.common().parent.clone()))
        }
    }
}

fn join_segments(root: &Path, segments_leaf_first: &[String]) -> PathBuf {
    segments_leaf_first
        .iter()
        .rev()
        .fold(root.to_path_buf(), |dir, name| dir.join(name))
}
