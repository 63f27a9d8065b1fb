// src/export/edit_time.rs
//! Recovers a page's real last-edit time from its blocks.
//!
//! A workspace-wide event can bump every page's `last_edited_time` past a
//! known cutoff while leaving block timestamps intact. Given that cutoff,
//! the newest block edited before it is the best estimate of when the
//! content last changed.

use crate::model::{Block, Page};
use chrono::{DateTime, Utc};

/// Latest block timestamp strictly before `cutoff`, scanning the loaded
/// subtree depth-first.
///
/// Child pages and child databases belong to other documents: neither
/// their own timestamp nor anything below them counts.
pub fn recover_true_edit_time(blocks: &[Block], cutoff: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let mut latest: Option<DateTime<Utc>> = None;
    scan(blocks, cutoff, &mut latest);
    latest
}

fn scan(blocks: &[Block], cutoff: DateTime<Utc>, latest: &mut Option<DateTime<Utc>>) {
    for block in blocks {
        if block.is_child_boundary() {
            continue;
        }
        if let Some(edited) = block.common().last_edited_time {
            if edited < cutoff && latest.map_or(true, |current| edited > current) {
                *latest = Some(edited);
            }
        }
        scan(block.children(), cutoff, latest);
    }
}

/// The `content_updated` value for a page, if recovery applies.
///
/// Only pages whose reported edit time is at or after the cutoff are
/// considered corrupted.
pub fn content_updated_time(page: &Page, cutoff: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    let cutoff = cutoff?;
    if page.last_edited_time < cutoff {
        return None;
    }
    let recovered = recover_true_edit_time(&page.blocks, cutoff);
    match recovered {
        Some(time) => log::debug!("Recovered edit time {} for page {}", time, page.id),
        None => log::debug!("No block of page {} predates the cutoff", page.id),
    }
    recovered
}
