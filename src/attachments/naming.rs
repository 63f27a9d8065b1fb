// src/attachments/naming.rs
//! Source keys, base names and extensions for downloaded attachments.

use crate::constants::DEFAULT_ATTACHMENT_EXTENSION;
use crate::model::MediaBlock;
use crate::output::sanitize_filename;
use crate::types::plain_text_of;
use std::path::Path;
use url::Url;

const MAX_EXTENSION_CHARS: usize = 10;
const FALLBACK_BASE_NAME: &str = "attachment";

/// Identity of an attachment across runs: the URL without its query string.
///
/// Notion-hosted files come back with a freshly signed query on every
/// request; the path alone is stable.
pub fn source_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .to_string(),
    }
}

/// Lowercased extension of the URL's last path segment, or `bin`.
pub fn url_extension(url: &str) -> String {
    last_segment(url)
        .and_then(|segment| {
            Path::new(&segment)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase)
        })
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_CHARS
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| DEFAULT_ATTACHMENT_EXTENSION.to_string())
}

/// Base name (no extension) for a media block's local file.
///
/// Caption first, then the file's own name, then the URL's last segment.
pub fn suggested_base_name(media: &MediaBlock) -> String {
    let caption = plain_text_of(&media.caption);
    if !caption.trim().is_empty() {
        return caption;
    }

    media
        .name
        .clone()
        .or_else(|| last_segment(media.source.url()))
        .map(|name| strip_extension(&name))
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_BASE_NAME.to_string())
}

/// Sanitized stem used on disk.
pub fn file_stem(suggested: &str) -> String {
    sanitize_filename(suggested)
}

fn last_segment(url: &str) -> Option<String> {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string),
        Err(_) => source_key(url)
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .map(str::to_string),
    }
}

fn strip_extension(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name)
        .to_string()
}
