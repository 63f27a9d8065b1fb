// src/constants.rs
//! Domain constants that define the operational boundaries of the exporter.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role.

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// How many objects the Notion API returns per page of results.
///
/// The Notion API maximum is 100. We use the maximum to minimize
/// round-trips while walking large workspaces.
pub const NOTION_API_PAGE_SIZE: usize = 100;

/// How many times a single page-of-results request is attempted.
pub const RETRIEVAL_MAX_ATTEMPTS: u32 = 3;

/// Base delay between attempts. Attempt `n` waits `n * base`.
pub const RETRIEVAL_BASE_DELAY_MS: u64 = 1000;

// ---------------------------------------------------------------------------
// Output layout
// ---------------------------------------------------------------------------

/// Flat directory under the export root holding every downloaded attachment.
pub const ATTACHMENTS_DIR: &str = "attachments";

/// Source-key to filename registry, stored inside the attachments directory.
pub const ATTACHMENT_MANIFEST_FILE: &str = ".manifest.json";

/// Suffix for in-flight downloads. Renamed into place once complete.
pub const PARTIAL_DOWNLOAD_SUFFIX: &str = ".part";

/// Extension used when an attachment URL carries none.
pub const DEFAULT_ATTACHMENT_EXTENSION: &str = "bin";

/// Prefix of the synthetic description file inside a database folder.
///
/// `00_` sorts before any member page title in a directory listing.
pub const DATABASE_DESCRIPTION_PREFIX: &str = "00_";

/// Default name of the error log, relative to the export root.
pub const DEFAULT_ERROR_LOG_FILE: &str = "export-errors.log";

/// Maximum length, in characters, of a sanitized file or folder name.
pub const FILENAME_MAX_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Number of spaces per list nesting level.
pub const INDENT_SPACES: usize = 2;

/// Glyph used for callouts that carry no emoji icon.
pub const DEFAULT_CALLOUT_ICON: &str = "💡";

/// Estimated characters per block, used to pre-allocate output strings.
pub const CHARS_PER_BLOCK_ESTIMATE: usize = 256;

// ---------------------------------------------------------------------------
// Deduplication
// ---------------------------------------------------------------------------

/// Attachments smaller than this are never considered for deduplication.
pub const DEDUP_MIN_FILE_SIZE: u64 = 1024;

/// Where deduplicated losers are moved, relative to the export root.
pub const DEDUP_TRASH_DIR: &str = ".dedup-trash";
