// src/output/mod.rs
//! Output handling with clear separation of path planning and file I/O.
//!
//! `paths` is pure; `writer` is the only place that touches page files.

mod paths;
mod writer;

pub use paths::{
    database_description_path, database_dir, get_relative_path, numbered_filename,
    page_file_path, sanitize_filename,
};
pub use writer::{create_directory, stamp_file_times, write_file};
