// src/attachments/mod.rs
//! Attachment materialization: stable naming, download-once, manifest.

mod manifest;
mod materializer;
mod naming;

pub use manifest::AttachmentManifest;
pub use materializer::{AttachmentStore, AttachmentTimes, Materialized};
pub use naming::{source_key, suggested_base_name, url_extension};
