// src/attachments/manifest.rs
//! Persisted source-key to file-name registry for the attachments folder.

use crate::constants::ATTACHMENT_MANIFEST_FILE;
use crate::error::AppError;
use crate::output::numbered_filename;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Which local file each remote attachment was saved as.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentManifest {
    entries: BTreeMap<String, String>,
}

impl AttachmentManifest {
    pub fn path_in(attachments_dir: &Path) -> PathBuf {
        attachments_dir.join(ATTACHMENT_MANIFEST_FILE)
    }

    /// Loads the manifest, or an empty one when none has been written yet.
    pub fn load(attachments_dir: &Path) -> Result<Self, AppError> {
        let path = Self::path_in(attachments_dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)?;
        serde_json::from_str(&raw).map_err(|source| AppError::JsonParseError { path, source })
    }

    /// Writes the manifest through a temporary file and rename.
    pub fn save(&self, attachments_dir: &Path) -> Result<(), AppError> {
        fs::create_dir_all(attachments_dir)?;
        let path = Self::path_in(attachments_dir);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn get(&self, source_key: &str) -> Option<&str> {
        self.entries.get(source_key).map(String::as_str)
    }

    pub fn insert(&mut self, source_key: String, file_name: String) {
        self.entries.insert(source_key, file_name);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First free `stem.ext`, `stem_1.ext`, ... for `source_key`.
    ///
    /// A name is free unless the manifest already assigns it to a different
    /// source.
    pub fn resolve_name(&self, source_key: &str, stem: &str, extension: &str) -> String {
        let mut counter = 0;
        loop {
            let candidate = numbered_filename(stem, extension, counter);
            match self.owner_of(&candidate) {
                Some(owner) if owner != source_key => counter += 1,
                _ => return candidate,
            }
        }
    }

    /// Points every entry naming `from` at `to`. Returns how many changed.
    pub fn rename_file(&mut self, from: &str, to: &str) -> usize {
        let mut changed = 0;
        for file_name in self.entries.values_mut() {
            if file_name == from {
                *file_name = to.to_string();
                changed += 1;
            }
        }
        changed
    }

    fn owner_of(&self, file_name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, name)| name.as_str() == file_name)
            .map(|(key, _)| key.as_str())
    }
}
