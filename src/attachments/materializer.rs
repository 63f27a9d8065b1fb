// src/attachments/materializer.rs
//! Downloads attachments into the flat attachments folder, once.

use super::manifest::AttachmentManifest;
use super::naming::{file_stem, source_key, url_extension};
use crate::constants::{ATTACHMENTS_DIR, PARTIAL_DOWNLOAD_SUFFIX};
use crate::error::AppError;
use crate::output::{create_directory, stamp_file_times};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const MAX_REDIRECTS: usize = 10;

/// Timestamps inherited from the page that owns an attachment.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttachmentTimes {
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

/// Outcome of a materialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Materialized {
    pub path: PathBuf,
    /// False when an earlier run already had the file.
    pub downloaded: bool,
}

/// The attachments folder of one export tree plus its manifest.
pub struct AttachmentStore {
    dir: PathBuf,
    manifest: AttachmentManifest,
    client: Client,
}

impl AttachmentStore {
    /// Opens `<export_root>/attachments`, creating it if needed.
    pub fn open(export_root: &Path) -> Result<Self, AppError> {
        // Signed file URLs reject the API's Authorization header, so this
        // client carries no Notion credentials.
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Self::with_client(export_root, client)
    }

    pub fn with_client(export_root: &Path, client: Client) -> Result<Self, AppError> {
        let dir = export_root.join(ATTACHMENTS_DIR);
        create_directory(&dir)?;
        let manifest = AttachmentManifest::load(&dir)?;
        log::debug!(
            "Attachment store at {} with {} known files",
            dir.display(),
            manifest.len()
        );
        Ok(Self {
            dir,
            manifest,
            client,
        })
    }

    /// Resolves `url` to a local file, downloading it only if no earlier run
    /// already saved it.
    pub async fn materialize(
        &mut self,
        url: &str,
        suggested_name: &str,
        times: AttachmentTimes,
    ) -> Result<Materialized, AppError> {
        let key = source_key(url);

        if let Some(existing) = self.manifest.get(&key) {
            let path = self.dir.join(existing);
            if path.is_file() {
                log::trace!("Attachment {} already at {}", key, path.display());
                return Ok(Materialized {
                    path,
                    downloaded: false,
                });
            }
        }

        let file_name = self
            .manifest
            .resolve_name(&key, &file_stem(suggested_name), &url_extension(url));
        let path = self.dir.join(&file_name);

        if path.is_file() {
            log::debug!("Reusing unregistered attachment {}", path.display());
            self.manifest.insert(key, file_name);
            return Ok(Materialized {
                path,
                downloaded: false,
            });
        }

        download(&self.client, url, &path).await?;
        stamp_file_times(&path, times.created, times.modified)?;
        self.manifest.insert(key, file_name);
        log::debug!("Downloaded attachment {}", path.display());

        Ok(Materialized {
            path,
            downloaded: true,
        })
    }

    /// Persists the manifest. Called at the end of a run.
    pub fn save_manifest(&self) -> Result<(), AppError> {
        self.manifest.save(&self.dir)
    }
}

/// Streams `url` into a `.part` file and renames it into place.
async fn download(client: &Client, url: &str, path: &Path) -> Result<(), AppError> {
    let mut partial_name = path.as_os_str().to_owned();
    partial_name.push(PARTIAL_DOWNLOAD_SUFFIX);
    let partial = PathBuf::from(partial_name);

    match stream_to_file(client, url, &partial).await {
        Ok(()) => {
            tokio::fs::rename(&partial, path).await?;
            Ok(())
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Could not remove {}: {}", partial.display(), cleanup);
                }
            }
            Err(e)
        }
    }
}

async fn stream_to_file(client: &Client, url: &str, partial: &Path) -> Result<(), AppError> {
    let mut response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::DownloadFailed {
            url: source_key(url),
            reason: format!("HTTP {}", status),
        });
    }

    let mut file = tokio::fs::File::create(partial).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}
