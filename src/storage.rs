// src/storage.rs

use async_trait::async_trait;
use chrono::Local;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::info;

/// Sentinel used when the model could not read who submitted the form.
const UNKNOWN_SUBMITTER: &str = "unknown";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to store spreadsheet: {0}")]
    Io(#[from] std::io::Error),
}

/// Where finished spreadsheets go. Implementations receive the rendered
/// bytes plus two naming hints from the validated record and return a
/// retrieval location for the operator.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn save_spreadsheet(
        &self,
        data: &[u8],
        submitter: &str,
        document_id: &str,
    ) -> Result<String, StorageError>;
}

/// Store backed by a local directory. Remote stores (MinIO, S3) implement
/// [`ArtifactStore`] with the same naming scheme.
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArtifactStore for LocalDirStore {
    async fn save_spreadsheet(
        &self,
        data: &[u8],
        submitter: &str,
        document_id: &str,
    ) -> Result<String, StorageError> {
        let dir = self.root.join("spreadsheets");
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(object_name(data, submitter, document_id));
        tokio::fs::write(&path, data).await?;

        let location = path.display().to_string();
        info!(path = %location, bytes = data.len(), "Spreadsheet stored");
        Ok(location)
    }
}

/// Object names carry the human hints, a timestamp, and a short content
/// digest to keep same-second exports distinct.
fn object_name(data: &[u8], submitter: &str, document_id: &str) -> String {
    let submitter = if submitter.is_empty() {
        UNKNOWN_SUBMITTER
    } else {
        submitter
    };
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let digest = content_digest(data);
    format!("{submitter}_{document_id}_{timestamp}_{digest}.csv")
}

fn content_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let full = format!("{:x}", hasher.finalize());
    full[..8].to_string()
}
