//! In-memory implementation of BlobStore for testing and development

use crate::core::blob::{BlobStore, UploadTask};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Bytes reported per progress event
const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// In-memory blob store
///
/// Files are served back by the portal under `{base_url}/{path}`.
#[derive(Clone)]
pub struct InMemoryBlobStore {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    base_url: String,
    chunk_size: usize,
}

impl InMemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            files: Arc::new(RwLock::new(HashMap::new())),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Report progress every `chunk_size` bytes
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Download URL of a stored path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn len(&self) -> usize {
        self.files.read().map(|files| files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new("/files")
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<UploadTask> {
        if path.trim().is_empty() {
            return Err(anyhow!("Upload path must not be empty"));
        }

        let total = bytes.len();
        let (task, reporter) = UploadTask::channel(total as u64);
        let files = self.files.clone();
        let path = path.to_string();
        let url = self.url_for(&path);
        let chunk_size = self.chunk_size;

        tokio::spawn(async move {
            let mut transferred = 0;
            reporter.progress(0);
            while transferred < total {
                transferred = (transferred + chunk_size).min(total);
                reporter.progress(transferred as u64);
                tokio::task::yield_now().await;
            }

            let stored = files.write().map(|mut files| {
                files.insert(path.clone(), bytes);
            });
            match stored {
                Ok(()) => {
                    tracing::debug!(path = %path, bytes = total, "Blob stored");
                    reporter.complete(url);
                }
                Err(e) => reporter.fail(format!("Failed to acquire write lock: {}", e)),
            }
        });

        Ok(task)
    }

    async fn delete_by_path(&self, path: &str) -> Result<()> {
        let mut files = self
            .files
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| anyhow!("No blob stored at '{}'", path))
    }

    async fn download(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let files = self
            .files
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(files.get(path).cloned())
    }
}
