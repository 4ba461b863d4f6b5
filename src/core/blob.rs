//! Blob store contract and upload progress tracking
//!
//! An upload reports progress as a stream of [`UploadProgress`] events and
//! finally resolves to the URL the file can be downloaded from.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::Stream;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Progress of a running upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UploadProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Completion percentage, rounded down
    ///
    /// An empty file is complete as soon as it starts.
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        let percent = self.bytes_transferred.min(self.total_bytes) * 100 / self.total_bytes;
        percent as u8
    }
}

/// Handle on a running upload
#[derive(Debug)]
pub struct UploadTask {
    progress: mpsc::UnboundedReceiver<UploadProgress>,
    url: oneshot::Receiver<Result<String, String>>,
}

/// Producer side of an [`UploadTask`], held by the blob store
#[derive(Debug)]
pub struct UploadReporter {
    progress: mpsc::UnboundedSender<UploadProgress>,
    url: oneshot::Sender<Result<String, String>>,
    total_bytes: u64,
}

impl UploadTask {
    /// Create a connected task / reporter pair
    pub fn channel(total_bytes: u64) -> (UploadTask, UploadReporter) {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let (url_tx, url_rx) = oneshot::channel();
        (
            UploadTask {
                progress: progress_rx,
                url: url_rx,
            },
            UploadReporter {
                progress: progress_tx,
                url: url_tx,
                total_bytes,
            },
        )
    }

    /// Next progress event, `None` once the upload has stopped reporting
    pub async fn next_progress(&mut self) -> Option<UploadProgress> {
        self.progress.recv().await
    }

    /// Wait for the upload to complete and return its download URL
    ///
    /// Progress events not yet consumed are discarded.
    pub async fn finish(self) -> Result<String> {
        match self.url.await {
            Ok(Ok(url)) => Ok(url),
            Ok(Err(message)) => Err(anyhow!("upload failed: {}", message)),
            Err(_) => Err(anyhow!("upload abandoned before completion")),
        }
    }

    /// Split into a progress stream and the completion future
    pub fn into_progress_stream(
        self,
    ) -> (
        impl Stream<Item = UploadProgress> + Send + 'static,
        oneshot::Receiver<Result<String, String>>,
    ) {
        (UnboundedReceiverStream::new(self.progress), self.url)
    }
}

impl UploadReporter {
    /// Report the number of bytes transferred so far
    pub fn progress(&self, bytes_transferred: u64) {
        // The task may have been dropped; progress is best effort
        let _ = self.progress.send(UploadProgress {
            bytes_transferred,
            total_bytes: self.total_bytes,
        });
    }

    /// Resolve the upload with its download URL
    pub fn complete(self, url: String) {
        let _ = self.url.send(Ok(url));
    }

    /// Resolve the upload with an error
    pub fn fail(self, message: impl Into<String>) {
        let _ = self.url.send(Err(message.into()));
    }
}

/// File storage addressed by path
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Start uploading `bytes` to `path`
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<UploadTask>;

    /// Delete the file stored at `path`
    async fn delete_by_path(&self, path: &str) -> Result<()>;

    /// Read back the file stored at `path`
    async fn download(&self, path: &str) -> Result<Option<Vec<u8>>>;
}
