//! Storage adapter: persists inbound byte streams into scratch space.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use crate::error::{ConvertError, Result};
use crate::scratch::ScratchSpace;
use crate::upload::{UploadRequest, sanitize_filename};

/// Writes uploads below a shared temp root, one [`ScratchSpace`] per request.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    max_upload_bytes: u64,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>, max_upload_bytes: u64) -> Self {
        Self {
            root: root.into(),
            max_upload_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Make sure the temp root exists. Called once at startup.
    pub async fn prepare(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Open a new request scope under the temp root.
    pub async fn open_scope(&self) -> Result<ScratchSpace> {
        Ok(ScratchSpace::create(&self.root).await?)
    }

    /// Stream `body` into a fresh file inside `scope`.
    ///
    /// The size limit is enforced while streaming, so an oversized upload is
    /// rejected without being fully buffered. A partially written file stays
    /// inside `scope` and disappears with it.
    pub async fn store<S, E>(
        &self,
        scope: &ScratchSpace,
        filename_hint: &str,
        declared_mime: Option<&str>,
        body: S,
    ) -> Result<UploadRequest>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        ConvertError: From<E>,
    {
        let original_name = sanitize_filename(filename_hint);
        let path = scope.allocate("input", "upload");

        let file = tokio::fs::File::create(&path).await?;
        let mut writer = BufWriter::new(file);
        let mut size: u64 = 0;

        futures::pin_mut!(body);
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            size += chunk.len() as u64;
            if size > self.max_upload_bytes {
                return Err(ConvertError::TooLarge {
                    limit: self.max_upload_bytes,
                });
            }
            writer.write_all(&chunk).await?;
        }
        writer.flush().await?;

        if size == 0 {
            debug!(original_name = %original_name, "empty upload rejected");
            return Err(ConvertError::NoFile);
        }

        info!(
            original_name = %original_name,
            declared_mime = declared_mime.unwrap_or("-"),
            size_bytes = size,
            path = %path.display(),
            "saved upload to scratch space"
        );

        Ok(UploadRequest {
            original_name,
            declared_mime: declared_mime.map(str::to_owned),
            size,
            path,
        })
    }
}
