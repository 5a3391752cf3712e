//! Streaming delivery of a converted artifact.
//!
//! [`ArtifactStream`] reads the artifact from disk and owns the request's
//! [`ScratchSpace`]. The scratch directory is removed once the stream is
//! dropped: after the last chunk, on a read error, or when the client goes
//! away mid-download.

use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::error::{ConvertError, Result};
use crate::scratch::ScratchSpace;

pub struct ArtifactStream {
    inner: ReaderStream<tokio::fs::File>,
    sent: u64,
    finished: bool,
    _scope: ScratchSpace,
}

impl ArtifactStream {
    /// Open `path` (which must live inside `scope`) for streaming.
    pub async fn open(path: &Path, scope: ScratchSpace) -> Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Self {
            inner: ReaderStream::new(file),
            sent: 0,
            finished: false,
            _scope: scope,
        })
    }

    pub fn bytes_sent(&self) -> u64 {
        self.sent
    }
}

impl Stream for ArtifactStream {
    type Item = std::result::Result<Bytes, ConvertError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                self.sent += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                // Headers are already out; end the body and log.
                self.finished = true;
                let err = ConvertError::Stream(e.to_string());
                warn!(bytes_sent = self.sent, error = %err, "artifact stream aborted");
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                self.finished = true;
                debug!(bytes_sent = self.sent, "artifact stream complete");
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for ArtifactStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStream")
            .field("sent", &self.sent)
            .field("finished", &self.finished)
            .finish()
    }
}
