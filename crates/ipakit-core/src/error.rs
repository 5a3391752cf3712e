use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while storing, validating, transforming or
/// delivering an uploaded archive.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The request carried no `file` part, or the part was empty.
    #[error("No file uploaded")]
    NoFile,

    /// The upload is not a ZIP archive (declared type or content signature).
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The inbound multipart stream was malformed or broke off mid-upload.
    #[error("upload failed: {0}")]
    Upload(String),

    /// The upload exceeded the configured size limit.
    #[error("file too large: exceeds maximum of {limit} bytes")]
    TooLarge { limit: u64 },

    /// A filesystem I/O error occurred in the scratch area.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// The transform stage failed to produce an artifact.
    #[error("conversion failed: {0}")]
    Conversion(String),

    /// Delivering the artifact to the caller failed after headers were sent.
    #[error("stream error: {0}")]
    Stream(String),

    /// The upload/convert phase did not finish within the request deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl ConvertError {
    /// `true` when the caller sent something we refuse to process.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ConvertError::NoFile
                | ConvertError::UnsupportedFormat(_)
                | ConvertError::Upload(_)
                | ConvertError::TooLarge { .. }
        )
    }
}

impl From<zip::result::ZipError> for ConvertError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => ConvertError::Storage(io),
            other => ConvertError::Conversion(other.to_string()),
        }
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
