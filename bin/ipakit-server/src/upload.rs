//! Multipart upload extraction.

use axum::extract::Multipart;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use futures::TryStreamExt;
use ipakit_core::{ConvertError, ScratchSpace, Storage, UploadRequest};
use tracing::debug;

/// Name of the form field carrying the archive.
pub const FILE_FIELD: &str = "file";

/// Stream the `file` field of `multipart` into `scope`.
///
/// Other fields are skipped. A request that is not multipart at all, or that
/// has no `file` field, is reported as [`ConvertError::NoFile`].
pub async fn receive_file(
    storage: &Storage,
    scope: &ScratchSpace,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadRequest, ConvertError> {
    let mut multipart = multipart.map_err(|e| {
        debug!(error = %e, "request is not a multipart upload");
        ConvertError::NoFile
    })?;

    let limit = storage.max_upload_bytes();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            debug!(field = ?field.name(), "skipping unexpected form field");
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_owned();
        let content_type = field.content_type().map(str::to_owned);
        let body = field.map_err(move |e| multipart_error(e, limit));
        return storage
            .store(scope, &file_name, content_type.as_deref(), body)
            .await;
    }

    Err(ConvertError::NoFile)
}

/// Classify a body or framing failure raised while reading the multipart stream.
fn multipart_error(e: MultipartError, limit: u64) -> ConvertError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ConvertError::TooLarge { limit }
    } else {
        ConvertError::Upload(e.body_text())
    }
}
