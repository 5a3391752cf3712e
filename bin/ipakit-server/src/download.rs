//! Attachment responses for converted artifacts.

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use ipakit_core::{ArtifactStream, ConvertedArtifact, ScratchSpace};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::info;

use crate::error::ServerError;

/// RFC 5987 `attr-char`: everything but ALPHA / DIGIT and these marks is escaped.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Stream `artifact` to the client as an `.ipa` download.
///
/// The response body takes ownership of `scope`; its directory is removed
/// when the body is finished or dropped.
pub async fn attachment(
    artifact: ConvertedArtifact,
    scope: ScratchSpace,
) -> Result<Response, ServerError> {
    let stream = ArtifactStream::open(&artifact.path, scope).await?;

    info!(
        download_name = %artifact.download_name,
        size_bytes = artifact.size,
        "streaming converted artifact"
    );

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        ),
        (
            header::CONTENT_DISPOSITION,
            content_disposition(&artifact.download_name),
        ),
        (header::CONTENT_LENGTH, HeaderValue::from(artifact.size)),
    ];
    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}

/// `attachment; filename="…"`, plus an RFC 5987 `filename*` when the name
/// is not plain ASCII.
pub fn content_disposition(name: &str) -> HeaderValue {
    let fallback: String = name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let value = if fallback == name {
        format!("attachment; filename=\"{fallback}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            utf8_percent_encode(name, ATTR_CHAR)
        )
    };
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
