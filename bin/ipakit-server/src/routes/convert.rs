//! ZIP → IPA conversion endpoints.
//!
//! `/convert` serves the browser form and answers errors in plain text;
//! `/api/convert` runs the same pipeline and answers errors as JSON.

use std::sync::Arc;

use axum::Router;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::Response;
use axum::routing::post;
use ipakit_core::ConvertError;
use tracing::info;
use utoipa::{OpenApi, ToSchema};

use crate::download;
use crate::error::{ErrorBody, PlainText, ServerError};
use crate::state::AppState;
use crate::upload::receive_file;

#[derive(OpenApi)]
#[openapi(
    paths(convert_form, convert_api),
    components(schemas(ConvertUpload, ErrorBody))
)]
pub struct ConvertApi;

/// Multipart form accepted by the conversion endpoints.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ConvertUpload {
    /// The ZIP archive.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/convert", post(convert_form))
        .route("/api/convert", post(convert_api))
}

/// Convert an uploaded ZIP and return it as an `.ipa` download.
#[utoipa::path(
    post,
    path = "/convert",
    tag = "convert",
    request_body(content = ConvertUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "IPA file as application/octet-stream attachment"),
        (status = 400, description = "No file, or not a ZIP archive (text/plain)"),
        (status = 413, description = "Upload exceeds the size limit (text/plain)"),
        (status = 500, description = "Conversion failed (text/plain)"),
    )
)]
pub async fn convert_form(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, PlainText> {
    convert(&state, multipart).await.map_err(PlainText)
}

/// Same as `/convert`, with errors reported as `{"error": "..."}`.
#[utoipa::path(
    post,
    path = "/api/convert",
    tag = "convert",
    request_body(content = ConvertUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "IPA file as application/octet-stream attachment"),
        (status = 400, description = "No file, or not a ZIP archive", body = ErrorBody),
        (status = 413, description = "Upload exceeds the size limit", body = ErrorBody),
        (status = 500, description = "Conversion failed", body = ErrorBody),
    )
)]
pub async fn convert_api(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    convert(&state, multipart).await
}

async fn convert(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    let scope = state.storage.open_scope().await?;
    let deadline = state.config.request_timeout;

    let work = async {
        let upload = receive_file(&state.storage, &scope, multipart).await?;
        state.pipeline.convert(&scope, &upload).await
    };
    let artifact = tokio::time::timeout(deadline, work)
        .await
        .map_err(|_| ConvertError::Timeout(deadline))??;

    info!(
        download_name = %artifact.download_name,
        transform = state.pipeline.transformer_name(),
        "upload converted"
    );
    download::attachment(artifact, scope).await
}
