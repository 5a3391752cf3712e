//! Archive inspection without conversion.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use ipakit_core::{ConvertError, Inspection};
use utoipa::OpenApi;

use crate::error::{ErrorBody, ServerError};
use crate::state::AppState;
use crate::upload::receive_file;

#[derive(OpenApi)]
#[openapi(paths(detect))]
pub struct DetectApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/detect", post(detect))
}

/// List the archive's files and directories and flag Xcode project markers.
///
/// Returns `{"files": [...], "directories": [...], "xcode_detection": {...}}`.
#[utoipa::path(
    post,
    path = "/api/detect",
    tag = "convert",
    request_body(content = crate::routes::convert::ConvertUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Archive inventory", body = serde_json::Value),
        (status = 400, description = "No file, not a ZIP, or unreadable archive", body = ErrorBody),
        (status = 413, description = "Upload exceeds the size limit", body = ErrorBody),
    )
)]
pub async fn detect(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Inspection>, ServerError> {
    let scope = state.storage.open_scope().await?;
    let deadline = state.config.request_timeout;

    let work = async {
        let upload = receive_file(&state.storage, &scope, multipart).await?;
        state.pipeline.inspect(&upload).await
    };
    let inspection = tokio::time::timeout(deadline, work)
        .await
        .map_err(|_| ConvertError::Timeout(deadline))??;
    Ok(Json(inspection))
}
