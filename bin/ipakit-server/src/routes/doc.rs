use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::routes::{convert, detect, health};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(info(
    title = "ipakit-server",
    description = "ZIP to IPA conversion API",
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(convert::ConvertApi::openapi());
    root.merge(detect::DetectApi::openapi());
    root.merge(health::HealthApi::openapi());
    root
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api-docs/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(get_docs())
}
