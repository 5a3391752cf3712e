//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection, body limit)
//! - The upload form at `/`
//! - Conversion routes (`/convert` for the form, `/api/convert` for JSON clients)
//! - Archive inspection at `/api/detect`
//! - Health route and the OpenAPI document

mod convert;
mod detect;
pub mod doc;
mod health;
mod index;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use tower::ServiceBuilder;

use crate::middleware::{cors, trace};
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let body_limit = state
        .storage
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    Router::new()
        .merge(index::router())
        .merge(convert::router())
        .merge(detect::router())
        .merge(health::router())
        .merge(doc::router())
        // Outermost layers execute first on the way in.
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(ServiceBuilder::new().layer(cors::cors_layer(&state)))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            trace::trace_middleware,
        ))
        .with_state(state)
}
