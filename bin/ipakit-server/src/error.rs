//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON-body HTTP response with an appropriate status code. The
//! form endpoint wraps the same error in [`PlainText`] to answer with a
//! plain-text body instead.
//!
//! **Security note:** server-side failures (storage, conversion, timeouts)
//! are logged with full detail but only a generic message is returned to
//! the caller so that file paths never leak to clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ipakit_core::ConvertError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// Message returned for every server-side failure.
pub const GENERIC_FAILURE: &str = "Error converting file";

/// All errors that can occur in the ipakit-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Propagated from the conversion pipeline.
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error body: `{"error": "<message>"}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl ServerError {
    /// Status code and the message that is safe to show the caller.
    ///
    /// Logs the full detail of server-side failures as a side effect.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_owned())
            }
            ServerError::Convert(e) => match e {
                ConvertError::NoFile => (StatusCode::BAD_REQUEST, e.to_string()),
                ConvertError::UnsupportedFormat(m) => (StatusCode::BAD_REQUEST, m.clone()),
                ConvertError::Upload(m) => {
                    (StatusCode::BAD_REQUEST, format!("Invalid upload: {m}"))
                }
                ConvertError::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, e.to_string()),
                ConvertError::Timeout(_) => {
                    error!(error = %e, "conversion timed out");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("{GENERIC_FAILURE}: request timed out"),
                    )
                }
                ConvertError::Storage(_) | ConvertError::Conversion(_) | ConvertError::Stream(_) => {
                    error!(error = %e, "conversion pipeline error");
                    (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_owned())
                }
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_message();
        (status, Json(ErrorBody { error })).into_response()
    }
}

/// Same error, rendered as a `text/plain` body.
#[derive(Debug)]
pub struct PlainText(pub ServerError);

impl IntoResponse for PlainText {
    fn into_response(self) -> Response {
        let (status, message) = self.0.status_and_message();
        (status, message).into_response()
    }
}
