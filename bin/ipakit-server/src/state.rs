//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use ipakit_core::{Pipeline, Storage};

use crate::config::Config;

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Temp root and upload size limit.
    pub storage: Storage,
    /// Validation and the configured transform.
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let storage = Storage::new(config.temp_dir.clone(), config.max_upload_bytes());
        let pipeline = Pipeline::new(config.transform.build());
        Self {
            config: Arc::new(config),
            storage,
            pipeline,
        }
    }
}
