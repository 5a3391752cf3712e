//! Validate → inspect → transform, over a stored upload.
//!
//! The pipeline never owns scratch space; callers pass the request's
//! [`ScratchSpace`] in and keep it until the artifact has been delivered.
//! The blocking transform holds its own handle on the scope, and is
//! cancelled if the calling future is dropped (for example on timeout).

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{ConvertError, Result};
use crate::inspect::{self, Inspection};
use crate::job::ConversionJob;
use crate::scratch::ScratchSpace;
use crate::transform::{TransformReport, Transformer};
use crate::upload::{IPA_EXTENSION, UploadRequest};
use crate::validate::Validator;

/// A finished artifact inside a request's scratch space.
#[derive(Debug, Clone)]
pub struct ConvertedArtifact {
    pub path: PathBuf,
    /// File name offered to the client, always ending in `.ipa`.
    pub download_name: String,
    pub size: u64,
    pub report: TransformReport,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    validator: Validator,
    transformer: Arc<dyn Transformer>,
}

impl Pipeline {
    pub fn new(transformer: Arc<dyn Transformer>) -> Self {
        Self {
            validator: Validator::new(),
            transformer,
        }
    }

    pub fn transformer_name(&self) -> &'static str {
        self.transformer.name()
    }

    /// Convert a stored upload into an `.ipa` inside `scope`.
    pub async fn convert(
        &self,
        scope: &ScratchSpace,
        upload: &UploadRequest,
    ) -> Result<ConvertedArtifact> {
        self.validator.validate(upload).await?;
        self.log_inspection(upload).await;

        let output = scope.allocate("output", IPA_EXTENSION);
        let mut job = ConversionJob::new(upload.path.clone(), output, self.transformer.name());

        let cancel = CancellationToken::new();
        let _cancel_on_drop = cancel.clone().drop_guard();
        let transformer = Arc::clone(&self.transformer);
        let (input, out) = (job.input.clone(), job.output.clone());
        let held = scope.clone();
        let result = run_blocking("transform", move || {
            let report = transformer.transform(&input, &out, &cancel);
            drop(held);
            report
        })
        .await;

        match result {
            Ok(report) => {
                job.complete();
                info!(
                    job_id = %job.id,
                    transform = job.transform,
                    status = %job.status(),
                    bytes = report.bytes_written,
                    elapsed_ms = job.elapsed().as_millis() as u64,
                    "conversion finished"
                );
                Ok(ConvertedArtifact {
                    path: job.output,
                    download_name: upload.download_name(),
                    size: report.bytes_written,
                    report,
                })
            }
            Err(e) => {
                job.fail();
                warn!(
                    job_id = %job.id,
                    transform = job.transform,
                    status = %job.status(),
                    error = %e,
                    "conversion failed"
                );
                Err(e)
            }
        }
    }

    /// Validate a stored upload and list its contents without converting.
    pub async fn inspect(&self, upload: &UploadRequest) -> Result<Inspection> {
        self.validator.validate(upload).await?;
        let path = upload.path.clone();
        run_blocking("inspect", move || inspect::inspect(&path)).await
    }

    /// Inspection during conversion is informational only: a ZIP whose
    /// central directory cannot be read is still converted.
    async fn log_inspection(&self, upload: &UploadRequest) {
        let path = upload.path.clone();
        match run_blocking("inspect", move || inspect::inspect(&path)).await {
            Ok(found) => info!(
                original_name = %upload.original_name,
                file_count = found.file_count(),
                directory_count = found.directory_count(),
                has_xcode_project = found.xcode_detection.has_xcode_project,
                "archive inspected"
            ),
            Err(e) => warn!(
                original_name = %upload.original_name,
                error = %e,
                "archive could not be inspected; converting anyway"
            ),
        }
    }
}

/// Run blocking archive work off the async workers.
async fn run_blocking<T, F>(stage: &'static str, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ConvertError::Conversion(format!("{stage} task panicked: {e}")))?
}
