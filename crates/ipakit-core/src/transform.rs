//! Transform stage: turns a validated ZIP into an `.ipa` artifact.
//!
//! Transformers are synchronous and run inside `spawn_blocking` (see
//! [`crate::pipeline`]). Two implementations ship:
//!
//! - [`CopyTransformer`] writes a byte-identical copy. This is the default.
//! - [`PayloadTransformer`] rewrites the archive so that every entry lives
//!   under `Payload/`, the layout iOS expects inside an `.ipa`.

use std::collections::HashSet;
use std::fmt::Debug;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use strum::{Display, EnumString};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{ConvertError, Result};

/// Top-level directory of an IPA archive.
pub const PAYLOAD_DIR: &str = "Payload/";

/// What a transform did, for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    pub bytes_written: u64,
    /// Archive entries written; `None` for byte-level transforms.
    pub entries_written: Option<usize>,
    pub entries_skipped: usize,
}

pub trait Transformer: Send + Sync + Debug {
    /// Short name used in logs and job records.
    fn name(&self) -> &'static str;

    /// Read `input` and write the artifact to `output`. Blocking.
    ///
    /// Stops with [`ConvertError::Conversion`] once `cancel` fires.
    fn transform(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<TransformReport>;
}

/// Selects a transformer by name (`copy` or `payload`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum TransformKind {
    #[default]
    #[strum(serialize = "copy")]
    Copy,
    #[strum(serialize = "payload")]
    Payload,
}

impl TransformKind {
    pub fn build(self) -> Arc<dyn Transformer> {
        match self {
            TransformKind::Copy => Arc::new(CopyTransformer),
            TransformKind::Payload => Arc::new(PayloadTransformer),
        }
    }
}

// ─── Copy ─────────────────────────────────────────────────────────────────────

/// Identity transform: the artifact has exactly the uploaded bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyTransformer;

impl Transformer for CopyTransformer {
    fn name(&self) -> &'static str {
        "copy"
    }

    fn transform(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<TransformReport> {
        check_cancelled(cancel)?;
        let bytes_written = std::fs::copy(input, output)
            .map_err(|e| ConvertError::Conversion(format!("copy failed: {e}")))?;
        Ok(TransformReport {
            bytes_written,
            entries_written: None,
            entries_skipped: 0,
        })
    }
}

// ─── Payload ──────────────────────────────────────────────────────────────────

/// Re-roots every entry under `Payload/` without recompressing entry data.
///
/// Finder metadata (`__MACOSX/`, `.DS_Store`) and entries whose names would
/// escape the archive root are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadTransformer;

impl PayloadTransformer {
    /// Name of `entry` inside the output, or `None` if it is dropped.
    pub fn target_name(entry: &str) -> Option<String> {
        if entry.starts_with("__MACOSX/") || entry.rsplit('/').next() == Some(".DS_Store") {
            return None;
        }
        if entry == PAYLOAD_DIR {
            return None;
        }
        if entry.starts_with(PAYLOAD_DIR) {
            Some(entry.to_owned())
        } else {
            Some(format!("{PAYLOAD_DIR}{entry}"))
        }
    }
}

impl Transformer for PayloadTransformer {
    fn name(&self) -> &'static str {
        "payload"
    }

    fn transform(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<TransformReport> {
        check_cancelled(cancel)?;
        let mut archive = ZipArchive::new(File::open(input)?)
            .map_err(|e| ConvertError::Conversion(format!("cannot read input archive: {e}")))?;

        let out = File::create(output)?;
        let mut writer = ZipWriter::new(BufWriter::new(out));
        writer.add_directory(PAYLOAD_DIR, SimpleFileOptions::default())?;

        let mut seen: HashSet<String> = HashSet::from([PAYLOAD_DIR.to_owned()]);
        let mut written = 0usize;
        let mut skipped = 0usize;
        for i in 0..archive.len() {
            check_cancelled(cancel)?;
            let entry = archive.by_index_raw(i)?;
            let name = entry.name().to_owned();

            if entry.enclosed_name().is_none() {
                warn!(entry = %name, "dropping entry with unsafe path");
                skipped += 1;
                continue;
            }
            let Some(target) = Self::target_name(&name) else {
                debug!(entry = %name, "dropping metadata entry");
                skipped += 1;
                continue;
            };

            if !seen.insert(target.clone()) {
                warn!(entry = %name, target = %target, "dropping entry that collides with an earlier one");
                skipped += 1;
                continue;
            }

            writer.raw_copy_file_rename(entry, target)?;
            written += 1;
        }

        let inner = writer.finish()?;
        let file = inner
            .into_inner()
            .map_err(|e| ConvertError::Storage(e.into_error()))?;
        let bytes_written = file.metadata()?.len();

        Ok(TransformReport {
            bytes_written,
            entries_written: Some(written),
            entries_skipped: skipped,
        })
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(ConvertError::Conversion("transform cancelled".into()))
    } else {
        Ok(())
    }
}
