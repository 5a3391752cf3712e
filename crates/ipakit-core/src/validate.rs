//! Upload validation: declared type plus content signature.
//!
//! Both checks must pass. A renamed text file with a `.zip` extension is
//! caught by the signature check; a real archive uploaded as `foo.bin` with
//! a generic content type is caught by the declared-type check.

use std::path::Path;

use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::upload::UploadRequest;

/// File extensions accepted as a declared ZIP archive.
pub const ZIP_EXTENSIONS: &[&str] = &["zip"];

/// Content types browsers and tools send for ZIP archives.
pub const ZIP_MIME_TYPES: &[&str] = &[
    "application/zip",
    "application/x-zip-compressed",
    "application/x-zip",
    "multipart/x-zip",
];

/// Bytes needed to recognise a ZIP signature.
const SIGNATURE_LEN: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Run both checks against a stored upload.
    pub async fn validate(&self, upload: &UploadRequest) -> Result<()> {
        self.check_declared_type(&upload.original_name, upload.declared_mime.as_deref())?;
        self.check_signature(&upload.path).await?;
        debug!(original_name = %upload.original_name, "upload validated as ZIP archive");
        Ok(())
    }

    /// Accept when the extension **or** the declared MIME type names a ZIP.
    pub fn check_declared_type(&self, filename: &str, declared_mime: Option<&str>) -> Result<()> {
        let ext_ok = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| ZIP_EXTENSIONS.iter().any(|z| e.eq_ignore_ascii_case(z)));

        let mime_ok = declared_mime
            .map(essence)
            .is_some_and(|m| ZIP_MIME_TYPES.iter().any(|z| m.eq_ignore_ascii_case(z)));

        if ext_ok || mime_ok {
            Ok(())
        } else {
            Err(ConvertError::UnsupportedFormat(format!(
                "Only ZIP files are allowed (got '{filename}' as {})",
                declared_mime.unwrap_or("unknown type")
            )))
        }
    }

    /// Require a ZIP header at the start of the file.
    pub async fn check_signature(&self, path: &Path) -> Result<()> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut head = [0u8; SIGNATURE_LEN];
        let mut filled = 0;
        while filled < SIGNATURE_LEN {
            let n = file.read(&mut head[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if is_zip_signature(&head[..filled]) {
            Ok(())
        } else {
            Err(ConvertError::UnsupportedFormat(
                "file content is not a ZIP archive".into(),
            ))
        }
    }
}

/// `true` for local-file, empty-archive and spanned-archive ZIP headers.
pub fn is_zip_signature(head: &[u8]) -> bool {
    head.len() >= SIGNATURE_LEN && infer::archive::is_zip(head)
}

/// `application/zip; charset=binary` → `application/zip`.
fn essence(mime: &str) -> &str {
    mime.split(';').next().unwrap_or(mime).trim()
}
