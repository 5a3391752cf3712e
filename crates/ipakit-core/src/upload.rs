//! Per-request upload metadata and file-name handling.

use std::path::{Path, PathBuf};

/// Extension given to every converted artifact.
pub const IPA_EXTENSION: &str = "ipa";

/// Fallback base name when the client sends nothing usable.
const DEFAULT_STEM: &str = "upload";

/// An uploaded file that has been written to the scratch area.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Client-supplied file name after [`sanitize_filename`].
    pub original_name: String,
    /// Content type declared in the multipart part, if any.
    pub declared_mime: Option<String>,
    /// Number of bytes written to `path`.
    pub size: u64,
    /// Location inside the request's scratch space.
    pub path: PathBuf,
}

impl UploadRequest {
    /// Name the converted artifact should be downloaded as (`app.zip` → `app.ipa`).
    pub fn download_name(&self) -> String {
        ipa_file_name(&self.original_name)
    }

    /// Lower-cased extension of the original file name.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

/// Reduce a client-supplied file name to a single safe path component.
///
/// Directory parts are dropped (both `/` and `\` separators), control
/// characters and characters reserved on common filesystems become `_`,
/// and leading dots are stripped so the result can never be hidden or
/// relative. Spaces and non-ASCII letters are preserved.
pub fn sanitize_filename(filename: &str) -> String {
    let last = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let cleaned: String = last
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim().trim_start_matches('.').trim();
    if trimmed.is_empty() {
        DEFAULT_STEM.to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Base name of an upload: the sanitized name without a trailing `.zip`.
pub fn stem_of(filename: &str) -> String {
    let name = sanitize_filename(filename);
    let lower = name.to_ascii_lowercase();
    let stem = if lower.ends_with(".zip") && name.len() > 4 {
        &name[..name.len() - 4]
    } else {
        name.as_str()
    };
    let stem = stem.trim_end();
    if stem.is_empty() {
        DEFAULT_STEM.to_owned()
    } else {
        stem.to_owned()
    }
}

/// Download name for the artifact produced from `filename`.
pub fn ipa_file_name(filename: &str) -> String {
    format!("{}.{IPA_EXTENSION}", stem_of(filename))
}
