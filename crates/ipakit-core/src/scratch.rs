//! Request-scoped scratch directories.
//!
//! A [`ScratchSpace`] owns exactly one directory under the temp root. Every
//! path handed out by [`ScratchSpace::allocate`] lives inside it, and the
//! whole directory is removed once the last handle is dropped. Handles are
//! cheap to clone: the response body keeps one while it streams, and a
//! blocking transform keeps one until it returns, so the directory is never
//! deleted underneath a writer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Prefix shared by every scratch directory and file name.
pub const SCRATCH_PREFIX: &str = "ipakit";

#[derive(Debug, Clone)]
pub struct ScratchSpace {
    inner: Arc<ScratchDir>,
}

#[derive(Debug)]
struct ScratchDir {
    dir: PathBuf,
}

impl ScratchSpace {
    /// Create a fresh, uniquely named directory under `root`.
    pub async fn create(root: &Path) -> std::io::Result<Self> {
        let dir = root.join(unique_name(SCRATCH_PREFIX));
        tokio::fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "scratch space created");
        Ok(Self {
            inner: Arc::new(ScratchDir { dir }),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    /// Reserve a collision-free path `<stem>-<timestamp>-<random>.<ext>`.
    ///
    /// Nothing is created on disk; the caller writes the file.
    pub fn allocate(&self, stem: &str, ext: &str) -> PathBuf {
        let name = unique_name(stem);
        if ext.is_empty() {
            self.dir().join(name)
        } else {
            self.dir().join(format!("{name}.{ext}"))
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let dir = std::mem::take(&mut self.dir);
        // Off the async workers when a runtime is around.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_scratch(&dir));
            }
            Err(_) => remove_scratch(&dir),
        }
    }
}

fn remove_scratch(dir: &Path) {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => debug!(dir = %dir.display(), "scratch space removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            dir = %dir.display(),
            error = %e,
            "failed to remove scratch space"
        ),
    }
}

/// `<stem>-<utc timestamp with millis>-<12 hex chars>`.
fn unique_name(stem: &str) -> String {
    let ts = Utc::now().format("%Y%m%dT%H%M%S%3f");
    let rand = Uuid::new_v4().simple().to_string();
    format!("{stem}-{ts}-{}", &rand[..12])
}
