//! Server configuration, loaded from environment variables at startup.

use std::path::PathBuf;
use std::time::Duration;

use ipakit_core::TransformKind;

/// Runtime configuration for ipakit-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any environment variables set. The struct is built once in
/// `main` and handed to the router through [`crate::state::AppState`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind (default: `"0.0.0.0"`).
    pub host: String,

    /// TCP port (`PORT`, default: `3000`).
    pub port: u16,

    /// Root under which every request gets its own scratch directory.
    pub temp_dir: PathBuf,

    /// Largest accepted upload, in MiB.
    pub max_upload_size_mb: u64,

    /// Deadline for receiving, validating and converting one upload.
    pub request_timeout: Duration,

    /// Transform applied to every upload.
    pub transform: TransformKind,

    /// Comma-separated CORS origin allow list; `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build [`Config`] from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        Self {
            host: env_or("IPAKIT_HOST", "0.0.0.0"),
            port: parse_env(lookup("PORT"), 3000),
            temp_dir: lookup("IPAKIT_TEMP_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            max_upload_size_mb: parse_env(lookup("IPAKIT_MAX_UPLOAD_SIZE_MB"), 100),
            request_timeout: Duration::from_secs(parse_env(
                lookup("IPAKIT_REQUEST_TIMEOUT_SECS"),
                120,
            )),
            transform: parse_env(lookup("IPAKIT_TRANSFORM"), TransformKind::Copy),
            cors_allowed_origins: lookup("IPAKIT_CORS_ORIGINS").filter(|v| !v.trim().is_empty()),
            log_level: env_or("IPAKIT_LOG", "info"),
            log_json: lookup("IPAKIT_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn parse_env<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
