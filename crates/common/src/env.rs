//! Environment/runtime helpers
//!
//! Sanity checks run once at startup.

use tracing::warn;

use crate::CoreError;

/// Check that the dashboard bundle directory exists; the server still starts
/// without it, the static routes simply 404.
pub async fn ensure_env(frontend_dir: &str) -> Result<bool, CoreError> {
    match tokio::fs::metadata(frontend_dir).await {
        Ok(meta) if meta.is_dir() => Ok(true),
        Ok(_) => Err(CoreError::Env(format!("{frontend_dir} exists but is not a directory"))),
        Err(_) => {
            warn!(%frontend_dir, "frontend assets directory not found; static assets may 404");
            Ok(false)
        }
    }
}
