//! Platform path resolution
//!
//! Downloads always land in an absolute, platform-standard location so the
//! result does not depend on the working directory the CLI was started from.

use std::path::PathBuf;
use tracing::warn;

/// Get the downloads directory.
///
/// Uses the platform-standard Downloads directory, falling back to
/// `~/Downloads` and finally the system temp dir.
pub fn get_downloads_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| {
            warn!("Could not determine Downloads directory, using temp dir");
            std::env::temp_dir()
        })
}
