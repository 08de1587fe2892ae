//! First-run setup: put the bundled city catalog where the config expects it.

use std::path::Path;

use anyhow::{Context, Result};

/// Major US cities shipped with the binary
pub const BUNDLED_CATALOG: &str = include_str!("../data/cities.json");

/// Write the bundled catalog to `path` unless a file is already there.
///
/// Returns whether a file was written. An existing catalog is never
/// overwritten; edit or delete it to change the tracked cities.
pub fn ensure_catalog(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create catalog directory")?;
    }

    std::fs::write(path, BUNDLED_CATALOG)
        .with_context(|| format!("Failed to write city catalog to {}", path.display()))?;

    tracing::info!("Wrote bundled city catalog to {}", path.display());
    Ok(true)
}
