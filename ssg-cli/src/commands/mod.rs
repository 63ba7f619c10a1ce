pub mod build;
pub mod engines;
pub mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Resolve a command-line path against the current directory.
pub(crate) fn from_cwd(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("could not determine current directory")?;
    Ok(cwd.join(path))
}
