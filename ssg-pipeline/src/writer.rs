//! Hash-gated atomic output writer.
//!
//! ## `atomic_write` protocol
//!
//! 1. SHA-256 hash the packaged bytes.
//! 2. Compare with the manifest digest for the output path; skip if identical
//!    and the file is still on disk.
//! 3. Write to `<path>.ssg.tmp`.
//! 4. Rename to the final path (atomic on POSIX).
//! 5. Update the manifest entry (the caller saves the manifest).
//!
//! Bytes are written exactly as packaged.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{io_err, WriteError};
use crate::manifest::FileDigests;

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped: content matches the manifest digest.
    Unchanged { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }
}

/// Hex SHA-256 of `content`.
pub fn digest(content: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(content);
    hex::encode(h.finalize())
}

/// Atomically write `content` to `path`, keyed in `digests` by `key`.
pub(crate) async fn atomic_write(
    path: &Path,
    key: &str,
    content: &[u8],
    digests: &mut FileDigests,
    dry_run: bool,
) -> Result<WriteResult, WriteError> {
    let tmp = PathBuf::from(format!("{}.ssg.tmp", path.display()));
    atomic_write_with_tmp(path, key, content, digests, dry_run, &tmp).await
}

async fn atomic_write_with_tmp(
    path: &Path,
    key: &str,
    content: &[u8],
    digests: &mut FileDigests,
    dry_run: bool,
    tmp: &Path,
) -> Result<WriteResult, WriteError> {
    let digest = digest(content);

    let on_disk = tokio::fs::try_exists(path).await.unwrap_or(false);
    if on_disk && digests.get(key) == Some(&digest) {
        tracing::debug!("unchanged: {}", path.display());
        return Ok(WriteResult::Unchanged {
            path: path.to_path_buf(),
        });
    }

    if dry_run {
        tracing::info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        tokio::fs::create_dir_all(tmp_parent)
            .await
            .map_err(|e| io_err(tmp_parent, e))?;
    }
    tokio::fs::write(tmp, content)
        .await
        .map_err(|e| io_err(tmp, e))?;

    if let Err(e) = tokio::fs::rename(tmp, path).await {
        let _ = tokio::fs::remove_file(tmp).await;
        return Err(io_err(path, e));
    }

    digests.insert(key.to_string(), digest);

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}
