//! Build manifest: SHA-256 digests of every written output.
//!
//! Persists a [`Manifest`] JSON document at `<out>/.ssg/manifest.json`.
//! Saves use the same `.tmp` + rename pattern as output files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, WriteError};

/// Maps output paths (relative to the output root) to their last written
/// SHA-256 hex digest.
pub type FileDigests = HashMap<String, String>;

/// On-disk manifest payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    pub built_at: DateTime<Utc>,
    #[serde(default)]
    pub files: FileDigests,
}

impl Manifest {
    fn empty() -> Self {
        Manifest {
            built_at: Utc::now(),
            files: HashMap::new(),
        }
    }
}

/// `<out_root>/.ssg/manifest.json`
pub fn manifest_path(out_root: &Path) -> PathBuf {
    out_root.join(".ssg").join("manifest.json")
}

/// Load the manifest under `out_root`.
///
/// Returns an empty manifest if the file does not yet exist.
pub async fn load_at(out_root: &Path) -> Result<Manifest, WriteError> {
    let path = manifest_path(out_root);
    let contents = match tokio::fs::read_to_string(&path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Manifest::empty()),
        Err(e) => return Err(io_err(&path, e)),
    };
    Ok(serde_json::from_str(&contents)?)
}

/// Save the manifest under `out_root` atomically.
pub async fn save_at(out_root: &Path, manifest: &Manifest) -> Result<(), WriteError> {
    let path = manifest_path(out_root);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid manifest path")));
    };
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(manifest)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &json)
        .await
        .map_err(|e| io_err(&tmp, e))?;
    tokio::fs::rename(&tmp, &path)
        .await
        .map_err(|e| io_err(&path, e))?;
    Ok(())
}
