//! Bundle writers: stream an asset's generated artifacts to a destination.
//!
//! The host picks a writer per bundle with [`BundleWriter::should_handle`]:
//! [`PrecompiledArtifactWriter`] takes `*-precompile.js` bundles and
//! [`RawBundleWriter`] takes any other single type.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use ssg_core::{EngineId, PRECOMPILE_SUFFIX};

use crate::asset::TemplateAsset;
use crate::error::WriteError;

/// An output file of a given artifact type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub type_tag: String,
    pub output_path: PathBuf,
}

impl Bundle {
    pub fn new(type_tag: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Bundle {
            type_tag: type_tag.into(),
            output_path: output_path.into(),
        }
    }

    /// Bundle for the `type_tag` artifact of the source at `rel`
    /// (relative to the source root), placed under `out_root`.
    ///
    /// `a/page.njk` → `a/page.html`, `a/page.nunjucks-precompile.js`.
    /// A stem that already carries the type is not doubled:
    /// `a/index.html.njk` → `a/index.html`.
    pub fn for_source(out_root: &Path, rel: &Path, type_tag: &str) -> Self {
        let stem = rel.file_stem().map(Path::new);
        let already_typed = stem
            .and_then(Path::extension)
            .is_some_and(|ext| ext == type_tag);
        let output = match stem {
            Some(stem) if already_typed => rel.with_file_name(stem),
            _ => rel.with_extension(type_tag),
        };
        Bundle::new(type_tag, out_root.join(output))
    }

    pub fn is_precompiled(&self) -> bool {
        self.type_tag.ends_with(PRECOMPILE_SUFFIX)
    }
}

/// An asset whose generated artifacts can be looked up by type tag.
pub trait GeneratedAsset: Send + Sync {
    fn engine_id(&self) -> EngineId;

    fn generated(&self, type_tag: &str) -> Option<&str>;
}

impl GeneratedAsset for TemplateAsset {
    fn engine_id(&self) -> EngineId {
        self.engine()
    }

    fn generated(&self, type_tag: &str) -> Option<&str> {
        TemplateAsset::generated(self, type_tag)
    }
}

/// Writes one bundle's content for an asset.
#[async_trait]
pub trait BundleWriter: Send {
    fn should_handle(&self, bundle: &Bundle) -> bool;

    async fn add_asset(&mut self, asset: &dyn GeneratedAsset) -> Result<(), WriteError>;
}

/// Writes the `<engine>-precompile.js` artifact of each asset verbatim.
#[derive(Debug)]
pub struct PrecompiledArtifactWriter<W> {
    dest: W,
}

impl<W: AsyncWrite + Unpin + Send> PrecompiledArtifactWriter<W> {
    pub fn new(dest: W) -> Self {
        PrecompiledArtifactWriter { dest }
    }

    pub fn into_inner(self) -> W {
        self.dest
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> BundleWriter for PrecompiledArtifactWriter<W> {
    fn should_handle(&self, bundle: &Bundle) -> bool {
        bundle.is_precompiled()
    }

    async fn add_asset(&mut self, asset: &dyn GeneratedAsset) -> Result<(), WriteError> {
        let type_tag = asset.engine_id().precompile_type_tag();
        let content = asset
            .generated(&type_tag)
            .ok_or_else(|| WriteError::MissingArtifact {
                type_tag: type_tag.clone(),
            })?;
        self.dest.write_all(content.as_bytes()).await?;
        self.dest.flush().await?;
        tracing::debug!(type_tag = %type_tag, bytes = content.len(), "wrote precompiled artifact");
        Ok(())
    }
}

/// Writes the asset's artifact of one fixed type verbatim.
#[derive(Debug)]
pub struct RawBundleWriter<W> {
    dest: W,
    type_tag: String,
}

impl<W: AsyncWrite + Unpin + Send> RawBundleWriter<W> {
    pub fn new(dest: W, type_tag: impl Into<String>) -> Self {
        RawBundleWriter {
            dest,
            type_tag: type_tag.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.dest
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> BundleWriter for RawBundleWriter<W> {
    fn should_handle(&self, bundle: &Bundle) -> bool {
        bundle.type_tag == self.type_tag
    }

    async fn add_asset(&mut self, asset: &dyn GeneratedAsset) -> Result<(), WriteError> {
        let content = asset
            .generated(&self.type_tag)
            .ok_or_else(|| WriteError::MissingArtifact {
                type_tag: self.type_tag.clone(),
            })?;
        self.dest.write_all(content.as_bytes()).await?;
        self.dest.flush().await?;
        Ok(())
    }
}

/// Package `bundle` for `asset` into an in-memory buffer using the writer
/// that handles its type.
pub async fn package(bundle: &Bundle, asset: &dyn GeneratedAsset) -> Result<Vec<u8>, WriteError> {
    let mut precompiled = PrecompiledArtifactWriter::new(Vec::new());
    if precompiled.should_handle(bundle) {
        precompiled.add_asset(asset).await?;
        return Ok(precompiled.into_inner());
    }
    let mut raw = RawBundleWriter::new(Vec::new(), bundle.type_tag.clone());
    raw.add_asset(asset).await?;
    Ok(raw.into_inner())
}
