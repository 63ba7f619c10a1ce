//! Error types for ssg-pipeline.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use ssg_core::{CoreError, FrontMatterError, ResolutionError};
use ssg_renderer::{ConfigureError, EngineError, ModuleLoadError};

/// Step of the asset lifecycle an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Resolve,
    Read,
    Extract,
    LoadModule,
    Configure,
    Render,
    Precompile,
    Write,
    Lifecycle,
    Task,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Resolve => "resolve",
            Stage::Read => "read",
            Stage::Extract => "extract",
            Stage::LoadModule => "load-module",
            Stage::Configure => "configure",
            Stage::Render => "render",
            Stage::Precompile => "precompile",
            Stage::Write => "write",
            Stage::Lifecycle => "lifecycle",
            Stage::Task => "task",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single template asset.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("[resolve] {path}: {source}")]
    Resolution {
        path: PathBuf,
        #[source]
        source: ResolutionError,
    },

    #[error("[read] {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[extract] {path}: {source}")]
    Extract {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },

    #[error("[load-module] {path}: {source}")]
    ModuleLoad {
        path: PathBuf,
        #[source]
        source: ModuleLoadError,
    },

    #[error("[configure] {path}: {source}")]
    Configure {
        path: PathBuf,
        #[source]
        source: ConfigureError,
    },

    #[error("[render] {path}: {source}")]
    Render {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("[precompile] {path}: {source}")]
    Precompile {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("[write] {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: WriteError,
    },

    /// An operation was called out of order (e.g. `post_process` before
    /// `load`, or `load` twice).
    #[error("[lifecycle] {path}: {message}")]
    Lifecycle { path: PathBuf, message: &'static str },

    /// The build task processing the asset panicked or was cancelled.
    #[error("[task] {path}: {message}")]
    Task { path: PathBuf, message: String },
}

impl AssetError {
    pub fn stage(&self) -> Stage {
        match self {
            AssetError::Resolution { .. } => Stage::Resolve,
            AssetError::Read { .. } => Stage::Read,
            AssetError::Extract { .. } => Stage::Extract,
            AssetError::ModuleLoad { .. } => Stage::LoadModule,
            AssetError::Configure { .. } => Stage::Configure,
            AssetError::Render { .. } => Stage::Render,
            AssetError::Precompile { .. } => Stage::Precompile,
            AssetError::Write { .. } => Stage::Write,
            AssetError::Lifecycle { .. } => Stage::Lifecycle,
            AssetError::Task { .. } => Stage::Task,
        }
    }

    /// Path of the asset (or output file, for write errors).
    pub fn path(&self) -> &Path {
        match self {
            AssetError::Resolution { path, .. }
            | AssetError::Read { path, .. }
            | AssetError::Extract { path, .. }
            | AssetError::ModuleLoad { path, .. }
            | AssetError::Configure { path, .. }
            | AssetError::Render { path, .. }
            | AssetError::Precompile { path, .. }
            | AssetError::Write { path, .. }
            | AssetError::Lifecycle { path, .. }
            | AssetError::Task { path, .. } => path,
        }
    }
}

/// Errors from bundle writers and the output writer.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The writer was asked for an artifact the asset never generated.
    #[error("no generated content for artifact type '{type_tag}'")]
    MissingArtifact { type_tag: String },

    /// More than one source template maps to the same output file.
    #[error("output is produced by more than one template: {}", display_paths(.sources))]
    OutputConflict { sources: Vec<PathBuf> },

    /// Writing to the bundle destination failed.
    #[error("bundle stream error: {0}")]
    Stream(#[from] std::io::Error),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (build manifest).
    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that abort a whole build rather than a single asset.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest error: {0}")]
    Manifest(#[from] WriteError),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience constructor for [`WriteError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> WriteError {
    WriteError::Io {
        path: path.into(),
        source,
    }
}
