//! Error types for ssg-core.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by computed engine options.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Lookup failures in the engine table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// No engine is registered for the file extension.
    #[error("no template engine registered for extension '{0}'")]
    UnknownExtension(String),

    /// The engine id is not part of the engine table.
    #[error("unknown template engine '{0}'")]
    UnknownEngine(String),
}

/// Failures while splitting a document into front matter and body.
#[derive(Debug, Error)]
pub enum FrontMatterError {
    /// The fenced block is not valid YAML.
    #[error("invalid front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The fenced block parsed, but is a scalar or a sequence.
    #[error("front matter must be a mapping, found {found}")]
    NotAMapping { found: &'static str },
}

/// Failures while discovering or evaluating per-engine options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Options must deserialize to a key/value mapping.
    #[error("config at {path} must be a mapping")]
    NotAMapping { path: PathBuf },

    /// A computed options function returned an error.
    #[error("computed engine options failed: {0}")]
    Computed(#[source] BoxError),
}

/// Failures while loading the site configuration and global data.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("global data in {path} must be a mapping")]
    GlobalsNotAMapping { path: PathBuf },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
