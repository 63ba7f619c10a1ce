//! Error types for ssg-renderer.

use std::path::PathBuf;

use thiserror::Error;

use ssg_core::ConfigError;

/// Failures raised by a template engine backend.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Options could not be deserialized into the backend's option struct.
    #[error("invalid {module} options: {source}")]
    Options {
        module: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The template does not parse.
    #[error("failed to compile template {name}: {message}")]
    Compile { name: String, message: String },

    /// The template parsed but rendering failed.
    #[error("failed to render template {name}: {message}")]
    Render { name: String, message: String },

    /// Render data could not be converted for the backend.
    #[error("invalid render data for {name}: {message}")]
    Data { name: String, message: String },

    /// The module has no ahead-of-time compilation.
    #[error("module '{module}' does not support precompilation")]
    Unsupported { module: &'static str },
}

/// Failure to obtain an engine module.
#[derive(Debug, Error)]
pub enum ModuleLoadError {
    #[error("engine module '{module}' is not available (required by {context})")]
    NotFound { module: String, context: PathBuf },
}

/// Failures of the configuration merge.
#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("engine override for '{engine}' failed: {source}")]
    Override {
        engine: String,
        #[source]
        source: EngineError,
    },
}

/// Flatten an error and its sources into one line.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
