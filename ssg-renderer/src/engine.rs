//! Engine abstractions: [`EngineModule`] (a loaded backend library) and
//! [`Engine`] (a configured instance of it).
//!
//! A module hands out engines two ways:
//! - [`EngineModule::raw_engine`]: library defaults, registered when no
//!   override exists for the engine id;
//! - [`EngineModule::configure`]: an engine built from merged options, used
//!   by override initializers.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use ssg_core::EngineOptions;

use crate::error::EngineError;

/// Shared handle to a configured engine.
pub type EngineHandle = Arc<dyn Engine>;

/// Shared handle to a loaded engine module.
pub type EngineModuleRef = Arc<dyn EngineModule>;

/// A configured template engine.
pub trait Engine: Send + Sync + fmt::Debug {
    /// Name of the module this engine was built from.
    fn module_name(&self) -> &'static str;

    /// Render `source` with `data`. `name` identifies the template in errors
    /// and drives name-based behaviour such as autoescaping.
    fn render(&self, name: &str, source: &str, data: &Value) -> Result<String, EngineError>;

    /// Parse `source` without rendering it.
    fn check(&self, name: &str, source: &str) -> Result<(), EngineError>;
}

/// Options for ahead-of-time compilation.
#[derive(Debug, Clone)]
pub struct PrecompileOptions {
    /// Name the compiled template is registered under (the source path).
    pub name: String,
    /// Make the script evaluate to a `function(ctx, cb)` after registering.
    pub as_function: bool,
    /// Emit output even when the template fails to compile.
    pub force: bool,
    /// Engine used to validate the template.
    pub env: EngineHandle,
}

/// A loaded template engine library.
pub trait EngineModule: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn raw_engine(&self) -> EngineHandle;

    fn configure(&self, options: &EngineOptions) -> Result<EngineHandle, EngineError>;

    /// Compile `source` into JavaScript function source.
    fn precompile_string(
        &self,
        source: &str,
        opts: &PrecompileOptions,
    ) -> Result<String, EngineError> {
        let _ = (source, opts);
        Err(EngineError::Unsupported {
            module: self.name(),
        })
    }
}

/// Deserialize backend options, ignoring keys the backend does not know.
pub(crate) fn parse_options<T: serde::de::DeserializeOwned>(
    module: &'static str,
    options: &EngineOptions,
) -> Result<T, EngineError> {
    serde_json::from_value(Value::Object(options.clone()))
        .map_err(|source| EngineError::Options { module, source })
}
