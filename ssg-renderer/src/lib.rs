//! # ssg-renderer
//!
//! Template engine modules and their configuration for the ssg pipeline.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use ssg_core::{ConfigInput, EngineId, FsConfigDiscovery};
//! use ssg_renderer::{
//!     BuiltinModules, EngineConfigurator, EngineRegistry, ModuleLoader, OverrideRegistry,
//! };
//!
//! async fn render(path: &Path, body: &str, input: ConfigInput) -> Option<String> {
//!     let module = BuiltinModules::new().load("tera", path).await.ok()?;
//!     let discovery = FsConfigDiscovery::new(".");
//!     let overrides = OverrideRegistry::builtin();
//!     let registry = EngineRegistry::new();
//!     let configurator = EngineConfigurator {
//!         discovery: &discovery,
//!         overrides: &overrides,
//!         registry: &registry,
//!     };
//!     let engine = configurator
//!         .configure(EngineId::Nunjucks, &module, &input, Path::new("."))
//!         .await
//!         .ok()?;
//!     let data = serde_json::Value::Object(input.locals);
//!     engine.render(&path.display().to_string(), body, &data).ok()
//! }
//! ```

pub mod backends;
pub mod configure;
pub mod context;
pub mod engine;
pub mod error;
pub mod loader;
pub mod overrides;
pub mod precompile;
pub mod registry;

pub use configure::EngineConfigurator;
pub use context::TemplateData;
pub use engine::{Engine, EngineHandle, EngineModule, EngineModuleRef, PrecompileOptions};
pub use error::{ConfigureError, EngineError, ModuleLoadError};
pub use loader::{BuiltinModules, ModuleLoader};
pub use overrides::{EngineOverride, OverrideRegistry};
pub use registry::EngineRegistry;
