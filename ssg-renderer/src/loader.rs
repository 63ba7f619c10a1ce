//! Engine module loading.
//!
//! [`BuiltinModules`] is the default [`ModuleLoader`]: every backend compiled
//! into the binary, keyed by module name. A module name that is not compiled
//! in fails with [`ModuleLoadError::NotFound`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::backends::{HandlebarsModule, MinijinjaModule, TeraModule};
use crate::engine::EngineModuleRef;
use crate::error::ModuleLoadError;

/// Module loading capability.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Obtain the module named `module_name` on behalf of the template at
    /// `context_path`.
    async fn load(
        &self,
        module_name: &str,
        context_path: &Path,
    ) -> Result<EngineModuleRef, ModuleLoadError>;
}

/// Static registry of compiled-in engine modules.
#[derive(Debug, Clone)]
pub struct BuiltinModules {
    modules: HashMap<&'static str, EngineModuleRef>,
}

impl BuiltinModules {
    /// Registry with every compiled-in backend.
    pub fn new() -> Self {
        BuiltinModules::empty()
            .with_module(Arc::new(TeraModule))
            .with_module(Arc::new(HandlebarsModule))
            .with_module(Arc::new(MinijinjaModule))
    }

    pub fn empty() -> Self {
        BuiltinModules {
            modules: HashMap::new(),
        }
    }

    /// Add or replace the module registered under `module.name()`.
    pub fn with_module(mut self, module: EngineModuleRef) -> Self {
        self.modules.insert(module.name(), module);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.modules.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for BuiltinModules {
    fn default() -> Self {
        BuiltinModules::new()
    }
}

#[async_trait]
impl ModuleLoader for BuiltinModules {
    async fn load(
        &self,
        module_name: &str,
        context_path: &Path,
    ) -> Result<EngineModuleRef, ModuleLoadError> {
        self.modules
            .get(module_name)
            .cloned()
            .ok_or_else(|| ModuleLoadError::NotFound {
                module: module_name.to_string(),
                context: context_path.to_path_buf(),
            })
    }
}
