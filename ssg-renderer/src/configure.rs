//! Configuration merge: discovered options + override registry → engine.
//!
//! 1. Discover options for `<id>` (`.<id>rc`, `.<id>.js`, … or the `<id>`
//!    key of `package.json`); nothing found means empty options.
//! 2. Computed options are evaluated once with `{ locals }`.
//! 3. An override registered for `<id>` builds the engine from the module and
//!    the effective options; without one the raw module engine is used.
//! 4. The engine is stored in the session [`EngineRegistry`] and returned.

use std::path::Path;

use ssg_core::{config_candidates, ConfigDiscovery, ConfigInput, EngineId, EngineOptions};

use crate::engine::{EngineHandle, EngineModuleRef};
use crate::error::ConfigureError;
use crate::overrides::OverrideRegistry;
use crate::registry::EngineRegistry;

/// Borrowed collaborators of the configuration merge.
#[derive(Clone, Copy)]
pub struct EngineConfigurator<'a> {
    pub discovery: &'a dyn ConfigDiscovery,
    pub overrides: &'a OverrideRegistry,
    pub registry: &'a EngineRegistry,
}

impl<'a> EngineConfigurator<'a> {
    /// Configure `engine` for a template located in `search_from`.
    pub async fn configure(
        &self,
        engine: EngineId,
        module: &EngineModuleRef,
        input: &ConfigInput,
        search_from: &Path,
    ) -> Result<EngineHandle, ConfigureError> {
        let options = self.effective_options(engine, input, search_from).await?;
        tracing::debug!(engine = %engine, options = ?options, "effective engine options");

        let handle = match self.overrides.get(engine) {
            Some(init) => init(module, &options).map_err(|source| ConfigureError::Override {
                engine: engine.to_string(),
                source,
            })?,
            None => module.raw_engine(),
        };

        self.registry.register(engine, handle.clone());
        Ok(handle)
    }

    async fn effective_options(
        &self,
        engine: EngineId,
        input: &ConfigInput,
        search_from: &Path,
    ) -> Result<EngineOptions, ConfigureError> {
        let candidates = config_candidates(engine.as_str());
        let discovered = self
            .discovery
            .discover(&candidates, engine.as_str(), search_from)
            .await?;
        match discovered {
            Some(value) => Ok(value.resolve(input)?),
            None => Ok(EngineOptions::new()),
        }
    }
}
