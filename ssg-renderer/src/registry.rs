//! Build-session engine registry: engine id → configured engine.
//!
//! The registry is shared by every asset of one build. Configuring an engine
//! id that already has a slot replaces it: last writer wins. Assets keep the
//! handle they configured themselves for rendering and precompilation, so a
//! concurrent reconfiguration only affects later readers of the registry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use ssg_core::EngineId;

use crate::engine::EngineHandle;

#[derive(Debug, Clone, Default)]
pub struct EngineRegistry {
    slots: Arc<RwLock<HashMap<EngineId, EngineHandle>>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        EngineRegistry::default()
    }

    /// Store `handle` for `engine`, returning the handle it replaced.
    pub fn register(&self, engine: EngineId, handle: EngineHandle) -> Option<EngineHandle> {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.insert(engine, handle)
    }

    pub fn get(&self, engine: EngineId) -> Option<EngineHandle> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.get(&engine).cloned()
    }

    /// Engine ids with a configured slot, sorted.
    pub fn engines(&self) -> Vec<EngineId> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<_> = slots.keys().copied().collect();
        ids.sort();
        ids
    }
}
