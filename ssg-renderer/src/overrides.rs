//! Engine override initializers.
//!
//! An override turns a loaded module plus merged options into the engine
//! registered for an engine id. When an engine id has an override it always
//! wins over the raw module.
//!
//! | Engine id    | Built-in override                                   |
//! |--------------|-----------------------------------------------------|
//! | `nunjucks`   | `autoescape` defaults to `true`, then `configure`   |
//! | `handlebars` | `configure`                                         |
//! | `mustache`   | `configure`                                         |
//! | `jinja`      | `configure`                                         |
//! | `tera`       | none (raw module registered)                        |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use ssg_core::{EngineId, EngineOptions};

use crate::engine::{EngineHandle, EngineModuleRef};
use crate::error::EngineError;

/// Initializer signature: `(engine_module, effective_options) -> engine`.
pub type EngineOverride =
    Arc<dyn Fn(&EngineModuleRef, &EngineOptions) -> Result<EngineHandle, EngineError> + Send + Sync>;

/// Static map from engine id to override initializer.
#[derive(Clone, Default)]
pub struct OverrideRegistry {
    overrides: HashMap<EngineId, EngineOverride>,
}

impl OverrideRegistry {
    /// Registry with no overrides: every engine gets its raw module.
    pub fn empty() -> Self {
        OverrideRegistry::default()
    }

    /// Registry with the built-in overrides listed in the module docs.
    pub fn builtin() -> Self {
        OverrideRegistry::empty()
            .with(EngineId::Nunjucks, nunjucks)
            .with(EngineId::Handlebars, configure)
            .with(EngineId::Mustache, configure)
            .with(EngineId::Jinja, configure)
    }

    /// Register `init` for `engine`, replacing any existing override.
    pub fn with<F>(mut self, engine: EngineId, init: F) -> Self
    where
        F: Fn(&EngineModuleRef, &EngineOptions) -> Result<EngineHandle, EngineError>
            + Send
            + Sync
            + 'static,
    {
        self.overrides.insert(engine, Arc::new(init));
        self
    }

    pub fn get(&self, engine: EngineId) -> Option<&EngineOverride> {
        self.overrides.get(&engine)
    }

    pub fn contains(&self, engine: EngineId) -> bool {
        self.overrides.contains_key(&engine)
    }
}

impl fmt::Debug for OverrideRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut engines: Vec<_> = self.overrides.keys().collect();
        engines.sort();
        f.debug_struct("OverrideRegistry")
            .field("engines", &engines)
            .finish()
    }
}

fn configure(module: &EngineModuleRef, options: &EngineOptions) -> Result<EngineHandle, EngineError> {
    module.configure(options)
}

fn nunjucks(module: &EngineModuleRef, options: &EngineOptions) -> Result<EngineHandle, EngineError> {
    let mut options = options.clone();
    options
        .entry("autoescape")
        .or_insert(Value::Bool(true));
    module.configure(&options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::TeraModule;
    use serde_json::json;

    #[test]
    fn builtin_covers_everything_but_tera() {
        let registry = OverrideRegistry::builtin();
        for id in EngineId::all() {
            assert_eq!(registry.contains(*id), *id != EngineId::Tera, "{id}");
        }
    }

    #[test]
    fn nunjucks_override_escapes_by_default() {
        let module: EngineModuleRef = Arc::new(TeraModule);
        let registry = OverrideRegistry::builtin();
        let init = registry.get(EngineId::Nunjucks).unwrap();

        let engine = init(&module, &EngineOptions::new()).unwrap();
        let out = engine.render("p.njk", "{{ h }}", &json!({"h": "<b>"})).unwrap();
        assert_eq!(out, "&lt;b&gt;");

        let mut opts = EngineOptions::new();
        opts.insert("autoescape".into(), json!(false));
        let engine = init(&module, &opts).unwrap();
        let out = engine.render("p.njk", "{{ h }}", &json!({"h": "<b>"})).unwrap();
        assert_eq!(out, "<b>");
    }

    #[test]
    fn debug_lists_engines_in_order() {
        let dbg = format!("{:?}", OverrideRegistry::builtin());
        assert_eq!(dbg, "OverrideRegistry { engines: [Nunjucks, Handlebars, Mustache, Jinja] }");
    }
}
