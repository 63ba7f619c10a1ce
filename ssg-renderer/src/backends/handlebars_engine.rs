//! Handlebars backend serving the `handlebars` and `mustache` dialects.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use handlebars::{Handlebars, Template};
use serde::Deserialize;
use serde_json::Value;

use ssg_core::EngineOptions;

use crate::engine::{parse_options, Engine, EngineHandle, EngineModule};
use crate::error::{error_chain, EngineError};

pub const MODULE_NAME: &str = "handlebars";

/// Options understood by the Handlebars backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HandlebarsOptions {
    /// Fail on missing fields instead of rendering them empty.
    pub strict_mode: bool,
    /// Disable HTML escaping of `{{ }}` output.
    pub no_escape: bool,
    /// Inline partials, by name.
    pub partials: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HandlebarsModule;

impl EngineModule for HandlebarsModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn raw_engine(&self) -> EngineHandle {
        Arc::new(HandlebarsEngine {
            registry: Handlebars::new(),
            options: HandlebarsOptions::default(),
        })
    }

    fn configure(&self, options: &EngineOptions) -> Result<EngineHandle, EngineError> {
        let options: HandlebarsOptions = parse_options(MODULE_NAME, options)?;
        Ok(Arc::new(HandlebarsEngine::new(options)?))
    }
}

pub struct HandlebarsEngine {
    registry: Handlebars<'static>,
    options: HandlebarsOptions,
}

impl HandlebarsEngine {
    fn new(options: HandlebarsOptions) -> Result<Self, EngineError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(options.strict_mode);
        if options.no_escape {
            registry.register_escape_fn(handlebars::no_escape);
        }
        for (name, source) in &options.partials {
            registry
                .register_partial(name, source.as_str())
                .map_err(|e| EngineError::Compile {
                    name: name.clone(),
                    message: error_chain(&e),
                })?;
        }
        Ok(HandlebarsEngine { registry, options })
    }
}

impl fmt::Debug for HandlebarsEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlebarsEngine")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Engine for HandlebarsEngine {
    fn module_name(&self) -> &'static str {
        MODULE_NAME
    }

    fn render(&self, name: &str, source: &str, data: &Value) -> Result<String, EngineError> {
        self.registry
            .render_template(source, data)
            .map_err(|e| EngineError::Render {
                name: name.to_string(),
                message: error_chain(&e),
            })
    }

    fn check(&self, name: &str, source: &str) -> Result<(), EngineError> {
        Template::compile(source)
            .map(|_| ())
            .map_err(|e| EngineError::Compile {
                name: name.to_string(),
                message: error_chain(&e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn configured(options: Value) -> EngineHandle {
        let Value::Object(map) = options else { unreachable!() };
        HandlebarsModule.configure(&map).expect("configure")
    }

    #[test]
    fn renders_nested_globals() {
        let out = HandlebarsModule
            .raw_engine()
            .render("page.hbs", "{{title}} on {{globals.site}}", &json!({"title": "Hi", "globals": {"site": "X"}}))
            .unwrap();
        assert_eq!(out, "Hi on X");
    }

    #[test]
    fn escapes_by_default_and_not_with_no_escape() {
        let data = json!({"html": "<b>"});
        assert_eq!(
            HandlebarsModule.raw_engine().render("p.hbs", "{{html}}", &data).unwrap(),
            "&lt;b&gt;"
        );
        assert_eq!(
            configured(json!({"no_escape": true})).render("p.hbs", "{{html}}", &data).unwrap(),
            "<b>"
        );
    }

    #[test]
    fn strict_mode_rejects_missing_fields() {
        let lenient = HandlebarsModule.raw_engine();
        assert_eq!(lenient.render("p.hbs", "[{{missing}}]", &json!({})).unwrap(), "[]");

        let strict = configured(json!({"strict_mode": true}));
        let err = strict.render("p.hbs", "[{{missing}}]", &json!({})).unwrap_err();
        assert!(matches!(err, EngineError::Render { .. }));
    }

    #[test]
    fn partials_from_options_are_available() {
        let engine = configured(json!({"partials": {"footer": "(c) {{globals.site}}"}}));
        let out = engine
            .render("p.hbs", "{{> footer}}", &json!({"globals": {"site": "X"}}))
            .unwrap();
        assert_eq!(out, "(c) X");
    }

    #[test]
    fn unclosed_block_fails_check() {
        let err = HandlebarsModule.raw_engine().check("p.hbs", "{{#if x}}open").unwrap_err();
        assert!(matches!(err, EngineError::Compile { .. }));
    }
}
