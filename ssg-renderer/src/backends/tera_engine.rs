//! Tera backend serving the `nunjucks` and `tera` dialects.
//!
//! Each render clones the configured base [`Tera`] and adds the template under
//! its source path, so the base instance is never mutated after configuration.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tera::{Context, Tera};

use ssg_core::EngineOptions;

use crate::engine::{parse_options, Engine, EngineHandle, EngineModule, PrecompileOptions};
use crate::error::{error_chain, EngineError};
use crate::precompile;

pub const MODULE_NAME: &str = "tera";

/// Options understood by the Tera backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TeraOptions {
    /// `Some(true)` escapes every template, `Some(false)` none; `None` keeps
    /// Tera's suffix-based defaults (`.html`, `.htm`, `.xml`).
    pub autoescape: Option<bool>,
}

/// The `tera` engine module.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeraModule;

impl EngineModule for TeraModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn raw_engine(&self) -> EngineHandle {
        Arc::new(TeraEngine::new(TeraOptions::default()))
    }

    fn configure(&self, options: &EngineOptions) -> Result<EngineHandle, EngineError> {
        let options: TeraOptions = parse_options(MODULE_NAME, options)?;
        Ok(Arc::new(TeraEngine::new(options)))
    }

    fn precompile_string(
        &self,
        source: &str,
        opts: &PrecompileOptions,
    ) -> Result<String, EngineError> {
        if let Err(err) = opts.env.check(&opts.name, source) {
            if !opts.force {
                return Err(err);
            }
            tracing::warn!(template = %opts.name, error = %err, "forcing precompile of invalid template");
            return Ok(precompile::error_script(&opts.name, &err.to_string(), opts.as_function));
        }
        Ok(precompile::script(&opts.name, source, opts.as_function))
    }
}

/// A configured Tera instance.
pub struct TeraEngine {
    base: Tera,
    options: TeraOptions,
}

impl TeraEngine {
    fn new(options: TeraOptions) -> Self {
        let mut base = Tera::default();
        match options.autoescape {
            // An empty suffix matches every template name.
            Some(true) => base.autoescape_on(vec![""]),
            Some(false) => base.autoescape_on(vec![]),
            None => {}
        }
        TeraEngine { base, options }
    }

    pub fn options(&self) -> &TeraOptions {
        &self.options
    }

    fn with_template(&self, name: &str, source: &str) -> Result<Tera, EngineError> {
        let mut tera = self.base.clone();
        tera.add_raw_template(name, source)
            .map_err(|e| EngineError::Compile {
                name: name.to_string(),
                message: error_chain(&e),
            })?;
        Ok(tera)
    }
}

impl fmt::Debug for TeraEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeraEngine")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Engine for TeraEngine {
    fn module_name(&self) -> &'static str {
        MODULE_NAME
    }

    fn render(&self, name: &str, source: &str, data: &Value) -> Result<String, EngineError> {
        let tera = self.with_template(name, source)?;
        let ctx = Context::from_value(data.clone()).map_err(|e| EngineError::Data {
            name: name.to_string(),
            message: error_chain(&e),
        })?;
        tera.render(name, &ctx).map_err(|e| EngineError::Render {
            name: name.to_string(),
            message: error_chain(&e),
        })
    }

    fn check(&self, name: &str, source: &str) -> Result<(), EngineError> {
        self.with_template(name, source).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn configured(options: Value) -> EngineHandle {
        let Value::Object(map) = options else { unreachable!() };
        TeraModule.configure(&map).expect("configure")
    }

    #[test]
    fn renders_variables() {
        let engine = TeraModule.raw_engine();
        let out = engine
            .render("page.njk", "{{ title }} / {{ globals.site }}", &json!({"title": "Hi", "globals": {"site": "X"}}))
            .unwrap();
        assert_eq!(out, "Hi / X");
    }

    #[test]
    fn autoescape_option_controls_escaping() {
        let data = json!({"html": "<b>"});
        let on = configured(json!({"autoescape": true}));
        let off = configured(json!({"autoescape": false}));
        assert_eq!(on.render("page.njk", "{{ html }}", &data).unwrap(), "&lt;b&gt;");
        assert_eq!(off.render("page.njk", "{{ html }}", &data).unwrap(), "<b>");
    }

    #[test]
    fn raw_engine_does_not_escape_non_html_names() {
        let out = TeraModule
            .raw_engine()
            .render("page.tera", "{{ html }}", &json!({"html": "<b>"}))
            .unwrap();
        assert_eq!(out, "<b>");
    }

    #[test]
    fn syntax_error_is_a_compile_error() {
        let err = TeraModule.raw_engine().check("bad.njk", "{% if %}").unwrap_err();
        assert!(matches!(err, EngineError::Compile { ref name, .. } if name == "bad.njk"));
    }

    #[test]
    fn missing_variable_is_a_render_error() {
        let err = TeraModule
            .raw_engine()
            .render("page.njk", "{{ nope }}", &json!({}))
            .unwrap_err();
        assert!(matches!(err, EngineError::Render { .. }), "got: {err}");
    }

    fn precompile_opts(force: bool) -> PrecompileOptions {
        PrecompileOptions {
            name: "src/bad.njk".to_string(),
            as_function: true,
            force,
            env: TeraModule.raw_engine(),
        }
    }

    #[test]
    fn precompile_of_invalid_template_fails_without_force() {
        let err = TeraModule
            .precompile_string("{% if %}", &precompile_opts(false))
            .unwrap_err();
        assert!(matches!(err, EngineError::Compile { ref name, .. } if name == "src/bad.njk"));
    }

    #[test]
    fn forced_precompile_of_invalid_template_emits_error_script() {
        let out = TeraModule
            .precompile_string("{% if %}", &precompile_opts(true))
            .unwrap();
        assert!(out.starts_with("(function() {"), "got: {out}");
        assert!(out.ends_with("})();"), "got: {out}");
        assert!(out.contains("var err = new Error("));
        assert!(out.contains(r#"err.template = "src/bad.njk";"#));
        assert!(!out.contains("nunjucksPrecompiled"));
    }

    #[test]
    fn forced_precompile_of_valid_template_registers_it() {
        let out = TeraModule
            .precompile_string("<h1>{{ title }}</h1>", &precompile_opts(true))
            .unwrap();
        assert!(out.contains(r#"["src/bad.njk"] = { src: src }"#));
        assert!(!out.contains("new Error("));
    }

    #[test]
    fn wrong_option_type_is_rejected() {
        let Value::Object(map) = json!({"autoescape": "yes"}) else { unreachable!() };
        let err = TeraModule.configure(&map).unwrap_err();
        assert!(matches!(err, EngineError::Options { module: "tera", .. }));
    }
}
