//! MiniJinja backend serving the `jinja` dialect.

use std::fmt;
use std::sync::Arc;

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Deserialize;
use serde_json::Value;

use ssg_core::EngineOptions;

use crate::engine::{parse_options, Engine, EngineHandle, EngineModule};
use crate::error::{error_chain, EngineError};

pub const MODULE_NAME: &str = "minijinja";

/// Options understood by the MiniJinja backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JinjaOptions {
    pub trim_blocks: bool,
    pub lstrip_blocks: bool,
    pub keep_trailing_newline: bool,
    /// Fail on undefined variables instead of rendering them empty.
    pub strict_undefined: bool,
    /// `None` keeps MiniJinja's extension-based defaults.
    pub autoescape: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MinijinjaModule;

impl EngineModule for MinijinjaModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn raw_engine(&self) -> EngineHandle {
        Arc::new(JinjaEngine::new(JinjaOptions::default()))
    }

    fn configure(&self, options: &EngineOptions) -> Result<EngineHandle, EngineError> {
        let options: JinjaOptions = parse_options(MODULE_NAME, options)?;
        Ok(Arc::new(JinjaEngine::new(options)))
    }
}

pub struct JinjaEngine {
    env: Environment<'static>,
    options: JinjaOptions,
}

impl JinjaEngine {
    fn new(options: JinjaOptions) -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(options.trim_blocks);
        env.set_lstrip_blocks(options.lstrip_blocks);
        env.set_keep_trailing_newline(options.keep_trailing_newline);
        if options.strict_undefined {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        }
        if let Some(on) = options.autoescape {
            env.set_auto_escape_callback(move |_| if on { AutoEscape::Html } else { AutoEscape::None });
        }
        JinjaEngine { env, options }
    }
}

impl fmt::Debug for JinjaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JinjaEngine")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Engine for JinjaEngine {
    fn module_name(&self) -> &'static str {
        MODULE_NAME
    }

    fn render(&self, name: &str, source: &str, data: &Value) -> Result<String, EngineError> {
        self.env
            .render_named_str(name, source, data)
            .map_err(|e| EngineError::Render {
                name: name.to_string(),
                message: error_chain(&e),
            })
    }

    fn check(&self, name: &str, source: &str) -> Result<(), EngineError> {
        self.env
            .template_from_named_str(name, source)
            .map(|_| ())
            .map_err(|e| EngineError::Compile {
                name: name.to_string(),
                message: error_chain(&e),
            })
    }
}
