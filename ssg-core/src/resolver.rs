//! Engine resolution: file extension → engine id → engine module.
//!
//! | Engine       | Extensions                    | Module       |
//! |--------------|-------------------------------|--------------|
//! | `nunjucks`   | `njk`, `nunjucks`, `nunj`     | `tera`       |
//! | `handlebars` | `hbs`, `handlebars`           | `handlebars` |
//! | `mustache`   | `mustache`                    | `handlebars` |
//! | `jinja`      | `j2`, `jinja`, `jinja2`       | `minijinja`  |
//! | `tera`       | `tera`                        | `tera`       |
//!
//! Both lookups are pure functions over a closed table. Unknown inputs fail
//! with [`ResolutionError`]; there is no fallback engine.

use crate::error::ResolutionError;
use crate::types::EngineId;

/// One row of the engine table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineDescriptor {
    pub engine: EngineId,
    /// Extensions without the leading dot, lowercase.
    pub extensions: &'static [&'static str],
    /// Name of the module that implements the engine.
    pub module: &'static str,
}

const ENGINES: &[EngineDescriptor] = &[
    EngineDescriptor {
        engine: EngineId::Nunjucks,
        extensions: &["njk", "nunjucks", "nunj"],
        module: "tera",
    },
    EngineDescriptor {
        engine: EngineId::Handlebars,
        extensions: &["hbs", "handlebars"],
        module: "handlebars",
    },
    EngineDescriptor {
        engine: EngineId::Mustache,
        extensions: &["mustache"],
        module: "handlebars",
    },
    EngineDescriptor {
        engine: EngineId::Jinja,
        extensions: &["j2", "jinja", "jinja2"],
        module: "minijinja",
    },
    EngineDescriptor {
        engine: EngineId::Tera,
        extensions: &["tera"],
        module: "tera",
    },
];

/// The whole engine table, in [`EngineId::all`] order.
pub fn descriptors() -> &'static [EngineDescriptor] {
    ENGINES
}

/// Map a file extension (with or without the leading dot) to its engine.
///
/// Matching is ASCII case-insensitive.
pub fn resolve_engine(extension: &str) -> Result<EngineId, ResolutionError> {
    let ext = extension.strip_prefix('.').unwrap_or(extension);
    ENGINES
        .iter()
        .find(|d| d.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .map(|d| d.engine)
        .ok_or_else(|| ResolutionError::UnknownExtension(extension.to_string()))
}

/// Map an engine id to the name of the module implementing it.
///
/// Takes a raw string because callers may hold an id that never went through
/// [`resolve_engine`].
pub fn resolve_engine_module(engine_id: &str) -> Result<&'static str, ResolutionError> {
    ENGINES
        .iter()
        .find(|d| d.engine.as_str() == engine_id)
        .map(|d| d.module)
        .ok_or_else(|| ResolutionError::UnknownEngine(engine_id.to_string()))
}
