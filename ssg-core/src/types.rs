//! Domain types shared by every ssg crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ResolutionError;

/// Options handed to an engine when it is configured.
pub type EngineOptions = Map<String, Value>;

/// Key/value metadata extracted from the head of a template.
pub type FrontMatterData = Map<String, Value>;

/// Suffix shared by every precompiled artifact type tag.
pub const PRECOMPILE_SUFFIX: &str = "-precompile.js";

// ---------------------------------------------------------------------------
// EngineId
// ---------------------------------------------------------------------------

/// All supported template dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineId {
    Nunjucks,
    Handlebars,
    Mustache,
    Jinja,
    Tera,
}

impl EngineId {
    /// All engine variants in a stable order.
    pub fn all() -> &'static [EngineId] {
        &[
            EngineId::Nunjucks,
            EngineId::Handlebars,
            EngineId::Mustache,
            EngineId::Jinja,
            EngineId::Tera,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineId::Nunjucks   => "nunjucks",
            EngineId::Handlebars => "handlebars",
            EngineId::Mustache   => "mustache",
            EngineId::Jinja      => "jinja",
            EngineId::Tera       => "tera",
        }
    }

    /// Whether the dialect can be compiled ahead of time into a function.
    pub fn supports_precompile(&self) -> bool {
        matches!(self, EngineId::Nunjucks)
    }

    /// `"<engine>-precompile.js"`: the artifact type tag shared by the asset
    /// that produces a precompiled template and the writer that emits it.
    pub fn precompile_type_tag(&self) -> String {
        format!("{}{PRECOMPILE_SUFFIX}", self.as_str())
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineId {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EngineId::all()
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ResolutionError::UnknownEngine(s.to_string()))
    }
}
