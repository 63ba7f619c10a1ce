//! Per-engine option discovery.
//!
//! Options for an engine `<id>` come from, in order:
//! 1. a value registered programmatically under `<id>` on [`FsConfigDiscovery`],
//! 2. the `<id>` key of the nearest `package.json`,
//! 3. the nearest of `.<id>rc`, `.<id>.js`, `.<id>.json`, `.<id>.yaml`.
//!
//! The search walks from the template's directory up to (and including) the
//! project root. `.<id>.js` files are read as data (JSON/YAML); they are
//! never executed.

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::{BoxError, ConfigError};
use crate::types::{EngineOptions, FrontMatterData};

/// Argument passed to computed options: `{ locals: frontMatter ∪ {globals} }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigInput {
    pub locals: FrontMatterData,
}

/// Signature of options computed from template locals.
pub type ComputeOptions = dyn Fn(&ConfigInput) -> Result<EngineOptions, BoxError> + Send + Sync;

/// Discovered engine configuration.
#[derive(Clone)]
pub enum ConfigValue {
    /// Options used as-is.
    Static(EngineOptions),
    /// Options derived from the locals of the template being rendered.
    Computed(Arc<ComputeOptions>),
}

impl ConfigValue {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&ConfigInput) -> Result<EngineOptions, BoxError> + Send + Sync + 'static,
    {
        ConfigValue::Computed(Arc::new(f))
    }

    /// Evaluate to concrete options. `Computed` is invoked exactly once per call.
    pub fn resolve(&self, input: &ConfigInput) -> Result<EngineOptions, ConfigError> {
        match self {
            ConfigValue::Static(opts) => Ok(opts.clone()),
            ConfigValue::Computed(f) => f(input).map_err(ConfigError::Computed),
        }
    }
}

impl fmt::Debug for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Static(opts) => f.debug_tuple("Static").field(opts).finish(),
            ConfigValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Candidate config file names for `engine_id`, highest priority first.
pub fn config_candidates(engine_id: &str) -> Vec<String> {
    vec![
        format!(".{engine_id}rc"),
        format!(".{engine_id}.js"),
        format!(".{engine_id}.json"),
        format!(".{engine_id}.yaml"),
    ]
}

/// Config discovery capability.
#[async_trait]
pub trait ConfigDiscovery: Send + Sync {
    /// Find configuration for `package_key`, searching from `search_from`.
    ///
    /// Returns `Ok(None)` when nothing is configured.
    async fn discover(
        &self,
        candidates: &[String],
        package_key: &str,
        search_from: &Path,
    ) -> Result<Option<ConfigValue>, ConfigError>;
}

/// Filesystem-backed [`ConfigDiscovery`] with programmatic registrations.
#[derive(Debug, Clone, Default)]
pub struct FsConfigDiscovery {
    root: Option<PathBuf>,
    registered: HashMap<String, ConfigValue>,
}

impl FsConfigDiscovery {
    /// Discovery bounded by `root`; directories above it are never searched.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsConfigDiscovery {
            root: Some(root.into()),
            registered: HashMap::new(),
        }
    }

    /// Discovery that walks all the way up to the filesystem root.
    pub fn unbounded() -> Self {
        FsConfigDiscovery::default()
    }

    /// Register `value` for `package_key`, shadowing anything on disk.
    pub fn register(mut self, package_key: impl Into<String>, value: ConfigValue) -> Self {
        self.registered.insert(package_key.into(), value);
        self
    }

    fn search_dirs(&self, from: &Path) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        for dir in from.ancestors() {
            dirs.push(dir.to_path_buf());
            if self.root.as_deref() == Some(dir) {
                break;
            }
        }
        dirs
    }
}

#[async_trait]
impl ConfigDiscovery for FsConfigDiscovery {
    async fn discover(
        &self,
        candidates: &[String],
        package_key: &str,
        search_from: &Path,
    ) -> Result<Option<ConfigValue>, ConfigError> {
        if let Some(value) = self.registered.get(package_key) {
            tracing::debug!(key = package_key, "using registered engine config");
            return Ok(Some(value.clone()));
        }

        let dirs = self.search_dirs(search_from);

        for dir in &dirs {
            let manifest = dir.join("package.json");
            let Some(contents) = read_optional(&manifest).await? else {
                continue;
            };
            let pkg: Value = serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
                path: manifest.clone(),
                source,
            })?;
            match pkg.get(package_key) {
                Some(Value::Object(opts)) => {
                    tracing::debug!(path = %manifest.display(), key = package_key, "engine config from package.json");
                    return Ok(Some(ConfigValue::Static(opts.clone())));
                }
                Some(_) => return Err(ConfigError::NotAMapping { path: manifest }),
                None => break,
            }
        }

        for dir in &dirs {
            for name in candidates {
                let path = dir.join(name);
                let Some(contents) = read_optional(&path).await? else {
                    continue;
                };
                tracing::debug!(path = %path.display(), "engine config file");
                return parse_options(&path, &contents).map(|o| Some(ConfigValue::Static(o)));
            }
        }

        Ok(None)
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, ConfigError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_options(path: &Path, contents: &str) -> Result<EngineOptions, ConfigError> {
    if contents.trim().is_empty() {
        return Ok(EngineOptions::new());
    }
    let value: Value = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str(contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        serde_yaml::from_str(contents).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?
    };
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::NotAMapping {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn candidates_follow_naming_convention() {
        assert_eq!(
            config_candidates("nunjucks"),
            vec![".nunjucksrc", ".nunjucks.js", ".nunjucks.json", ".nunjucks.yaml"]
        );
    }

    #[test]
    fn static_value_resolves_to_itself() {
        let mut opts = EngineOptions::new();
        opts.insert("autoescape".into(), json!(false));
        let value = ConfigValue::Static(opts.clone());
        assert_eq!(value.resolve(&ConfigInput::default()).unwrap(), opts);
    }

    #[test]
    fn computed_value_is_called_once_with_locals() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let value = ConfigValue::computed(move |input| {
            seen.fetch_add(1, Ordering::SeqCst);
            let mut out = EngineOptions::new();
            out.insert("title".into(), input.locals["title"].clone());
            Ok(out)
        });

        let mut locals = FrontMatterData::new();
        locals.insert("title".into(), json!("Hi"));
        let opts = value.resolve(&ConfigInput { locals }).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(opts.get("title"), Some(&json!("Hi")));
    }

    #[test]
    fn computed_failure_maps_to_config_error() {
        let value = ConfigValue::computed(|_| Err("boom".into()));
        let err = value.resolve(&ConfigInput::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Computed(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn search_stops_at_root() {
        let discovery = FsConfigDiscovery::new("/site");
        let dirs = discovery.search_dirs(Path::new("/site/src/blog"));
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/site/src/blog"),
                PathBuf::from("/site/src"),
                PathBuf::from("/site"),
            ]
        );
    }
}
