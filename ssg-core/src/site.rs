//! Site configuration: `<root>/ssg.yaml`.
//!
//! ```yaml
//! source_dir: src
//! out_dir: dist
//! globals:
//!   site: My Site
//! globals_file: data/site.yaml
//! concurrency: 8
//! ```
//!
//! Every key is optional. A missing file yields [`SiteConfig::default`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{io_err, CoreError};

/// File name of the site configuration, relative to the project root.
pub const SITE_CONFIG_FILE: &str = "ssg.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Template root, relative to the project root.
    pub source_dir: PathBuf,
    /// Output root, relative to the project root.
    pub out_dir: PathBuf,
    /// Inline global data exposed to every template as `globals`.
    pub globals: Map<String, Value>,
    /// YAML or JSON file whose top-level keys are merged over `globals`.
    pub globals_file: Option<PathBuf>,
    /// Maximum number of assets processed at once.
    pub concurrency: Option<usize>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            source_dir: PathBuf::from("src"),
            out_dir: PathBuf::from("dist"),
            globals: Map::new(),
            globals_file: None,
            concurrency: None,
        }
    }
}

impl SiteConfig {
    /// Load `<root>/ssg.yaml`, falling back to defaults when absent.
    pub fn load_at(root: &Path) -> Result<SiteConfig, CoreError> {
        let path = root.join(SITE_CONFIG_FILE);
        if !path.exists() {
            return Ok(SiteConfig::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        if contents.trim().is_empty() {
            return Ok(SiteConfig::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| CoreError::Parse { path, source })
    }

    /// Build the global data object: inline `globals`, then `globals_file`
    /// (relative paths resolve against `root`) merged over it key by key.
    pub fn load_globals(&self, root: &Path) -> Result<Value, CoreError> {
        let mut globals = self.globals.clone();
        if let Some(file) = &self.globals_file {
            let path = root.join(file);
            globals.extend(read_globals_file(&path)?);
        }
        Ok(Value::Object(globals))
    }

    pub fn source_root(&self, root: &Path) -> PathBuf {
        root.join(&self.source_dir)
    }

    pub fn out_root(&self, root: &Path) -> PathBuf {
        root.join(&self.out_dir)
    }

    /// Effective concurrency: configured value, else available parallelism.
    pub fn concurrency(&self) -> usize {
        self.concurrency
            .filter(|n| *n > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4)
            })
    }
}

/// Read a YAML/JSON mapping of global data.
pub fn read_globals_file(path: &Path) -> Result<Map<String, Value>, CoreError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if contents.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_yaml::from_str(&contents).map_err(|source| CoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(CoreError::GlobalsNotAMapping {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let root = TempDir::new().unwrap();
        let cfg = SiteConfig::load_at(root.path()).unwrap();
        assert_eq!(cfg, SiteConfig::default());
        assert_eq!(cfg.out_root(root.path()), root.path().join("dist"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join(SITE_CONFIG_FILE), "out_dir: public\n").unwrap();
        let cfg = SiteConfig::load_at(root.path()).unwrap();
        assert_eq!(cfg.out_dir, PathBuf::from("public"));
        assert_eq!(cfg.source_dir, PathBuf::from("src"));
    }

    #[test]
    fn globals_file_overrides_inline_keys() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("data.json"), r#"{"site": "File", "year": 2024}"#).unwrap();
        let mut cfg = SiteConfig::default();
        cfg.globals.insert("site".into(), json!("Inline"));
        cfg.globals.insert("lang".into(), json!("en"));
        cfg.globals_file = Some(PathBuf::from("data.json"));

        let globals = cfg.load_globals(root.path()).unwrap();
        assert_eq!(globals, json!({"site": "File", "year": 2024, "lang": "en"}));
    }

    #[test]
    fn zero_concurrency_falls_back_to_parallelism() {
        let cfg = SiteConfig {
            concurrency: Some(0),
            ..SiteConfig::default()
        };
        assert!(cfg.concurrency() >= 1);
    }
}
