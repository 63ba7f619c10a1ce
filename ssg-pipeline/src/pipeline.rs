//! Build session: discover templates, process them concurrently and write
//! their bundles.
//!
//! Each source file runs as its own task (`JoinSet`), bounded by a
//! `Semaphore`. A failing asset fails only itself; its error is kept in the
//! [`BuildReport`] and the remaining assets still build. A panicking task is
//! reported against its source the same way.
//!
//! Outputs are claimed before anything is written: when two sources map to
//! the same output file (`page.njk` and `page.hbs` both giving `page.html`)
//! every claimant fails with [`WriteError::OutputConflict`] and none of them
//! is written.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use ssg_core::{resolve_engine, SiteConfig};

use crate::asset::{AssetContext, TemplateAsset};
use crate::error::{AssetError, BuildError, WriteError};
use crate::manifest;
use crate::packager::{package, Bundle};
use crate::writer::{atomic_write, WriteResult};

/// Inputs of a build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Project root; engine config discovery stops here.
    pub root: PathBuf,
    pub source_root: PathBuf,
    pub out_root: PathBuf,
    pub global_data: Value,
    pub concurrency: usize,
    pub dry_run: bool,
}

impl BuildOptions {
    /// Options for the project at `root` as described by its site config.
    pub fn from_site(root: &Path, site: &SiteConfig) -> Result<Self, BuildError> {
        Ok(BuildOptions {
            root: root.to_path_buf(),
            source_root: site.source_root(root),
            out_root: site.out_root(root),
            global_data: site.load_globals(root)?,
            concurrency: site.concurrency(),
            dry_run: false,
        })
    }
}

/// Build result of one source template.
#[derive(Debug)]
pub struct AssetOutcome {
    pub source: PathBuf,
    pub result: Result<Vec<WriteResult>, AssetError>,
}

/// Per-asset outcomes of a build, ordered by source path.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub assets: Vec<AssetOutcome>,
}

impl BuildReport {
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &AssetError)> {
        self.assets
            .iter()
            .filter_map(|a| a.result.as_ref().err().map(|e| (a.source.as_path(), e)))
    }

    pub fn writes(&self) -> impl Iterator<Item = &WriteResult> {
        self.assets
            .iter()
            .filter_map(|a| a.result.as_ref().ok())
            .flatten()
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// A packaged output waiting to be written.
#[derive(Debug)]
struct PackagedBundle {
    bundle: Bundle,
    content: Vec<u8>,
}

type Processed = (PathBuf, Result<Vec<PackagedBundle>, AssetError>);

/// One build over a source tree.
#[derive(Debug)]
pub struct BuildSession {
    options: BuildOptions,
    ctx: Arc<AssetContext>,
}

impl BuildSession {
    /// Session with the default asset context for `options.root`.
    pub fn new(options: BuildOptions) -> Self {
        let ctx = AssetContext::new(options.root.clone(), options.global_data.clone());
        BuildSession::with_context(options, ctx)
    }

    pub fn with_context(options: BuildOptions, ctx: AssetContext) -> Self {
        BuildSession {
            options,
            ctx: Arc::new(ctx),
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn context(&self) -> &Arc<AssetContext> {
        &self.ctx
    }

    /// Discover and build every template under the source root.
    pub async fn build(&self) -> Result<BuildReport, BuildError> {
        let sources = discover_templates(&self.options.source_root, &self.options.out_root)?;
        tracing::info!(
            count = sources.len(),
            "discovered templates under {}",
            self.options.source_root.display()
        );
        self.build_files(sources).await
    }

    /// Build the given source files.
    pub async fn build_files(&self, sources: Vec<PathBuf>) -> Result<BuildReport, BuildError> {
        let started_at = Utc::now();
        let mut manifest = manifest::load_at(&self.options.out_root).await?;

        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut task_sources = HashMap::new();
        for source in sources {
            let ctx = Arc::clone(&self.ctx);
            let semaphore = Arc::clone(&semaphore);
            let source_root = self.options.source_root.clone();
            let out_root = self.options.out_root.clone();
            let task_source = source.clone();
            let handle = tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = process_asset(ctx, &task_source, &source_root, &out_root).await;
                (task_source, result)
            });
            task_sources.insert(handle.id(), source);
        }

        let mut processed: Vec<Processed> = Vec::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, outcome)) => processed.push(outcome),
                Err(err) => {
                    let Some(source) = task_sources.remove(&err.id()) else {
                        tracing::error!("build task for an unknown source failed: {err}");
                        continue;
                    };
                    let message = match err.try_into_panic() {
                        Ok(payload) => panic_message(payload.as_ref()),
                        Err(err) => err.to_string(),
                    };
                    let failure = AssetError::Task {
                        path: source.clone(),
                        message,
                    };
                    processed.push((source, Err(failure)));
                }
            }
        }
        processed.sort_by(|a, b| a.0.cmp(&b.0));
        reject_output_conflicts(&mut processed);

        let mut report = BuildReport::default();
        for (source, packaged) in processed {
            let result = match packaged {
                Ok(bundles) => self.write_bundles(bundles, &mut manifest.files).await,
                Err(err) => Err(err),
            };
            if let Err(err) = &result {
                tracing::warn!("{err}");
            }
            report.assets.push(AssetOutcome { source, result });
        }

        if !self.options.dry_run {
            manifest.built_at = started_at;
            manifest::save_at(&self.options.out_root, &manifest).await?;
        }
        Ok(report)
    }

    async fn write_bundles(
        &self,
        bundles: Vec<PackagedBundle>,
        digests: &mut manifest::FileDigests,
    ) -> Result<Vec<WriteResult>, AssetError> {
        let mut writes = Vec::with_capacity(bundles.len());
        for PackagedBundle { bundle, content } in bundles {
            let key = manifest_key(&self.options.out_root, &bundle.output_path);
            let result = atomic_write(
                &bundle.output_path,
                &key,
                &content,
                digests,
                self.options.dry_run,
            )
            .await
            .map_err(|source| AssetError::Write {
                path: bundle.output_path.clone(),
                source,
            })?;
            writes.push(result);
        }
        Ok(writes)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    match detail {
        Some(detail) => format!("build task panicked: {detail}"),
        None => "build task panicked".to_string(),
    }
}

/// Fail every asset whose bundles claim an output another asset also claims.
fn reject_output_conflicts(processed: &mut [Processed]) {
    let mut claims: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
    for (source, packaged) in processed.iter() {
        let Ok(bundles) = packaged else { continue };
        for bundle in bundles {
            claims
                .entry(bundle.bundle.output_path.clone())
                .or_default()
                .push(source.clone());
        }
    }

    for (_, packaged) in processed.iter_mut() {
        let Ok(bundles) = packaged else { continue };
        let conflict = bundles.iter().find_map(|b| {
            let path = &b.bundle.output_path;
            claims
                .get(path)
                .filter(|sources| sources.len() > 1)
                .map(|sources| (path.clone(), sources.clone()))
        });
        if let Some((path, sources)) = conflict {
            *packaged = Err(AssetError::Write {
                path,
                source: WriteError::OutputConflict { sources },
            });
        }
    }
}

/// Run one template through `load → generate → post_process` and package
/// every artifact it produced.
async fn process_asset(
    ctx: Arc<AssetContext>,
    source: &Path,
    source_root: &Path,
    out_root: &Path,
) -> Result<Vec<PackagedBundle>, AssetError> {
    let mut asset = TemplateAsset::new(source, ctx)?;
    asset.load().await?;
    let generated = asset.generate()?;
    let artifacts = asset.post_process(generated).await?;

    let rel = source.strip_prefix(source_root).unwrap_or(source);
    let mut bundles = Vec::with_capacity(artifacts.len());
    for artifact in &artifacts {
        let bundle = Bundle::for_source(out_root, rel, &artifact.type_tag);
        let content = package(&bundle, &asset)
            .await
            .map_err(|source| AssetError::Write {
                path: bundle.output_path.clone(),
                source,
            })?;
        bundles.push(PackagedBundle { bundle, content });
    }
    Ok(bundles)
}

/// Render a single template and return its final body.
pub async fn render_one(ctx: Arc<AssetContext>, path: &Path) -> Result<String, AssetError> {
    let mut asset = TemplateAsset::new(path, ctx)?;
    asset.load().await
}

fn manifest_key(out_root: &Path, output: &Path) -> String {
    output
        .strip_prefix(out_root)
        .unwrap_or(output)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Collect template sources under `source_root`, sorted.
///
/// Skips hidden entries, `_`-prefixed partials, the output directory and
/// files whose extension no engine handles.
pub fn discover_templates(source_root: &Path, out_root: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut files = Vec::new();
    collect_templates(source_root, out_root, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_templates(
    dir: &Path,
    out_root: &Path,
    files: &mut Vec<PathBuf>,
) -> Result<(), BuildError> {
    let entries = std::fs::read_dir(dir).map_err(|source| BuildError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| BuildError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || name.starts_with('_') || path == out_root {
            continue;
        }
        let file_type = entry.file_type().map_err(|source| BuildError::Io {
            path: path.clone(),
            source,
        })?;
        if file_type.is_dir() {
            collect_templates(&path, out_root, files)?;
        } else if is_template(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_template(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| resolve_engine(ext).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn discovery_skips_hidden_partials_output_and_unknown() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path();
        fs::create_dir_all(src.join("blog")).unwrap();
        fs::create_dir_all(src.join(".cache")).unwrap();
        fs::create_dir_all(src.join("dist")).unwrap();
        fs::write(src.join("index.njk"), "").unwrap();
        fs::write(src.join("blog/post.hbs"), "").unwrap();
        fs::write(src.join("_layout.njk"), "").unwrap();
        fs::write(src.join(".cache/x.njk"), "").unwrap();
        fs::write(src.join("dist/old.njk"), "").unwrap();
        fs::write(src.join("notes.txt"), "").unwrap();

        let found = discover_templates(src, &src.join("dist")).unwrap();
        assert_eq!(found, vec![src.join("blog/post.hbs"), src.join("index.njk")]);
    }

    #[test]
    fn discovery_of_missing_root_is_an_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = discover_templates(&tmp.path().join("nope"), tmp.path()).unwrap_err();
        assert!(matches!(err, BuildError::Io { .. }));
    }

    fn packaged(source: &str, outputs: &[&str]) -> Processed {
        let bundles = outputs
            .iter()
            .map(|out| PackagedBundle {
                bundle: Bundle::new("html", *out),
                content: Vec::new(),
            })
            .collect();
        (PathBuf::from(source), Ok(bundles))
    }

    #[test]
    fn shared_output_fails_every_claimant() {
        let mut processed = vec![
            packaged("src/a.njk", &["dist/a.html"]),
            packaged("src/page.hbs", &["dist/page.html"]),
            packaged("src/page.njk", &["dist/page.html", "dist/page.nunjucks-precompile.js"]),
        ];
        reject_output_conflicts(&mut processed);

        assert!(processed[0].1.is_ok());
        for (_, result) in &processed[1..] {
            let Err(AssetError::Write { path, source }) = result else {
                panic!("expected a write conflict, got {result:?}");
            };
            assert_eq!(path, Path::new("dist/page.html"));
            let WriteError::OutputConflict { sources } = source else {
                panic!("expected OutputConflict, got {source:?}");
            };
            assert_eq!(
                sources,
                &vec![PathBuf::from("src/page.hbs"), PathBuf::from("src/page.njk")]
            );
        }
    }

    #[test]
    fn failed_assets_claim_no_outputs() {
        let mut processed = vec![
            packaged("src/page.hbs", &["dist/page.html"]),
            (
                PathBuf::from("src/page.njk"),
                Err(AssetError::Lifecycle {
                    path: PathBuf::from("src/page.njk"),
                    message: "failed earlier",
                }),
            ),
        ];
        reject_output_conflicts(&mut processed);
        assert!(processed[0].1.is_ok());
    }

    #[test]
    fn manifest_keys_are_relative_to_out_root() {
        let key = manifest_key(Path::new("dist"), Path::new("dist/a/page.html"));
        assert_eq!(key, "a/page.html");
    }
}
