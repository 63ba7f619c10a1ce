//! Template assets: one source template moving through
//! `load → generate → post_process`.
//!
//! ```text
//!  New ──load()──▶ Loaded ──post_process()──▶ PostProcessed
//!   │                │
//!   └──── error ─────┴──────────────────────▶ Failed
//! ```
//!
//! `load` renders the template body through an engine configured for this
//! asset. `post_process` adds the precompiled JavaScript artifact for engines
//! that support it, ahead of the base artifacts.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use ssg_core::{
    resolve_engine, resolve_engine_module, ConfigDiscovery, EngineId, Extracted, FrontMatter,
    FrontMatterData, FsConfigDiscovery, YamlFrontMatter,
};
use ssg_renderer::{
    BuiltinModules, EngineConfigurator, EngineError, EngineHandle, EngineModuleRef,
    EngineRegistry, ModuleLoader, OverrideRegistry, PrecompileOptions, TemplateData,
};

use crate::error::AssetError;

/// Type tag of the primary rendered artifact.
pub const HTML_TYPE: &str = "html";

/// One generated output of an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub type_tag: String,
    pub value: String,
}

impl Artifact {
    pub fn new(type_tag: impl Into<String>, value: impl Into<String>) -> Self {
        Artifact {
            type_tag: type_tag.into(),
            value: value.into(),
        }
    }
}

/// Base asset behaviour a template asset delegates to.
pub trait BaseAsset: Send + Sync {
    /// Primary artifacts for a final body.
    fn generate(&self, body: &str) -> Vec<Artifact>;

    /// Base post-processing of generated artifacts.
    fn post_process(&self, generated: Vec<Artifact>) -> Vec<Artifact>;
}

/// Treats the final body as an HTML document.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlBase;

impl BaseAsset for HtmlBase {
    fn generate(&self, body: &str) -> Vec<Artifact> {
        vec![Artifact::new(HTML_TYPE, body)]
    }

    fn post_process(&self, generated: Vec<Artifact>) -> Vec<Artifact> {
        generated
    }
}

/// Host-facing asset lifecycle.
#[async_trait]
pub trait AssetHandler: Send {
    /// Read, render and return the final body.
    async fn load(&mut self) -> Result<String, AssetError>;

    /// Primary artifacts for the loaded body.
    fn generate(&self) -> Result<Vec<Artifact>, AssetError>;

    /// Final ordered artifact list.
    async fn post_process(&mut self, generated: Vec<Artifact>)
        -> Result<Vec<Artifact>, AssetError>;
}

/// Build-wide collaborators shared by every asset of a session.
pub struct AssetContext {
    /// Project root; config discovery never searches above it.
    pub root: PathBuf,
    pub global_data: Arc<Value>,
    pub registry: EngineRegistry,
    pub loader: Arc<dyn ModuleLoader>,
    pub discovery: Arc<dyn ConfigDiscovery>,
    pub overrides: OverrideRegistry,
    pub front_matter: Arc<dyn FrontMatter>,
    pub base: Arc<dyn BaseAsset>,
}

impl AssetContext {
    /// Context with the built-in engines, overrides and YAML front matter,
    /// discovering engine config up to `root`.
    pub fn new(root: impl Into<PathBuf>, global_data: Value) -> Self {
        let root = root.into();
        AssetContext {
            discovery: Arc::new(FsConfigDiscovery::new(root.clone())),
            root,
            global_data: Arc::new(global_data),
            registry: EngineRegistry::new(),
            loader: Arc::new(BuiltinModules::new()),
            overrides: OverrideRegistry::builtin(),
            front_matter: Arc::new(YamlFrontMatter),
            base: Arc::new(HtmlBase),
        }
    }

    pub fn with_loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    pub fn with_discovery(mut self, discovery: impl ConfigDiscovery + 'static) -> Self {
        self.discovery = Arc::new(discovery);
        self
    }

    pub fn with_overrides(mut self, overrides: OverrideRegistry) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_front_matter(mut self, front_matter: impl FrontMatter + 'static) -> Self {
        self.front_matter = Arc::new(front_matter);
        self
    }

    pub fn with_base(mut self, base: impl BaseAsset + 'static) -> Self {
        self.base = Arc::new(base);
        self
    }

    fn configurator(&self) -> EngineConfigurator<'_> {
        EngineConfigurator {
            discovery: self.discovery.as_ref(),
            overrides: &self.overrides,
            registry: &self.registry,
        }
    }
}

impl fmt::Debug for AssetContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetContext")
            .field("root", &self.root)
            .field("global_data", &self.global_data)
            .field("registry", &self.registry.engines())
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    New,
    Loaded,
    PostProcessed,
    Failed,
}

/// A template source file handled by a template engine.
#[derive(Debug)]
pub struct TemplateAsset {
    path: PathBuf,
    extension: String,
    engine: EngineId,
    module_name: &'static str,
    ctx: Arc<AssetContext>,
    state: State,
    front_matter: FrontMatterData,
    raw_body: Option<String>,
    output: Option<String>,
    handle: Option<EngineHandle>,
    generated: BTreeMap<String, String>,
}

impl TemplateAsset {
    /// Resolve the engine for `path` from its extension.
    pub fn new(path: impl Into<PathBuf>, ctx: Arc<AssetContext>) -> Result<Self, AssetError> {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        let resolved = resolve_engine(&extension).and_then(|engine| {
            resolve_engine_module(engine.as_str()).map(|module| (engine, module))
        });
        let (engine, module_name) = match resolved {
            Ok(pair) => pair,
            Err(source) => return Err(AssetError::Resolution { path, source }),
        };

        Ok(TemplateAsset {
            path,
            extension,
            engine,
            module_name,
            ctx,
            state: State::New,
            front_matter: FrontMatterData::new(),
            raw_body: None,
            output: None,
            handle: None,
            generated: BTreeMap::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn engine(&self) -> EngineId {
        self.engine
    }

    /// Name of the engine module this asset loads.
    pub fn module_name(&self) -> &'static str {
        self.module_name
    }

    pub fn front_matter(&self) -> &FrontMatterData {
        &self.front_matter
    }

    /// Template body as read from disk, front matter removed.
    pub fn raw_body(&self) -> Option<&str> {
        self.raw_body.as_deref()
    }

    /// Final rendered body.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Engine this asset configured during `load`.
    pub fn handle(&self) -> Option<&EngineHandle> {
        self.handle.as_ref()
    }

    /// Content recorded for `type_tag` by `post_process`.
    pub fn generated(&self, type_tag: &str) -> Option<&str> {
        self.generated.get(type_tag).map(String::as_str)
    }

    /// Read, configure and render this template. May be called once.
    pub async fn load(&mut self) -> Result<String, AssetError> {
        if self.state != State::New {
            return Err(self.lifecycle("load() may only be called once"));
        }
        self.state = State::Failed;
        let output = self.load_inner().await?;
        self.state = State::Loaded;
        Ok(output)
    }

    async fn load_inner(&mut self) -> Result<String, AssetError> {
        let ctx = Arc::clone(&self.ctx);

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| AssetError::Read {
                path: self.path.clone(),
                source,
            })?;
        let Extracted { front_matter, body } =
            ctx.front_matter
                .extract(&contents)
                .map_err(|source| AssetError::Extract {
                    path: self.path.clone(),
                    source,
                })?;
        self.front_matter = front_matter;
        self.raw_body = Some(body.clone());

        let data = TemplateData::new(&self.front_matter, &ctx.global_data);
        let module = self.load_module().await?;
        let handle = ctx
            .configurator()
            .configure(self.engine, &module, &data.config_input(), self.search_dir())
            .await
            .map_err(|source| AssetError::Configure {
                path: self.path.clone(),
                source,
            })?;
        self.handle = Some(Arc::clone(&handle));

        tracing::debug!(path = %self.path.display(), data = ?data.locals(), "render data");
        let rendered = render_blocking(handle, self.template_name(), body, data.to_value())
            .await
            .map_err(|source| AssetError::Render {
                path: self.path.clone(),
                source,
            })?;

        let output = ctx
            .front_matter
            .reserialize_after_render(&rendered)
            .map_err(|source| AssetError::Extract {
                path: self.path.clone(),
                source,
            })?;
        self.output = Some(output.clone());
        Ok(output)
    }

    /// Primary artifacts produced by the base delegate from the final body.
    pub fn generate(&self) -> Result<Vec<Artifact>, AssetError> {
        match (&self.state, &self.output) {
            (State::Loaded | State::PostProcessed, Some(output)) => {
                Ok(self.ctx.base.generate(output))
            }
            _ => Err(self.lifecycle("generate() requires a loaded asset")),
        }
    }

    /// Prepend the precompiled artifact (when the engine has one) to the base
    /// artifacts and record every artifact by type tag.
    pub async fn post_process(
        &mut self,
        generated: Vec<Artifact>,
    ) -> Result<Vec<Artifact>, AssetError> {
        if self.state != State::Loaded {
            return Err(self.lifecycle("post_process() requires a loaded asset"));
        }

        let precompiled = match self.precompile(self.engine).await {
            Ok(precompiled) => precompiled,
            Err(err) => {
                self.state = State::Failed;
                return Err(err);
            }
        };

        let mut artifacts = self.ctx.base.post_process(generated);
        if let Some(value) = precompiled {
            artifacts.insert(0, Artifact::new(self.engine.precompile_type_tag(), value));
        }

        for artifact in &artifacts {
            self.generated
                .insert(artifact.type_tag.clone(), artifact.value.clone());
        }
        self.state = State::PostProcessed;

        tracing::debug!(
            path = %self.path.display(),
            artifacts = ?artifacts.iter().map(|a| a.type_tag.as_str()).collect::<Vec<_>>(),
            "post-processed"
        );
        Ok(artifacts)
    }

    /// Ahead-of-time compile the raw body for `engine`.
    ///
    /// Only nunjucks templates are precompiled; every other engine yields
    /// `Ok(None)`.
    pub async fn precompile(&self, engine: EngineId) -> Result<Option<String>, AssetError> {
        match engine {
            EngineId::Nunjucks => {
                let module = self.load_module().await?;
                let (Some(env), Some(body)) = (self.handle.clone(), self.raw_body.clone()) else {
                    return Err(self.lifecycle("precompile() requires a loaded asset"));
                };
                let opts = PrecompileOptions {
                    name: self.template_name(),
                    as_function: true,
                    force: false,
                    env,
                };
                let compiled = precompile_blocking(module, body, opts)
                    .await
                    .map_err(|source| AssetError::Precompile {
                        path: self.path.clone(),
                        source,
                    })?;
                Ok(Some(compiled))
            }
            _ => Ok(None),
        }
    }

    async fn load_module(&self) -> Result<EngineModuleRef, AssetError> {
        self.ctx
            .loader
            .load(self.module_name, &self.path)
            .await
            .map_err(|source| AssetError::ModuleLoad {
                path: self.path.clone(),
                source,
            })
    }

    fn template_name(&self) -> String {
        self.path.display().to_string()
    }

    /// Directory engine config discovery starts from.
    fn search_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    fn lifecycle(&self, message: &'static str) -> AssetError {
        AssetError::Lifecycle {
            path: self.path.clone(),
            message,
        }
    }
}

#[async_trait]
impl AssetHandler for TemplateAsset {
    async fn load(&mut self) -> Result<String, AssetError> {
        TemplateAsset::load(self).await
    }

    fn generate(&self) -> Result<Vec<Artifact>, AssetError> {
        TemplateAsset::generate(self)
    }

    async fn post_process(
        &mut self,
        generated: Vec<Artifact>,
    ) -> Result<Vec<Artifact>, AssetError> {
        TemplateAsset::post_process(self, generated).await
    }
}

async fn render_blocking(
    handle: EngineHandle,
    name: String,
    source: String,
    data: Value,
) -> Result<String, EngineError> {
    let task_name = name.clone();
    tokio::task::spawn_blocking(move || handle.render(&name, &source, &data))
        .await
        .unwrap_or_else(|err| {
            Err(EngineError::Render {
                name: task_name,
                message: format!("render task failed: {err}"),
            })
        })
}

async fn precompile_blocking(
    module: EngineModuleRef,
    source: String,
    opts: PrecompileOptions,
) -> Result<String, EngineError> {
    let task_name = opts.name.clone();
    tokio::task::spawn_blocking(move || module.precompile_string(&source, &opts))
        .await
        .unwrap_or_else(|err| {
            Err(EngineError::Compile {
                name: task_name,
                message: format!("precompile task failed: {err}"),
            })
        })
}
