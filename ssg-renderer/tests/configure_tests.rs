//! Configuration merge precedence: override > raw module, computed options
//! evaluated once, registry slot populated.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use ssg_core::{
    ConfigDiscovery, ConfigError, ConfigInput, ConfigValue, EngineId, EngineOptions,
    FrontMatterData, FsConfigDiscovery,
};
use ssg_renderer::{
    backends::TeraModule, ConfigureError, Engine, EngineConfigurator, EngineError, EngineHandle,
    EngineModule, EngineModuleRef, EngineRegistry, OverrideRegistry,
};

/// Discovery returning a fixed value and recording what it was asked for.
struct FixedDiscovery {
    value: Option<ConfigValue>,
    asked: Mutex<Vec<(Vec<String>, String)>>,
}

impl FixedDiscovery {
    fn new(value: Option<ConfigValue>) -> Self {
        FixedDiscovery {
            value,
            asked: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ConfigDiscovery for FixedDiscovery {
    async fn discover(
        &self,
        candidates: &[String],
        package_key: &str,
        _search_from: &Path,
    ) -> Result<Option<ConfigValue>, ConfigError> {
        self.asked
            .lock()
            .unwrap()
            .push((candidates.to_vec(), package_key.to_string()));
        Ok(self.value.clone())
    }
}

/// Engine that renders a fixed marker, so tests can tell handles apart.
#[derive(Debug)]
struct Marker(&'static str);

impl Engine for Marker {
    fn module_name(&self) -> &'static str {
        "marker"
    }
    fn render(&self, _name: &str, _source: &str, _data: &Value) -> Result<String, EngineError> {
        Ok(self.0.to_string())
    }
    fn check(&self, _name: &str, _source: &str) -> Result<(), EngineError> {
        Ok(())
    }
}

fn opts(value: Value) -> EngineOptions {
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn locals() -> ConfigInput {
    let mut locals = FrontMatterData::new();
    locals.insert("title".into(), json!("Hi"));
    locals.insert("globals".into(), json!({"site": "X"}));
    ConfigInput { locals }
}

async fn configure(
    discovery: &dyn ConfigDiscovery,
    overrides: &OverrideRegistry,
    registry: &EngineRegistry,
    engine: EngineId,
) -> Result<EngineHandle, ConfigureError> {
    let module: EngineModuleRef = Arc::new(TeraModule);
    EngineConfigurator {
        discovery,
        overrides,
        registry,
    }
    .configure(engine, &module, &locals(), Path::new("/site/src"))
    .await
}

#[tokio::test]
async fn override_wins_over_raw_module_and_receives_options() {
    let discovery = FixedDiscovery::new(Some(ConfigValue::Static(opts(json!({"flavour": "x"})))));
    let seen = Arc::new(Mutex::new(None));
    let seen_in = seen.clone();
    let overrides = OverrideRegistry::empty().with(EngineId::Nunjucks, move |_module, options| {
        *seen_in.lock().unwrap() = Some(options.clone());
        Ok(Arc::new(Marker("override")) as EngineHandle)
    });
    let registry = EngineRegistry::new();

    let handle = configure(&discovery, &overrides, &registry, EngineId::Nunjucks).await.unwrap();

    assert_eq!(handle.render("p", "", &json!({})).unwrap(), "override");
    let registered = registry.get(EngineId::Nunjucks).unwrap();
    assert_eq!(registered.render("p", "", &json!({})).unwrap(), "override");
    assert_eq!(*seen.lock().unwrap(), Some(opts(json!({"flavour": "x"}))));
}

#[tokio::test]
async fn raw_module_is_registered_without_override() {
    let discovery = FixedDiscovery::new(Some(ConfigValue::Static(opts(json!({"autoescape": true})))));
    let registry = EngineRegistry::new();

    let handle = configure(&discovery, &OverrideRegistry::empty(), &registry, EngineId::Tera)
        .await
        .unwrap();

    assert_eq!(handle.module_name(), "tera");
    // The raw module ignores discovered options: no escaping for `.tera` names.
    let out = handle.render("p.tera", "{{ h }}", &json!({"h": "<b>"})).unwrap();
    assert_eq!(out, "<b>");
    assert_eq!(registry.engines(), vec![EngineId::Tera]);
}

#[tokio::test]
async fn discovery_is_asked_with_engine_named_candidates() {
    let discovery = FixedDiscovery::new(None);
    configure(&discovery, &OverrideRegistry::builtin(), &EngineRegistry::new(), EngineId::Jinja)
        .await
        .unwrap();

    let asked = discovery.asked.lock().unwrap();
    assert_eq!(asked.len(), 1);
    assert_eq!(asked[0].1, "jinja");
    assert_eq!(&asked[0].0[..2], &[".jinjarc".to_string(), ".jinja.js".to_string()]);
}

#[tokio::test]
async fn computed_options_are_called_once_with_locals() {
    let calls = Arc::new(AtomicUsize::new(0));
    let received = Arc::new(Mutex::new(None));
    let (calls_in, received_in) = (calls.clone(), received.clone());
    let value = ConfigValue::computed(move |input| {
        calls_in.fetch_add(1, Ordering::SeqCst);
        *received_in.lock().unwrap() = Some(input.clone());
        Ok(opts(json!({"autoescape": false})))
    });
    let discovery = FixedDiscovery::new(Some(value));
    let registry = EngineRegistry::new();

    let handle = configure(&discovery, &OverrideRegistry::builtin(), &registry, EngineId::Nunjucks)
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(received.lock().unwrap().as_ref(), Some(&locals()));
    // The return value, not the builtin default, drives the engine.
    let out = handle.render("p.njk", "{{ h }}", &json!({"h": "<b>"})).unwrap();
    assert_eq!(out, "<b>");
}

#[tokio::test]
async fn computed_failure_is_a_config_error() {
    let discovery = FixedDiscovery::new(Some(ConfigValue::computed(|_| Err("no locals".into()))));
    let err = configure(&discovery, &OverrideRegistry::builtin(), &EngineRegistry::new(), EngineId::Nunjucks)
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigureError::Config(ConfigError::Computed(_))), "got: {err}");
}

#[tokio::test]
async fn failing_override_is_reported_with_engine() {
    let discovery = FixedDiscovery::new(Some(ConfigValue::Static(opts(json!({"autoescape": "nope"})))));
    let err = configure(&discovery, &OverrideRegistry::builtin(), &EngineRegistry::new(), EngineId::Nunjucks)
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigureError::Override { ref engine, .. } if engine == "nunjucks"));
}

#[tokio::test]
async fn rc_file_reaches_the_engine_through_filesystem_discovery() {
    let root = tempfile::TempDir::new().unwrap();
    std::fs::write(root.path().join(".nunjucksrc"), "autoescape: false\n").unwrap();
    let discovery = FsConfigDiscovery::new(root.path());
    let module: EngineModuleRef = Arc::new(TeraModule);
    let overrides = OverrideRegistry::builtin();
    let registry = EngineRegistry::new();

    let handle = EngineConfigurator {
        discovery: &discovery,
        overrides: &overrides,
        registry: &registry,
    }
    .configure(EngineId::Nunjucks, &module, &locals(), root.path())
    .await
    .unwrap();

    let out = handle.render("p.njk", "{{ h }}", &json!({"h": "<b>"})).unwrap();
    assert_eq!(out, "<b>");
    assert_eq!(module.name(), "tera");
}
