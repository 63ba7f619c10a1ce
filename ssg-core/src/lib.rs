//! ssg core library: engine resolution, front matter, config discovery, errors.
//!
//! Public API surface:
//! - [`types`]: [`EngineId`] and the option/data mappings passed to engines
//! - [`resolver`]: extension → engine id → engine module lookups
//! - [`front_matter`]: [`FrontMatter`] capability and the YAML default
//! - [`config`]: per-engine option discovery ([`ConfigValue`], [`ConfigDiscovery`])
//! - [`site`]: the `ssg.yaml` site configuration
//! - [`error`]: error enums for every concern above

pub mod config;
pub mod error;
pub mod front_matter;
pub mod resolver;
pub mod site;
pub mod types;

pub use config::{config_candidates, ConfigDiscovery, ConfigInput, ConfigValue, FsConfigDiscovery};
pub use error::{ConfigError, CoreError, FrontMatterError, ResolutionError};
pub use front_matter::{Extracted, FrontMatter, YamlFrontMatter};
pub use resolver::{descriptors, resolve_engine, resolve_engine_module, EngineDescriptor};
pub use site::{read_globals_file, SiteConfig, SITE_CONFIG_FILE};
pub use types::{EngineId, EngineOptions, FrontMatterData, PRECOMPILE_SUFFIX};
