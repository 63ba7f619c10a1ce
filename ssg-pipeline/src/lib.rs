//! # ssg-pipeline
//!
//! Template assets, bundle writers and the build session that ties them
//! together.
//!
//! [`TemplateAsset`] renders one template and produces its artifacts;
//! [`PrecompiledArtifactWriter`] and [`RawBundleWriter`] stream those
//! artifacts out; [`BuildSession`] runs a whole source tree and writes the
//! results with hash-gated atomic writes.

pub mod asset;
pub mod error;
pub mod manifest;
pub mod packager;
pub mod pipeline;
pub mod writer;

pub use asset::{Artifact, AssetContext, AssetHandler, BaseAsset, HtmlBase, TemplateAsset, HTML_TYPE};
pub use error::{AssetError, BuildError, Stage, WriteError};
pub use packager::{
    package, Bundle, BundleWriter, GeneratedAsset, PrecompiledArtifactWriter, RawBundleWriter,
};
pub use pipeline::{
    discover_templates, render_one, AssetOutcome, BuildOptions, BuildReport, BuildSession,
};
pub use writer::WriteResult;
