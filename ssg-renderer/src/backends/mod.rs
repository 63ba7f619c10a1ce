//! Compiled-in engine modules.

pub mod handlebars_engine;
pub mod minijinja_engine;
pub mod tera_engine;

pub use handlebars_engine::{HandlebarsModule, HandlebarsOptions};
pub use minijinja_engine::{JinjaOptions, MinijinjaModule};
pub use tera_engine::{TeraModule, TeraOptions};
