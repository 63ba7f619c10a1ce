//! Render data: the payload handed to every engine.
//!
//! Templates see their own front matter at the top level plus the build-wide
//! global data under `globals`:
//!
//! ```text
//! { title: "Hi", globals: { site: "X" } }
//! ```

use std::sync::Arc;

use serde_json::Value;

use ssg_core::{ConfigInput, FrontMatterData};

/// Key under which global data is exposed to templates.
pub const GLOBALS_KEY: &str = "globals";

/// Front matter merged with global data.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateData {
    locals: FrontMatterData,
}

impl TemplateData {
    /// Merge `front_matter` with `globals`. A front-matter key named
    /// `globals` is replaced by the global data.
    pub fn new(front_matter: &FrontMatterData, globals: &Arc<Value>) -> Self {
        let mut locals = front_matter.clone();
        locals.insert(GLOBALS_KEY.to_string(), globals.as_ref().clone());
        TemplateData { locals }
    }

    pub fn locals(&self) -> &FrontMatterData {
        &self.locals
    }

    /// The render payload as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.locals.clone())
    }

    /// Argument for computed engine options: `{ locals }`.
    pub fn config_input(&self) -> ConfigInput {
        ConfigInput {
            locals: self.locals.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn front_matter(value: Value) -> FrontMatterData {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn globals_are_added_next_to_front_matter() {
        let data = TemplateData::new(
            &front_matter(json!({"title": "Hi"})),
            &Arc::new(json!({"site": "X"})),
        );
        assert_eq!(data.to_value(), json!({"title": "Hi", "globals": {"site": "X"}}));
    }

    #[test]
    fn front_matter_globals_key_is_shadowed() {
        let data = TemplateData::new(
            &front_matter(json!({"globals": "mine"})),
            &Arc::new(json!({"site": "X"})),
        );
        assert_eq!(data.locals()["globals"], json!({"site": "X"}));
    }

    #[test]
    fn config_input_carries_the_same_locals() {
        let data = TemplateData::new(&FrontMatterData::new(), &Arc::new(json!({})));
        assert_eq!(data.config_input().locals, *data.locals());
    }
}
