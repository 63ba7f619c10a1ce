//! Front matter: a `---` fenced YAML block at the head of a template.
//!
//! ```text
//! ---
//! title: Hi
//! ---
//! {{ title }}
//! ```
//!
//! A document without an opening fence, or whose opening fence is never
//! closed, has no front matter and its whole text is the body.

use serde_json::Value;

use crate::error::FrontMatterError;
use crate::types::FrontMatterData;

/// A document split into metadata and template body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub front_matter: FrontMatterData,
    pub body: String,
}

/// Front-matter parse / re-serialize capability.
pub trait FrontMatter: Send + Sync {
    /// Split `source` into front matter and body.
    fn extract(&self, source: &str) -> Result<Extracted, FrontMatterError>;

    /// Normalise rendered output so that a leading front-matter block never
    /// reaches the final artifact.
    fn reserialize_after_render(&self, rendered: &str) -> Result<String, FrontMatterError>;
}

/// Default [`FrontMatter`] implementation backed by `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFrontMatter;

const FENCE: &str = "---";

impl FrontMatter for YamlFrontMatter {
    fn extract(&self, source: &str) -> Result<Extracted, FrontMatterError> {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        let Some((block, body)) = split_fenced(source) else {
            return Ok(Extracted {
                front_matter: FrontMatterData::new(),
                body: source.to_string(),
            });
        };
        Ok(Extracted {
            front_matter: parse_block(block)?,
            body: body.to_string(),
        })
    }

    fn reserialize_after_render(&self, rendered: &str) -> Result<String, FrontMatterError> {
        Ok(self.extract(rendered)?.body)
    }
}

/// Returns `(yaml_block, body)` when `source` opens and closes a fence.
fn split_fenced(source: &str) -> Option<(&str, &str)> {
    let first_line_end = source.find('\n')?;
    if source[..first_line_end].trim_end() != FENCE {
        return None;
    }
    let block_start = first_line_end + 1;

    let mut offset = block_start;
    for line in source[block_start..].split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == FENCE || trimmed == "..." {
            let block = &source[block_start..offset];
            let body = &source[offset + line.len()..];
            return Some((block, body));
        }
        offset += line.len();
    }
    None
}

fn parse_block(block: &str) -> Result<FrontMatterData, FrontMatterError> {
    if block.trim().is_empty() {
        return Ok(FrontMatterData::new());
    }
    match serde_yaml::from_str::<Value>(block)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(FrontMatterData::new()),
        other => Err(FrontMatterError::NotAMapping {
            found: json_kind(&other),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(src: &str) -> Extracted {
        YamlFrontMatter.extract(src).expect("extract")
    }

    #[test]
    fn splits_front_matter_and_body() {
        let out = extract("---\ntitle: Hi\ntags: [a, b]\n---\n{{ title }}\n");
        assert_eq!(out.front_matter.get("title"), Some(&json!("Hi")));
        assert_eq!(out.front_matter.get("tags"), Some(&json!(["a", "b"])));
        assert_eq!(out.body, "{{ title }}\n");
    }

    #[test]
    fn document_without_fence_is_all_body() {
        let out = extract("<p>plain</p>");
        assert!(out.front_matter.is_empty());
        assert_eq!(out.body, "<p>plain</p>");
    }

    #[test]
    fn unclosed_fence_is_not_front_matter() {
        let src = "---\ntitle: Hi\n<p>no closing fence</p>";
        let out = extract(src);
        assert!(out.front_matter.is_empty());
        assert_eq!(out.body, src);
    }

    #[test]
    fn empty_block_yields_empty_mapping() {
        let out = extract("---\n---\nbody");
        assert!(out.front_matter.is_empty());
        assert_eq!(out.body, "body");
    }

    #[test]
    fn crlf_fences_are_recognised() {
        let out = extract("---\r\ntitle: Hi\r\n---\r\nbody");
        assert_eq!(out.front_matter.get("title"), Some(&json!("Hi")));
        assert_eq!(out.body, "body");
    }

    #[test]
    fn sequence_block_is_rejected() {
        let err = YamlFrontMatter.extract("---\n- a\n- b\n---\nbody").unwrap_err();
        assert!(matches!(err, FrontMatterError::NotAMapping { found: "a sequence" }));
    }

    #[test]
    fn reserialize_passes_plain_output_through() {
        let rendered = "Hello\n---\nnot a fence at the start\n";
        assert_eq!(
            YamlFrontMatter.reserialize_after_render(rendered).unwrap(),
            rendered
        );
    }

    #[test]
    fn reserialize_strips_leading_block() {
        let rendered = "---\nlayout: base\n---\n<h1>Hi</h1>";
        assert_eq!(
            YamlFrontMatter.reserialize_after_render(rendered).unwrap(),
            "<h1>Hi</h1>"
        );
    }
}
