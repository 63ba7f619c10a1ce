//! Nunjucks-style precompiled output.
//!
//! Templates are registered in the browser-side `window.nunjucksPrecompiled`
//! map under their source name when loaded. With `as_function` the script is
//! an immediately invoked wrapper that registers the template and evaluates
//! to a `function(ctx, cb)` rendering the embedded source:
//!
//! ```text
//! (function() {
//!   var src = "...";
//!   (window.nunjucksPrecompiled = window.nunjucksPrecompiled || {})["page.njk"] = { src: src };
//!   return function(ctx, cb) { ... };
//! })();
//! ```

use serde_json::Value;

/// JavaScript string literal for `s`.
fn js_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// Script for a template that compiled.
pub fn script(name: &str, source: &str, as_function: bool) -> String {
    let name = js_string(name);
    let source = js_string(source);
    if as_function {
        format!(
            "(function() {{\n\
             \x20 var src = {source};\n\
             \x20 (window.nunjucksPrecompiled = window.nunjucksPrecompiled || {{}})[{name}] = {{ src: src }};\n\
             \x20 return function(ctx, cb) {{\n\
             \x20   return nunjucks.renderString(src, ctx, cb);\n\
             \x20 }};\n\
             }})();"
        )
    } else {
        format!(
            "(function() {{\n\
             (window.nunjucksPrecompiled = window.nunjucksPrecompiled || {{}})[{name}] = {{ src: {source} }};\n\
             }})();"
        )
    }
}

/// Script for a template that failed to compile under `force`.
pub fn error_script(name: &str, message: &str, as_function: bool) -> String {
    let name = js_string(name);
    let message = js_string(message);
    if as_function {
        format!(
            "(function() {{\n\
             \x20 var err = new Error({message});\n\
             \x20 err.template = {name};\n\
             \x20 return function(ctx, cb) {{\n\
             \x20   if (cb) {{ cb(err); return; }}\n\
             \x20   throw err;\n\
             \x20 }};\n\
             }})();"
        )
    } else {
        format!(
            "(function() {{\n\
             throw new Error({message} + \" (\" + {name} + \")\");\n\
             }})();"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_form_is_an_iife_returning_the_renderer() {
        let out = script("src/page.njk", "<h1>{{ title }}</h1>\n\"q\"", true);
        assert!(out.starts_with("(function() {\n"), "got: {out}");
        assert!(out.ends_with("})();"), "got: {out}");
        assert!(out.contains(r#"var src = "<h1>{{ title }}</h1>\n\"q\"";"#));
        assert!(out.contains(
            r#"(window.nunjucksPrecompiled = window.nunjucksPrecompiled || {})["src/page.njk"] = { src: src };"#
        ));
        assert!(out.contains("return function(ctx, cb) {"));
        assert!(out.contains("return nunjucks.renderString(src, ctx, cb);"));
        assert!(!out.lines().any(|l| l.starts_with("function")));
    }

    #[test]
    fn registration_form_is_an_iife() {
        let out = script("a.njk", "x", false);
        assert!(out.starts_with("(function() {"));
        assert!(out.contains(r#"["a.njk"] = { src: "x" }"#));
        assert!(out.ends_with("})();"));
    }

    #[test]
    fn error_function_form_is_an_iife_reporting_through_callback() {
        let out = error_script("a.njk", "bad tag", true);
        assert!(out.starts_with("(function() {\n"), "got: {out}");
        assert!(out.ends_with("})();"), "got: {out}");
        assert!(out.contains(r#"var err = new Error("bad tag");"#));
        assert!(out.contains(r#"err.template = "a.njk";"#));
        assert!(out.contains("return function(ctx, cb) {"));
        assert!(out.contains("if (cb) { cb(err); return; }"));
    }
}
