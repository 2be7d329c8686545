//! The template capability: a handful of built-in panels render through a
//! host-supplied engine rather than hand-built HTML, so a deployment can
//! swap Handlebars for Tera or anything else without touching the
//! generated-table logic.
//!
use crate::Error;
use serde::Serialize;
use std::sync::Arc;

/// A named template plus the data to fill it with. The core ships no
/// templates of its own -- `name` is whatever the host application's engine
/// was loaded with.
///
pub trait TemplEng: Send + Sync {
    /// Render the template named `name` with `data`, already converted to
    /// `serde_json::Value` by the caller (see [`TemplEngIf::render()`
    /// ](struct.TemplEngIf.html#method.render)) so the trait stays
    /// object-safe.
    ///
    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String, Error>;
}

/// A cloneable handle to a [`TemplEng`](trait.TemplEng.html) implementation.
///
#[derive(Clone)]
pub struct TemplEngIf(Arc<dyn TemplEng>);

impl TemplEngIf {
    pub fn new(engine: Arc<dyn TemplEng>) -> Self {
        Self(engine)
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, Error> {
        let value = serde_json::to_value(data)
            .map_err(|e| Error::parameter_invalid(e.to_string()))?;
        self.0.render(name, &value)
    }
}

/// A minimal string-substitution fallback, for panels the core must be able
/// to render with no template engine configured at all (e.g. a bare error
/// page at boot before `Engine::use_host()` has wired one in). Not meant to
/// compete with a real templating engine: each `{{name}}` placeholder is
/// replaced verbatim, with no escaping, loops, or conditionals.
///
pub fn render_minimal(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in values {
        out = out.replace(&format!("{{{{{}}}}}", name), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_minimal_substitutes_named_placeholders() {
        let out = render_minimal(
            "<h1>{{title}}</h1><p>{{body}}</p>",
            &[("title", "Oops"), ("body", "not found")],
        );
        assert_eq!(out, "<h1>Oops</h1><p>not found</p>");
    }

    #[test]
    fn render_minimal_leaves_unknown_placeholders_untouched() {
        let out = render_minimal("{{known}} {{unknown}}", &[("known", "x")]);
        assert_eq!(out, "x {{unknown}}");
    }
}
