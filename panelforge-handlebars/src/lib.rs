//! Implement `panelforge_core::TemplEng` by way of the `handlebars` crate.

use panelforge_core::{Error, TemplEng};

/// Loads every `*.hbs` file under a directory at construction time and
/// renders by template name thereafter.
///
pub struct HbTemplEng(handlebars::Handlebars<'static>);

impl HbTemplEng {
    pub fn new(templ_dir: Option<&str>) -> Result<Self, Error> {
        let mut hb = handlebars::Handlebars::new();
        hb.register_templates_directory(".hbs", templ_dir.unwrap_or("templates"))
            .map_err(|e| Error::other(e.to_string()))?;
        Ok(Self(hb))
    }
}

impl TemplEng for HbTemplEng {
    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String, Error> {
        self.0.render(name, data).map_err(|e| Error::other(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_an_inline_template_by_name() {
        let mut hb = handlebars::Handlebars::new();
        hb.register_template_string("greeting", "hello {{name}}").unwrap();
        let engine = HbTemplEng(hb);
        let out = engine.render("greeting", &serde_json::json!({"name": "world"})).unwrap();
        assert_eq!(out, "hello world");
    }
}
