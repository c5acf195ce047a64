//! Template rendering
//!
//! Templates are tera templates embedded in the binary. A file with the same
//! relative name under `<app home>/templates/` replaces the embedded one.

mod embedded;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tera::{Context, Tera};
use walkdir::WalkDir;

use crate::common::fs::write_atomic;
use crate::error::{Result, fs as fs_error, template as template_error};
use crate::prompt::Confirmer;

/// Variables available to a render, assembled right before it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext(BTreeMap<String, Value>);

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values are JSON already, so inserting cannot fail
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn to_tera(&self) -> Context {
        let mut context = Context::new();
        for (key, value) in &self.0 {
            context.insert(key.as_str(), value);
        }
        context
    }
}

pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Only the embedded templates
    pub fn embedded() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        for (name, content) in embedded::ALL_TEMPLATES {
            tera.add_raw_template(name, content)
                .map_err(|e| template_error::render_failed(*name, &e))?;
        }
        Ok(Self { tera })
    }

    /// Embedded templates, overridden by files under `dir` (if it exists)
    pub fn with_overrides(dir: &Path) -> Result<Self> {
        let mut renderer = Self::embedded()?;
        if !dir.is_dir() {
            return Ok(renderer);
        }

        for entry in WalkDir::new(dir).follow_links(true) {
            let entry = entry.map_err(|e| fs_error::io_error(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(dir) else {
                continue;
            };
            let name = relative.to_string_lossy().replace('\\', "/");
            let content = fs::read_to_string(entry.path())
                .map_err(|e| fs_error::read_failed(entry.path(), e))?;

            renderer
                .tera
                .add_raw_template(&name, &content)
                .map_err(|e| template_error::render_failed(&name, &e))?;
            tracing::debug!("Template {name} overridden from {}", entry.path().display());
        }

        Ok(renderer)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|known| known == name)
    }

    /// Render `names` in order and concatenate the output
    ///
    /// Every name is looked up before anything is rendered, so an unknown
    /// name never yields partial output.
    pub fn render(&self, names: &[String], context: &TemplateContext) -> Result<Vec<u8>> {
        if let Some(missing) = names.iter().find(|name| !self.has_template(name)) {
            return Err(template_error::not_found(missing.as_str()));
        }

        let context = context.to_tera();
        let mut output = Vec::new();
        for name in names {
            let rendered = self
                .tera
                .render(name, &context)
                .map_err(|e| template_error::render_failed(name.as_str(), &e))?;
            output.extend_from_slice(rendered.as_bytes());
        }
        Ok(output)
    }
}

/// Write `bytes` to `path` unless it exists and the operator declines to
/// recreate it. Returns whether the file was written.
pub fn write_if_absent(path: &Path, bytes: &[u8], confirmer: &dyn Confirmer) -> Result<bool> {
    if path.exists() {
        let prompt = format!(
            "File {} already exists. Would you like to recreate it?",
            path.display()
        );
        if !confirmer.confirm(&prompt, false)? {
            tracing::debug!("Keeping existing {}", path.display());
            return Ok(false);
        }
    }

    write_atomic(path, bytes, None)?;
    tracing::debug!("Wrote {}", path.display());
    Ok(true)
}
