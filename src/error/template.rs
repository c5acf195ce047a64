//! Template errors

use super::BerthError;

/// Creates a template not found error
pub fn not_found(name: impl Into<String>) -> BerthError {
    BerthError::TemplateNotFound { name: name.into() }
}

/// Creates a template render error, flattening tera's error chain into the reason
pub fn render_failed(name: impl Into<String>, err: &tera::Error) -> BerthError {
    let mut reason = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        reason.push_str(": ");
        reason.push_str(&inner.to_string());
        source = inner.source();
    }
    BerthError::TemplateRenderFailed {
        name: name.into(),
        reason,
    }
}

impl From<tera::Error> for BerthError {
    fn from(err: tera::Error) -> Self {
        render_failed("unknown", &err)
    }
}
