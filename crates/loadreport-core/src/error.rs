// Error types for report composition

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for report composition
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur while composing a report
///
/// Both variants are deployment defects (missing or broken template), so
/// callers are expected to propagate them rather than send an empty report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The template file could not be read
    #[error("failed to load report template {path}: {source}")]
    TemplateLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template could not be compiled or rendered
    #[error("failed to render report template: {0}")]
    TemplateRender(#[from] minijinja::Error),
}

impl ReportError {
    /// Create a template load error
    pub fn template_load(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::TemplateLoad {
            path: path.into(),
            source,
        }
    }
}
