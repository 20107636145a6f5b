//! Error types for the three generation stages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for cv-forge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure while generating a CV. Every variant is terminal.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// The input YAML file could not be loaded.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The input path does not exist.
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The input exists but could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input is not parseable YAML.
    #[error("invalid YAML in '{}': {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The top-level YAML value is a scalar or a sequence.
    #[error("'{}' must contain a mapping at the top level", .0.display())]
    NotAMapping(PathBuf),
}

/// Template loading or substitution failed.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A custom template directory lacks the HTML template.
    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// A template file exists but could not be read.
    #[error("failed to read template '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A template has invalid handlebars syntax.
    #[error("invalid template '{name}': {source}")]
    Template {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    /// Substitution failed (helper error, unknown partial).
    #[error("failed to render '{name}': {source}")]
    Render {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
}

/// The rendered HTML could not be turned into a PDF file.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Box layout failed.
    #[error("layout failed: {0}")]
    Layout(String),

    /// The PDF writer rejected the document.
    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    /// The output directory could not be created.
    #[error("cannot create output directory '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The output file could not be written.
    #[error("cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<taffy::TaffyError> for ExportError {
    fn from(err: taffy::TaffyError) -> Self {
        ExportError::Layout(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_display() {
        let err = LoadError::NotFound(PathBuf::from("missing.yaml"));
        assert_eq!(err.to_string(), "input file not found: missing.yaml");
    }

    #[test]
    fn stage_errors_convert_into_error() {
        let err: Error = LoadError::NotAMapping(PathBuf::from("cv.yaml")).into();
        assert!(matches!(err, Error::Load(_)));

        let err: Error = ExportError::Pdf("boom".to_string()).into();
        assert!(matches!(err, Error::Export(_)));
        assert_eq!(err.to_string(), "PDF rendering failed: boom");
    }

    #[test]
    fn io_source_is_preserved() {
        use std::error::Error as _;
        let err = ExportError::Write {
            path: PathBuf::from("out/cv.pdf"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("out/cv.pdf"));
    }
}
