//! Pipeline – ties together data loading, template rendering and PDF export
//! into a single function call.

use std::path::{Path, PathBuf};

use crate::data::load_cv_data;
use crate::error::Result;
use crate::export::{write_atomic, ExportOptions, PdfExporter};
use crate::template::{RenderedCv, TemplateRenderer};

/// Configuration for a CV generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Directory with custom templates instead of the built-in ones.
    pub template_dir: Option<PathBuf>,
    /// Where to also write the rendered HTML, stylesheet inlined.
    pub html_output: Option<PathBuf>,
    pub export: ExportOptions,
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub output: PathBuf,
    pub pages: usize,
    pub bytes: usize,
}

/// Load a CV and render its templates, without producing a PDF.
pub fn render_cv(input: &Path, template_dir: Option<&Path>) -> Result<RenderedCv> {
    let doc = load_cv_data(input)?;
    let renderer = match template_dir {
        Some(dir) => TemplateRenderer::from_dir(dir)?,
        None => TemplateRenderer::builtin()?,
    };
    Ok(renderer.render(&doc)?)
}

/// Full pipeline: YAML file → PDF file.
pub fn generate_cv(input: &Path, output: &Path, options: &GenerateOptions) -> Result<GenerationReport> {
    log::info!("Generating CV from '{}'", input.display());
    let cv = render_cv(input, options.template_dir.as_deref())?;

    if let Some(html_path) = &options.html_output {
        write_atomic(html_path, cv.standalone_html().as_bytes())?;
        log::info!("Wrote HTML to '{}'", html_path.display());
    }

    let pdf = PdfExporter::new(options.export.clone()).export(&cv, output)?;
    Ok(GenerationReport {
        output: output.to_path_buf(),
        pages: pdf.page_count(),
        bytes: pdf.bytes.len(),
    })
}
