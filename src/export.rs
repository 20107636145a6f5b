//! PDF exporter – runs the rendered HTML and stylesheet through parsing,
//! styling, layout, pagination and PDF rendering, and writes the result.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::css::{parse_stylesheet, Edges, PageRule, MM_TO_PT};
use crate::dom::{body_element, collect_stylesheets, document_title, parse_html};
use crate::error::ExportError;
use crate::fonts::FontManager;
use crate::layout::compute_layout;
use crate::page_layout::LayoutConfig;
use crate::pagination::{paginate, PageGeometry};
use crate::pdf::render_pdf;
use crate::style::style_document;
use crate::template::RenderedCv;

const DEFAULT_TITLE: &str = "Curriculum Vitae";

/// Page orientation for the generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageOrientation {
    /// Portrait mode: height > width (default).
    #[default]
    Portrait,
    /// Landscape mode: width > height.
    Landscape,
}

/// Page and rendering settings. `@page` rules in the stylesheet override
/// the size and margins; an explicit `landscape` / `portrait` keyword there
/// also overrides `orientation`.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Document title embedded in the PDF metadata. Defaults to the HTML
    /// `<title>`.
    pub title: Option<String>,
    /// Portrait page size in points (default: A4).
    pub page_size: (f32, f32),
    /// Page margins in points (default: 12 mm).
    pub margin: Edges,
    pub orientation: PageOrientation,
    /// Measure text with installed Liberation fonts when available.
    pub system_font_metrics: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            title: None,
            page_size: (595.28, 841.89),
            margin: Edges::uniform(12.0 * MM_TO_PT),
            orientation: PageOrientation::Portrait,
            system_font_metrics: true,
        }
    }
}

impl ExportOptions {
    /// Resolve the page box from the options and the stylesheet's `@page`.
    pub fn page_geometry(&self, rule: &PageRule) -> PageGeometry {
        let (mut width, mut height) = rule.size.unwrap_or(self.page_size);
        let landscape = rule
            .landscape
            .unwrap_or(self.orientation == PageOrientation::Landscape);
        if (landscape && width < height) || (rule.landscape == Some(false) && width > height) {
            std::mem::swap(&mut width, &mut height);
        }
        PageGeometry {
            width,
            height,
            margin: rule.margin.unwrap_or(self.margin),
        }
    }
}

/// A rendered PDF and the page layout it was drawn from.
#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub bytes: Vec<u8>,
    pub layout: LayoutConfig,
}

impl ExportedPdf {
    pub fn page_count(&self) -> usize {
        self.layout.pages.len()
    }
}

/// Lay out an HTML document without rendering it. `stylesheet` is applied
/// before any `<style>` elements in the document.
pub fn compute_document_layout(
    html: &str,
    stylesheet: &str,
    options: &ExportOptions,
) -> Result<LayoutConfig, ExportError> {
    let dom = parse_html(html);

    let mut css = stylesheet.to_string();
    for embedded in collect_stylesheets(&dom) {
        css.push('\n');
        css.push_str(&embedded);
    }
    let sheet = parse_stylesheet(&css);
    let page = options.page_geometry(&sheet.page);

    let title = options
        .title
        .clone()
        .or_else(|| document_title(&dom))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let fonts = if options.system_font_metrics {
        let fonts = FontManager::with_system_metrics();
        if !fonts.has_real_fonts() {
            log::info!("No metric-compatible system fonts found, estimating text widths");
        }
        fonts
    } else {
        FontManager::new()
    };

    let styled = style_document(&body_element(&dom), &sheet);
    let boxes = compute_layout(&styled, page.content_width(), page.margin.left, &fonts)?;
    let layout = paginate(&boxes, &page, &title, &fonts);
    log::info!(
        "Laid out '{}' on {} page(s) of {:.0}x{:.0} pt",
        layout.title,
        layout.pages.len(),
        page.width,
        page.height
    );
    Ok(layout)
}

/// Full conversion: HTML + CSS → PDF bytes.
pub fn html_to_pdf(
    html: &str,
    stylesheet: &str,
    options: &ExportOptions,
) -> Result<ExportedPdf, ExportError> {
    let layout = compute_document_layout(html, stylesheet, options)?;
    let bytes = render_pdf(&layout)?;
    Ok(ExportedPdf { bytes, layout })
}

/// Write `bytes` to `path` through a temporary file in the same directory
/// that is renamed into place. Missing parent directories are created.
/// On failure the destination is left untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|source| ExportError::CreateDir {
        path: parent.clone(),
        source,
    })?;

    let write_err = |source: io::Error| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp = NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    log::debug!("Wrote {} bytes to '{}'", bytes.len(), path.display());
    Ok(())
}

/// Exports rendered CVs to PDF files.
#[derive(Debug, Clone, Default)]
pub struct PdfExporter {
    options: ExportOptions,
}

impl PdfExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Convert `cv` and write the PDF to `path`.
    pub fn export(&self, cv: &RenderedCv, path: &Path) -> Result<ExportedPdf, ExportError> {
        let mut options = self.options.clone();
        if options.title.is_none() && !cv.html.contains("<title") {
            options.title = cv.title.clone();
        }
        let pdf = html_to_pdf(&cv.html, &cv.stylesheet, &options)?;
        write_atomic(path, &pdf.bytes)?;
        log::info!(
            "Exported '{}' ({} bytes, {} page(s))",
            path.display(),
            pdf.bytes.len(),
            pdf.page_count()
        );
        Ok(pdf)
    }
}
