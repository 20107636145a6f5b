//! # cv-forge – YAML → HTML → PDF curriculum vitae generator
//!
//! The pipeline stages are:
//!
//! 1. **Load** – YAML file → [`CvDocument`] ([`data`])
//! 2. **Render** – handlebars HTML and stylesheet templates ([`template`],
//!    [`context`], [`theme`])
//! 3. **Parse** – HTML string → DOM tree, CSS → rules ([`dom`], [`css`])
//! 4. **Style** – cascade and inheritance ([`style`])
//! 5. **Layout** – flexbox layout with Taffy ([`layout`])
//! 6. **Paginate** – split into pages ([`pagination`], [`page_layout`])
//! 7. **Render** – emit PDF bytes via printpdf ([`pdf`], [`export`])
//!
//! [`generate_cv`] runs all of them.

pub mod context;
pub mod css;
pub mod data;
pub mod dom;
pub mod error;
pub mod export;
pub mod fonts;
pub mod layout;
pub mod page_layout;
pub mod pagination;
pub mod pdf;
pub mod pipeline;
pub mod style;
pub mod template;
pub mod theme;

// Re-exports for convenience
pub use data::{load_cv_data, CvDocument};
pub use error::{Error, ExportError, LoadError, RenderError, Result};
pub use export::{html_to_pdf, ExportOptions, ExportedPdf, PageOrientation, PdfExporter};
pub use pipeline::{generate_cv, render_cv, GenerateOptions, GenerationReport};
pub use template::{RenderedCv, TemplateRenderer};
pub use theme::StyleOptions;
