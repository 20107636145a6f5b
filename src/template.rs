//! Template renderer – binds a [`CvDocument`] into the handlebars HTML
//! template and its stylesheet template.
//!
//! The built-in templates live in `templates/` and are embedded at compile
//! time. A custom directory may replace them: `cv.html` is required there,
//! `style.css` falls back to the built-in stylesheet.

use std::fs;
use std::path::Path;

use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext};
use serde_json::Value;

use crate::context::build_context;
use crate::data::{scalar_text, CvDocument};
use crate::error::RenderError;

const HTML_TEMPLATE: &str = "cv.html";
const CSS_TEMPLATE: &str = "style.css";

const BUILTIN_HTML: &str = include_str!("../templates/cv.html.hbs");
const BUILTIN_CSS: &str = include_str!("../templates/style.css.hbs");

/// Output of the template stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCv {
    pub html: String,
    pub stylesheet: String,
    /// The person's name, used as the PDF title when present.
    pub title: Option<String>,
}

impl RenderedCv {
    /// The HTML with the stylesheet inlined in a `<style>` element, as a
    /// standalone document for debugging in a browser.
    pub fn standalone_html(&self) -> String {
        let style = format!("<style>\n{}\n</style>\n", self.stylesheet);
        match self.html.find("</head>") {
            Some(pos) => {
                let mut out = String::with_capacity(self.html.len() + style.len());
                out.push_str(&self.html[..pos]);
                out.push_str(&style);
                out.push_str(&self.html[pos..]);
                out
            }
            None => format!("{style}{}", self.html),
        }
    }
}

/// `{{period start end}}` → "start – end", "start – Present" or "end".
fn period_helper(
    h: &Helper,
    r: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let param = |i: usize| h.param(i).and_then(|p| scalar_text(p.value()));
    let text = match (param(0), param(1)) {
        (Some(start), Some(end)) => format!("{start} \u{2013} {end}"),
        (Some(start), None) => format!("{start} \u{2013} Present"),
        (None, Some(end)) => end,
        (None, None) => String::new(),
    };
    out.write(&r.get_escape_fn()(&text))?;
    Ok(())
}

/// `{{join list ", "}}` – scalars in a list joined by the separator. A lone
/// scalar is written as is.
fn join_helper(
    h: &Helper,
    r: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let sep = h
        .param(1)
        .and_then(|p| p.value().as_str())
        .unwrap_or(", ");
    let text = match h.param(0).map(|p| p.value()) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_text)
            .collect::<Vec<_>>()
            .join(sep),
        Some(other) => scalar_text(other).unwrap_or_default(),
        None => String::new(),
    };
    out.write(&r.get_escape_fn()(&text))?;
    Ok(())
}

/// A handlebars registry holding the HTML and stylesheet templates.
pub struct TemplateRenderer {
    engine: Handlebars<'static>,
}

impl TemplateRenderer {
    /// The embedded default templates.
    pub fn builtin() -> Result<Self, RenderError> {
        Self::with_sources(BUILTIN_HTML, BUILTIN_CSS)
    }

    /// Templates from a custom directory: `cv.html` (or `cv.html.hbs`) is
    /// required, `style.css` (or `style.css.hbs`) is optional.
    pub fn from_dir(dir: &Path) -> Result<Self, RenderError> {
        let html_path = [dir.join("cv.html"), dir.join("cv.html.hbs")]
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| RenderError::TemplateNotFound(dir.join("cv.html")))?;
        let html = read_template(&html_path)?;

        let css_path = [dir.join("style.css"), dir.join("style.css.hbs")]
            .into_iter()
            .find(|p| p.is_file());
        let css = match css_path {
            Some(path) => read_template(&path)?,
            None => {
                log::info!(
                    "No stylesheet in '{}', using the built-in one",
                    dir.display()
                );
                BUILTIN_CSS.to_string()
            }
        };
        log::debug!("Loaded template '{}'", html_path.display());
        Self::with_sources(&html, &css)
    }

    fn with_sources(html: &str, css: &str) -> Result<Self, RenderError> {
        let mut engine = Handlebars::new();
        engine.set_strict_mode(false);
        engine.register_helper("period", Box::new(period_helper));
        engine.register_helper("join", Box::new(join_helper));

        for (name, source) in [(HTML_TEMPLATE, html), (CSS_TEMPLATE, css)] {
            engine
                .register_template_string(name, source)
                .map_err(|e| RenderError::Template {
                    name: name.to_string(),
                    source: Box::new(e),
                })?;
        }
        Ok(Self { engine })
    }

    /// Render both templates for one CV.
    pub fn render(&self, doc: &CvDocument) -> Result<RenderedCv, RenderError> {
        let context = build_context(doc, doc.avatar_data_uri());
        let render = |name: &str| {
            self.engine
                .render(name, &context)
                .map_err(|e| RenderError::Render {
                    name: name.to_string(),
                    source: Box::new(e),
                })
        };
        let html = render(HTML_TEMPLATE)?;
        let stylesheet = render(CSS_TEMPLATE)?;
        log::info!(
            "Rendered HTML ({} bytes) and stylesheet ({} bytes)",
            html.len(),
            stylesheet.len()
        );

        Ok(RenderedCv {
            html,
            stylesheet,
            title: context.personal.get("name").and_then(scalar_text),
        })
    }
}

fn read_template(path: &Path) -> Result<String, RenderError> {
    fs::read_to_string(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(yaml: &str) -> RenderedCv {
        let doc = CvDocument::from_yaml_str(yaml, ".").unwrap();
        TemplateRenderer::builtin().unwrap().render(&doc).unwrap()
    }

    #[test]
    fn name_and_sections_are_rendered() {
        let cv = render(
            "personal:\n  name: Jane Doe\n  email: jane@example.com\nexperience:\n  - title: Engineer\n    company: Acme\n    start: 2019\n",
        );
        assert!(cv.html.contains("<h1 class=\"name\">Jane Doe</h1>"));
        assert!(cv.html.contains("jane@example.com"));
        assert!(cv.html.contains("Acme"));
        assert!(cv.html.contains("2019 \u{2013} Present"));
        assert_eq!(cv.title.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn missing_sections_are_omitted() {
        let cv = render("name: Jane Doe\n");
        assert!(!cv.html.contains("Experience"));
        assert!(!cv.html.contains("Education"));
        assert!(!cv.html.contains("class=\"avatar\""));
        assert!(cv.html.contains("Jane Doe"));
    }

    #[test]
    fn empty_document_renders() {
        let cv = render("");
        assert!(cv.html.contains("<title>Curriculum Vitae</title>"));
        assert_eq!(cv.title, None);
    }

    #[test]
    fn user_text_is_escaped() {
        let cv = render("name: \"<b>Jane</b>\"\nskills: [\"C & C++\"]\n");
        assert!(cv.html.contains("&lt;b&gt;Jane&lt;/b&gt;"));
        assert!(cv.html.contains("C &amp; C++"));
    }

    #[test]
    fn style_options_reach_the_stylesheet() {
        let cv = render("style:\n  colors:\n    primary: \"#000000\"\n  spacing:\n    page_padding: 20mm\n");
        assert!(cv.stylesheet.contains("color: #000000"));
        assert!(cv.stylesheet.contains("margin: 20mm"));
        // Untouched keys keep their defaults.
        assert!(cv.stylesheet.contains("width: 35%"));
    }

    #[test]
    fn period_variants() {
        let cv = render(
            "education:\n  - degree: BSc\n    start: 2010\n    end: 2014\n  - degree: MSc\n    end: 2016\n",
        );
        assert!(cv.html.contains("2010 \u{2013} 2014"));
        assert!(cv.html.contains("<p class=\"entry-period\">2016</p>"));
    }

    #[test]
    fn join_accepts_lists_and_scalars() {
        let cv = render("projects:\n  - name: cv-forge\n    technologies: [Rust, taffy]\n  - name: other\n    technologies: Go\n");
        assert!(cv.html.contains("Rust, taffy"));
        assert!(cv.html.contains("<p class=\"entry-meta\">Go</p>"));
    }

    #[test]
    fn standalone_html_inlines_stylesheet() {
        let cv = render("name: Jane\n");
        let page = cv.standalone_html();
        let style_at = page.find("<style>").unwrap();
        assert!(style_at < page.find("</head>").unwrap());
        assert!(page.contains(".sidebar"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let yaml = "personal:\n  name: Jane\nskills:\n  B: [x]\n  A: [y]\n";
        assert_eq!(render(yaml), render(yaml));
    }

    #[test]
    fn custom_dir_requires_html_template() {
        let dir = tempfile::tempdir().unwrap();
        let err = TemplateRenderer::from_dir(dir.path()).err().unwrap();
        assert!(matches!(err, RenderError::TemplateNotFound(_)));
    }

    #[test]
    fn custom_dir_falls_back_to_builtin_stylesheet() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cv.html"), "<p>{{personal.name}}</p>").unwrap();
        let doc = CvDocument::from_yaml_str("name: Jane\n", ".").unwrap();
        let cv = TemplateRenderer::from_dir(dir.path()).unwrap().render(&doc).unwrap();
        assert_eq!(cv.html, "<p>Jane</p>");
        assert!(cv.stylesheet.contains(".sidebar"));
    }

    #[test]
    fn invalid_syntax_is_template_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cv.html"), "{{#if name}}unclosed").unwrap();
        let err = TemplateRenderer::from_dir(dir.path()).err().unwrap();
        assert!(matches!(err, RenderError::Template { .. }));
    }
}
