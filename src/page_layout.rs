//! Page layout – the intermediate representation between layout computation
//! and PDF rendering. It encodes exactly what goes on each page, in points
//! measured from the top-left corner of the physical page.

use crate::fonts::FontKey;

/// A complete document layout ready for rendering.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    /// Ordered list of pages.
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone, Default)]
pub struct LayoutBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<[f32; 4]>,
    pub border: BorderStyle,

    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,

    /// Children, painted after (above) their parent.
    pub children: Vec<LayoutBox>,
}

/// Per-side borders; `None` sides are not drawn.
#[derive(Debug, Clone, Copy, Default)]
pub struct BorderStyle {
    pub top: Option<BorderEdge>,
    pub right: Option<BorderEdge>,
    pub bottom: Option<BorderEdge>,
    pub left: Option<BorderEdge>,
}

impl BorderStyle {
    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.right.is_none() && self.bottom.is_none() && self.left.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderEdge {
    pub width: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct TextContent {
    /// Pre-wrapped, pre-aligned lines of text.
    pub lines: Vec<TextLine>,
    pub font: FontKey,
    pub font_size: f32,
    pub color: [f32; 4],
    pub line_height: f32,
    pub underline: bool,
}

#[derive(Debug, Clone)]
pub struct TextLine {
    pub text: String,
    /// X offset within the layout box (for alignment and list markers).
    pub x_offset: f32,
    /// Y offset of the line box from the top of the layout box.
    pub y_offset: f32,
    /// Measured width of the line.
    pub width: f32,
}

#[derive(Debug, Clone)]
pub struct ImageContent {
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl LayoutConfig {
    pub fn new(title: impl Into<String>, page_width_pt: f32, page_height_pt: f32) -> Self {
        Self {
            title: title.into(),
            page_width_pt,
            page_height_pt,
            pages: Vec::new(),
        }
    }

    /// Every text line on every page, in paint order.
    pub fn text_lines(&self) -> impl Iterator<Item = &str> + '_ {
        fn walk<'b>(b: &'b LayoutBox, out: &mut Vec<&'b str>) {
            if let Some(text) = &b.text {
                out.extend(text.lines.iter().map(|l| l.text.as_str()));
            }
            for child in &b.children {
                walk(child, out);
            }
        }
        let mut out = Vec::new();
        for page in &self.pages {
            for b in &page.boxes {
                walk(b, &mut out);
            }
        }
        out.into_iter()
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_text_in_paint_order() {
        let line = |t: &str| TextLine {
            text: t.to_string(),
            x_offset: 0.0,
            y_offset: 0.0,
            width: 10.0,
        };
        let text = |lines: Vec<TextLine>| TextContent {
            lines,
            font: FontKey::default(),
            font_size: 10.0,
            color: [0.0, 0.0, 0.0, 1.0],
            line_height: 12.0,
            underline: false,
        };

        let mut parent = LayoutBox::new(0.0, 0.0, 100.0, 50.0);
        parent.text = Some(text(vec![line("a")]));
        let mut child = LayoutBox::new(0.0, 10.0, 100.0, 20.0);
        child.text = Some(text(vec![line("b"), line("c")]));
        parent.children.push(child);

        let mut config = LayoutConfig::new("t", 595.0, 842.0);
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![parent],
        });
        assert_eq!(config.text_lines().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert!(LayoutBox::default().border.is_empty());
    }
}
