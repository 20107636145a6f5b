//! Pagination – splits positioned boxes into pages.
//!
//! Handles:
//! - Page size and per-side margins
//! - Page-break-before / page-break-after hints
//! - `page-break-inside: avoid` blocks, moved whole to the next page
//! - Rows (flex rows, table rows) kept on one page when they fit
//! - Paragraphs broken between lines at the bottom of a page
//! - Backgrounds and borders of containers that span several pages

use crate::css::Edges;
use crate::fonts::{FontManager, FontKey};
use crate::layout::{BoxContent, PositionedBox};
use crate::page_layout::*;
use crate::style::{self, BorderSide, Color};

/// Physical page size and margins, in points.
#[derive(Debug, Clone, Copy)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: Edges,
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        (self.width - self.margin.left - self.margin.right).max(1.0)
    }

    pub fn content_height(&self) -> f32 {
        (self.height - self.margin.top - self.margin.bottom).max(1.0)
    }
}

/// A box placed on a page as a whole.
struct Unit<'a> {
    pbox: &'a PositionedBox,
    break_before: bool,
    break_after: bool,
}

fn is_row(pbox: &PositionedBox) -> bool {
    match pbox.style.display {
        style::Display::TableRow => true,
        style::Display::Flex => pbox.style.flex_direction == style::FlexDirection::Row,
        _ => false,
    }
}

/// Whether a container is broken up so its children paginate individually.
/// Anything taller than a page must be; otherwise only plain wrappers are.
fn should_split(pbox: &PositionedBox, content_height: f32) -> bool {
    if pbox.children.is_empty()
        || matches!(pbox.content, BoxContent::Text { .. } | BoxContent::Image { .. })
    {
        return false;
    }
    if pbox.height > content_height {
        return true;
    }
    matches!(pbox.content, BoxContent::None)
        && !pbox.is_decorated()
        && !pbox.page_break_inside_avoid
        && !is_row(pbox)
}

/// Collect pagination units in document order. Split containers that paint
/// something are returned as backdrops, drawn behind the units on every page
/// they cover.
fn flatten<'a>(
    boxes: &'a [PositionedBox],
    content_height: f32,
    units: &mut Vec<Unit<'a>>,
    backdrops: &mut Vec<&'a PositionedBox>,
) {
    for pbox in boxes {
        if !should_split(pbox, content_height) {
            units.push(Unit {
                pbox,
                break_before: pbox.page_break_before,
                break_after: pbox.page_break_after,
            });
            continue;
        }

        if pbox.is_decorated() || matches!(pbox.content, BoxContent::ListItem { .. }) {
            backdrops.push(pbox);
        }
        let first = units.len();
        flatten(&pbox.children, content_height, units, backdrops);
        if units.len() > first {
            units[first].break_before |= pbox.page_break_before;
            if let Some(last) = units.last_mut() {
                last.break_after |= pbox.page_break_after;
            }
        }
    }
}

/// Fewest lines of a paragraph left at the bottom of a page.
const MIN_LINES_BEFORE_BREAK: usize = 2;

/// Pages filled so far and the document-space y at which each begins.
struct Pager {
    pages: Vec<Vec<LayoutBox>>,
    page_starts: Vec<f32>,
    pending_break: bool,
    content_height: f32,
}

impl Pager {
    fn new(content_height: f32) -> Self {
        Self {
            pages: vec![Vec::new()],
            page_starts: vec![0.0],
            pending_break: false,
            content_height,
        }
    }

    fn start(&self) -> f32 {
        self.page_starts.last().copied().unwrap_or(0.0)
    }

    fn current_empty(&self) -> bool {
        self.pages.last().map_or(true, |p| p.is_empty())
    }

    fn new_page(&mut self, start: f32) {
        self.pages.push(Vec::new());
        self.page_starts.push(start);
    }

    /// Open a new page when a box at `y` must or cannot go on the current
    /// one. Returns the box's offset from the top of the page.
    fn position(&mut self, y: f32, height: f32, break_before: bool) -> f32 {
        let start = self.start();
        let overflows = y - start + height > self.content_height;
        if !self.current_empty() && (self.pending_break || break_before || overflows) {
            self.new_page(if self.pending_break { start.max(y) } else { y });
        }
        self.pending_break = false;
        (y - self.start()).max(0.0)
    }

    fn push(&mut self, lb: LayoutBox) {
        if let Some(current) = self.pages.last_mut() {
            current.push(lb);
        }
    }
}

/// Place a text leaf, breaking it between lines where it crosses the page
/// bottom.
fn place_text(pager: &mut Pager, unit: &Unit<'_>, margin_top: f32, fonts: &FontManager) {
    let pbox = unit.pbox;
    let BoxContent::Text { lines, .. } = &pbox.content else {
        return;
    };
    let line_height = fonts
        .line_height_pt(pbox.style.font_size, pbox.style.line_height)
        .max(0.01);

    let mut first = 0;
    let mut break_before = unit.break_before;
    while first < lines.len() {
        let y = pbox.y + first as f32 * line_height;
        let remaining = lines.len() - first;

        if !pager.current_empty() && (pager.pending_break || break_before) {
            let start = pager.start();
            pager.new_page(if pager.pending_break { start.max(y) } else { y });
        }
        pager.pending_break = false;
        break_before = false;

        let fit = |pager: &Pager| {
            let room = pager.start() + pager.content_height - y;
            ((room / line_height) + 0.001).floor().max(0.0) as usize
        };
        let mut take = fit(&*pager);
        if take < remaining && take < MIN_LINES_BEFORE_BREAK && !pager.current_empty() {
            pager.new_page(y);
            take = fit(&*pager);
        }
        let take = take.clamp(1, remaining);

        let end = first + take;
        let height = if end == lines.len() {
            pbox.bottom() - y
        } else {
            take as f32 * line_height
        };
        let y_on_page = (y - pager.start()).max(0.0);
        let mut lb = build_layout_box(pbox, margin_top + y_on_page, fonts);
        lb.height = height;
        if let Some(text) = lb.text.as_mut() {
            text.lines.drain(end..);
            text.lines.drain(..first);
            for line in &mut text.lines {
                line.y_offset -= first as f32 * line_height;
            }
        }
        pager.push(lb);
        first = end;
    }
    pager.pending_break = unit.break_after;
}

/// Convert positioned boxes into a paginated [`LayoutConfig`].
pub fn paginate(
    boxes: &[PositionedBox],
    page: &PageGeometry,
    title: &str,
    fonts: &FontManager,
) -> LayoutConfig {
    let mut config = LayoutConfig::new(title, page.width, page.height);
    let content_height = page.content_height();

    let mut units = Vec::new();
    let mut backdrops = Vec::new();
    flatten(boxes, content_height, &mut units, &mut backdrops);
    // Columns laid side by side interleave by their top edge.
    units.sort_by(|a, b| a.pbox.y.total_cmp(&b.pbox.y));

    let mut pager = Pager::new(content_height);
    for unit in &units {
        let pbox = unit.pbox;
        if let BoxContent::Text { lines, .. } = &pbox.content {
            if lines.len() > 1 {
                place_text(&mut pager, unit, page.margin.top, fonts);
                continue;
            }
        }

        let y_on_page = pager.position(pbox.y, pbox.height, unit.break_before);
        pager.push(build_layout_box(pbox, page.margin.top + y_on_page, fonts));
        pager.pending_break = unit.break_after;
    }
    let Pager {
        pages, page_starts, ..
    } = pager;

    for (index, boxes) in pages.into_iter().enumerate() {
        config.pages.push(PageLayout {
            page_index: index,
            boxes,
        });
    }

    // Backdrops go underneath, outermost first.
    for (index, page_layout) in config.pages.iter_mut().enumerate() {
        let top = page_starts[index];
        let mut boxes: Vec<LayoutBox> = backdrops
            .iter()
            .filter_map(|b| backdrop_slice(b, top, top + content_height, page.margin.top, fonts))
            .collect();
        boxes.append(&mut page_layout.boxes);
        page_layout.boxes = boxes;
    }

    log::debug!(
        "Paginated {} units onto {} page(s)",
        units.len(),
        config.pages.len()
    );
    config
}

/// The part of a split container visible between `top` and `bottom`
/// (document coordinates), without its children.
fn backdrop_slice(
    pbox: &PositionedBox,
    top: f32,
    bottom: f32,
    margin_top: f32,
    fonts: &FontManager,
) -> Option<LayoutBox> {
    let visible_top = pbox.y.max(top);
    let visible_bottom = pbox.bottom().min(bottom);
    if visible_bottom <= visible_top {
        return None;
    }

    let mut lb = LayoutBox::new(
        pbox.x,
        margin_top + visible_top - top,
        pbox.width,
        visible_bottom - visible_top,
    );
    lb.background_color = paint_color(pbox.style.background_color);

    let starts_here = pbox.y >= top;
    let ends_here = pbox.bottom() <= bottom;
    lb.border = BorderStyle {
        top: edge(pbox.style.border_top).filter(|_| starts_here),
        right: edge(pbox.style.border_right),
        bottom: edge(pbox.style.border_bottom).filter(|_| ends_here),
        left: edge(pbox.style.border_left),
    };

    if let (BoxContent::ListItem { marker }, true) = (&pbox.content, starts_here) {
        lb.text = Some(marker_text(marker, &pbox.style, fonts));
    }
    Some(lb)
}

fn paint_color(c: Color) -> Option<[f32; 4]> {
    (!c.is_transparent()).then_some([c.r, c.g, c.b, c.a])
}

fn edge(side: BorderSide) -> Option<BorderEdge> {
    side.is_visible().then_some(BorderEdge {
        width: side.width,
        color: [side.color.r, side.color.g, side.color.b, side.color.a],
    })
}

fn text_content(style: &style::ComputedStyle, lines: Vec<TextLine>, fonts: &FontManager) -> TextContent {
    let c = style.color;
    TextContent {
        lines,
        font: style.font_key(),
        font_size: style.font_size,
        color: [c.r, c.g, c.b, c.a],
        line_height: fonts.line_height_pt(style.font_size, style.line_height),
        underline: style.text_decoration == style::TextDecoration::Underline,
    }
}

/// The list marker sits in the gutter left of the item's first line.
fn marker_text(marker: &str, style: &style::ComputedStyle, fonts: &FontManager) -> TextContent {
    let key = FontKey::new(style.font_family, false, false);
    let width = fonts.measure_text_width(marker, style.font_size, key);
    let gap = style.font_size * 0.5;
    let line = TextLine {
        text: marker.to_string(),
        x_offset: -(width + gap),
        y_offset: style.padding.top + style.border_top.width,
        width,
    };
    let mut content = text_content(style, vec![line], fonts);
    content.font = key;
    content.underline = false;
    content
}

/// Build a LayoutBox tree with page-absolute coordinates. Children keep
/// their offset from the parent (`child.y - parent.y`).
fn build_layout_box(pbox: &PositionedBox, abs_y: f32, fonts: &FontManager) -> LayoutBox {
    let mut lb = LayoutBox::new(pbox.x, abs_y, pbox.width, pbox.height);
    lb.background_color = paint_color(pbox.style.background_color);
    lb.border = BorderStyle {
        top: edge(pbox.style.border_top),
        right: edge(pbox.style.border_right),
        bottom: edge(pbox.style.border_bottom),
        left: edge(pbox.style.border_left),
    };

    match &pbox.content {
        BoxContent::Text { lines, widths } => {
            let line_height = fonts.line_height_pt(pbox.style.font_size, pbox.style.line_height);
            let text_lines = lines
                .iter()
                .zip(widths)
                .enumerate()
                .map(|(i, (line, &width))| TextLine {
                    text: line.clone(),
                    x_offset: match pbox.style.text_align {
                        style::TextAlign::Left => 0.0,
                        style::TextAlign::Center => ((pbox.width - width) / 2.0).max(0.0),
                        style::TextAlign::Right => (pbox.width - width).max(0.0),
                    },
                    y_offset: i as f32 * line_height,
                    width,
                })
                .collect();
            lb.text = Some(text_content(&pbox.style, text_lines, fonts));
        }
        BoxContent::Image { src } => {
            lb.image = Some(ImageContent {
                src: src.clone(),
                width: pbox.width,
                height: pbox.height,
            });
        }
        BoxContent::ListItem { marker } => {
            lb.text = Some(marker_text(marker, &pbox.style, fonts));
        }
        BoxContent::None => {}
    }

    for child in &pbox.children {
        lb.children
            .push(build_layout_box(child, abs_y + (child.y - pbox.y), fonts));
    }
    lb
}
