//! Layout engine – uses Taffy to compute flexbox layout from a styled DOM
//! tree, then converts the result into a tree of positioned boxes.
//!
//! Text is wrapped while the Taffy tree is built, so every block needs an
//! estimate of its content width up front. Runs of inline content are merged
//! into one text leaf per run; inline formatting inside a run is not kept.

use std::collections::HashMap;

use taffy::prelude::*;
use taffy::TaffyError;

use crate::css::PX_TO_PT;
use crate::dom::Tag;
use crate::fonts::{wrap_text, FontManager};
use crate::style::{self, ComputedStyle, StyledNode};

// ---------------------------------------------------------------------------
// Intermediate layout tree (pre-pagination)
// ---------------------------------------------------------------------------

/// A positioned box in document coordinates (before page splitting).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
}

impl PositionedBox {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// True when the box paints something of its own.
    pub fn is_decorated(&self) -> bool {
        !self.style.background_color.is_transparent() || self.style.has_border()
    }
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    /// Wrapped lines and their measured widths.
    Text {
        lines: Vec<String>,
        widths: Vec<f32>,
    },
    Image {
        src: String,
    },
    /// List item marker
    ListItem {
        marker: String,
    },
}

// ---------------------------------------------------------------------------
// Build Taffy tree from styled nodes
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
}

/// Inline content is merged into text; block children get their own boxes.
fn is_inline(node: &StyledNode) -> bool {
    match node {
        StyledNode::Text { .. } => true,
        StyledNode::Element {
            tag,
            style,
            children,
            ..
        } => style.display == style::Display::Inline && *tag != Tag::Img && children.iter().all(is_inline),
    }
}

fn is_blank(node: &StyledNode) -> bool {
    matches!(node, StyledNode::Text { text, .. } if text.trim().is_empty())
}

/// Flatten an inline subtree to text. `<br>` becomes a hard line break;
/// every other whitespace character is a plain space.
fn collect_inline_text(node: &StyledNode, out: &mut String) {
    match node {
        StyledNode::Text { text, style } => {
            out.push_str(&style.transform_text(&text.replace(char::is_whitespace, " ")));
        }
        StyledNode::Element { tag: Tag::Br, .. } => out.push('\n'),
        StyledNode::Element { children, .. } => {
            for child in children {
                collect_inline_text(child, out);
            }
        }
    }
}

/// Collapse whitespace within each line; trailing breaks are dropped.
fn normalize_inline(raw: &str) -> String {
    raw.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end_matches('\n')
        .to_string()
}

/// Style used to draw a merged run: a sole inline element wrapping the whole
/// run lends its typography, otherwise the enclosing block's is used.
fn run_style(run: &[&StyledNode], block: &ComputedStyle) -> ComputedStyle {
    let significant: Vec<&StyledNode> = run.iter().copied().filter(|n| !is_blank(n)).collect();
    match significant.as_slice() {
        [single @ StyledNode::Element { .. }] => single.style().for_text(),
        _ => block.for_text(),
    }
}

fn is_row(style: &ComputedStyle) -> bool {
    match style.display {
        style::Display::TableRow => true,
        style::Display::Flex => style.flex_direction == style::FlexDirection::Row,
        _ => false,
    }
}

/// Width an element occupies inside `containing`, before its own padding.
fn outer_to_own_width(style: &ComputedStyle, containing: f32) -> f32 {
    style
        .width
        .resolve(containing)
        .unwrap_or(containing - style.margin.left - style.margin.right)
        .max(0.0)
}

fn content_width(style: &ComputedStyle, own_width: f32) -> f32 {
    let border = style.border_widths();
    (own_width - style.padding.left - style.padding.right - border.left - border.right).max(0.0)
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
        }
    }

    fn build_element(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        attrs: &HashMap<String, String>,
        containing_width: f32,
    ) -> Result<NodeId, TaffyError> {
        if *tag == Tag::Img {
            return self.build_image(style, attrs, containing_width);
        }

        let inner_width = content_width(style, outer_to_own_width(style, containing_width));
        let child_nodes = if is_row(style) {
            self.build_row_children(style, children, inner_width)?
        } else {
            self.build_flow_children(tag, style, children, inner_width)?
        };

        let node = self
            .taffy
            .new_with_children(computed_to_taffy(style), &child_nodes)?;
        self.node_styles.insert(node, style.clone());
        Ok(node)
    }

    /// Children of a vertically stacking box. Consecutive inline nodes form
    /// one anonymous text leaf.
    fn build_flow_children(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        inner_width: f32,
    ) -> Result<Vec<NodeId>, TaffyError> {
        let mut nodes = Vec::new();
        let mut run: Vec<&StyledNode> = Vec::new();
        let mut list_counter = 0u32;

        for child in children {
            match child {
                StyledNode::Element {
                    tag: child_tag,
                    style: child_style,
                    children: grandchildren,
                    attrs,
                } if !is_inline(child) => {
                    self.flush_run(&mut run, style, inner_width, &mut nodes)?;

                    let marker = (child_style.display == style::Display::ListItem).then(|| {
                        list_counter += 1;
                        if *tag == Tag::Ol {
                            format!("{list_counter}.")
                        } else {
                            "\u{2022}".to_string()
                        }
                    });

                    let id =
                        self.build_element(child_tag, child_style, grandchildren, attrs, inner_width)?;
                    if let Some(marker) = marker.filter(|_| !child_style.list_style_none) {
                        self.node_content.insert(id, BoxContent::ListItem { marker });
                    }
                    nodes.push(id);
                }
                _ => run.push(child),
            }
        }
        self.flush_run(&mut run, style, inner_width, &mut nodes)?;
        Ok(nodes)
    }

    /// Children of a flex row or table row. Each element is an item; the
    /// width left after fixed-width items is shared by the others.
    fn build_row_children(
        &mut self,
        style: &ComputedStyle,
        children: &[StyledNode],
        inner_width: f32,
    ) -> Result<Vec<NodeId>, TaffyError> {
        enum Item<'n> {
            Element(&'n StyledNode),
            Run(Vec<&'n StyledNode>),
        }

        let mut items: Vec<Item> = Vec::new();
        for child in children {
            match child {
                StyledNode::Element { .. } => items.push(Item::Element(child)),
                StyledNode::Text { .. } => match items.last_mut() {
                    Some(Item::Run(run)) => run.push(child),
                    _ => items.push(Item::Run(vec![child])),
                },
            }
        }
        items.retain(|item| match item {
            Item::Run(run) => !run.iter().all(|n| is_blank(n)),
            Item::Element(_) => true,
        });

        let mut fixed = 0.0f32;
        let mut auto_count = 0usize;
        for item in &items {
            match item {
                Item::Element(node) => {
                    let s = node.style();
                    match s.width.resolve(inner_width) {
                        Some(w) => fixed += w + s.margin.left + s.margin.right,
                        None => {
                            fixed += s.margin.left + s.margin.right;
                            auto_count += 1;
                        }
                    }
                }
                Item::Run(_) => auto_count += 1,
            }
        }
        let gaps = style.column_gap * items.len().saturating_sub(1) as f32;
        let share = ((inner_width - fixed - gaps) / auto_count.max(1) as f32).max(1.0);

        let mut nodes = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Item::Element(node) => {
                    let StyledNode::Element {
                        tag,
                        style: child_style,
                        children: grandchildren,
                        attrs,
                    } = node
                    else {
                        continue;
                    };
                    // Percentages resolve against the row; auto items get
                    // their share plus the margins they subtract again.
                    let containing = if child_style.width.resolve(inner_width).is_some() {
                        inner_width
                    } else {
                        share + child_style.margin.left + child_style.margin.right
                    };
                    nodes.push(self.build_element(tag, child_style, grandchildren, attrs, containing)?);
                }
                Item::Run(mut run) => self.flush_run(&mut run, style, share, &mut nodes)?,
            }
        }
        Ok(nodes)
    }

    fn flush_run(
        &mut self,
        run: &mut Vec<&StyledNode>,
        block: &ComputedStyle,
        width: f32,
        nodes: &mut Vec<NodeId>,
    ) -> Result<(), TaffyError> {
        if run.is_empty() {
            return Ok(());
        }
        let mut raw = String::new();
        for node in run.iter() {
            collect_inline_text(node, &mut raw);
        }
        let text_style = run_style(run, block);
        run.clear();

        let text = normalize_inline(&raw);
        if text.trim().is_empty() {
            return Ok(());
        }
        nodes.push(self.build_text_leaf(&text, &text_style, width)?);
        Ok(())
    }

    /// A leaf holding wrapped text. Its height is fixed by the line count;
    /// its width stretches with the parent but never below the widest line.
    fn build_text_leaf(
        &mut self,
        text: &str,
        style: &ComputedStyle,
        max_width: f32,
    ) -> Result<NodeId, TaffyError> {
        let key = style.font_key();
        let lines = wrap_text(text, style.font_size, key, max_width, self.fonts);
        let widths: Vec<f32> = lines
            .iter()
            .map(|l| self.fonts.measure_text_width(l, style.font_size, key))
            .collect();
        let text_width = widths.iter().copied().fold(0.0f32, f32::max);
        let line_height = self.fonts.line_height_pt(style.font_size, style.line_height);

        let taffy_style = Style {
            size: Size {
                width: Dimension::Auto,
                height: Dimension::Length(lines.len() as f32 * line_height),
            },
            min_size: Size {
                width: Dimension::Length(text_width),
                height: Dimension::Auto,
            },
            flex_shrink: 0.0,
            ..Default::default()
        };

        let node = self.taffy.new_leaf(taffy_style)?;
        self.node_styles.insert(node, style.clone());
        self.node_content
            .insert(node, BoxContent::Text { lines, widths });
        Ok(node)
    }

    fn build_image(
        &mut self,
        style: &ComputedStyle,
        attrs: &HashMap<String, String>,
        containing_width: f32,
    ) -> Result<NodeId, TaffyError> {
        let src = attrs.get("src").cloned().unwrap_or_default();
        let resolved = resolve_img_dimensions(&src, style, containing_width);
        let effective = resolved.as_ref().unwrap_or(style);

        let node = self.taffy.new_leaf(computed_to_taffy(effective))?;
        self.node_styles.insert(node, effective.clone());
        self.node_content.insert(node, BoxContent::Image { src });
        Ok(node)
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<PositionedBox, TaffyError> {
        let layout = self.taffy.layout(node)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;
        let (width, height) = (layout.size.width, layout.size.height);

        let children = self
            .taffy
            .children(node)?
            .into_iter()
            .map(|child| self.extract(child, x, y))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PositionedBox {
            x,
            y,
            width,
            height,
            page_break_before: style.page_break_before,
            page_break_after: style.page_break_after,
            page_break_inside_avoid: style.page_break_inside_avoid,
            style,
            content,
            children,
        })
    }
}

fn computed_to_taffy(s: &ComputedStyle) -> Style {
    let mut ts = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        ..Default::default()
    };

    match s.display {
        style::Display::Flex => {
            ts.flex_direction = match s.flex_direction {
                style::FlexDirection::Row => taffy::FlexDirection::Row,
                style::FlexDirection::Column => taffy::FlexDirection::Column,
            };
            ts.flex_wrap = match s.flex_wrap {
                style::FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
                style::FlexWrap::Wrap => taffy::FlexWrap::Wrap,
            };
            ts.justify_content = Some(match s.justify_content {
                style::JustifyContent::Start => taffy::JustifyContent::Start,
                style::JustifyContent::End => taffy::JustifyContent::End,
                style::JustifyContent::Center => taffy::JustifyContent::Center,
                style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
                style::JustifyContent::SpaceAround => taffy::JustifyContent::SpaceAround,
                style::JustifyContent::SpaceEvenly => taffy::JustifyContent::SpaceEvenly,
            });
            ts.align_items = Some(match s.align_items {
                style::AlignItems::Start => taffy::AlignItems::Start,
                style::AlignItems::End => taffy::AlignItems::End,
                style::AlignItems::Center => taffy::AlignItems::Center,
                style::AlignItems::Stretch => taffy::AlignItems::Stretch,
            });
        }
        // HTML table model: rows are flex rows of equally sized cells.
        style::Display::TableRow => {
            ts.flex_direction = taffy::FlexDirection::Row;
            ts.align_items = Some(taffy::AlignItems::Stretch);
        }
        style::Display::None => ts.display = taffy::Display::None,
        style::Display::Block
        | style::Display::ListItem
        | style::Display::Table
        | style::Display::TableCell
        | style::Display::InlineBlock
        | style::Display::Inline => {}
    }

    ts.size = Size {
        width: dim_to_taffy(s.width),
        height: dim_to_taffy(s.height),
    };
    ts.min_size = Size {
        width: dim_to_taffy(s.min_width),
        height: dim_to_taffy(s.min_height),
    };
    ts.max_size = Size {
        width: dim_to_taffy(s.max_width),
        height: Dimension::Auto,
    };

    ts.flex_grow = s.flex_grow;
    ts.flex_shrink = s.flex_shrink;
    ts.flex_basis = dim_to_taffy(s.flex_basis);
    if s.display == style::Display::TableCell && s.width == style::Dimension::Auto {
        ts.flex_grow = 1.0;
        ts.flex_basis = Dimension::Length(0.0);
        ts.min_size.width = Dimension::Length(0.0);
    }

    ts.margin = Rect {
        top: LengthPercentageAuto::Length(s.margin.top),
        right: LengthPercentageAuto::Length(s.margin.right),
        bottom: LengthPercentageAuto::Length(s.margin.bottom),
        left: LengthPercentageAuto::Length(s.margin.left),
    };
    ts.padding = Rect {
        top: LengthPercentage::Length(s.padding.top),
        right: LengthPercentage::Length(s.padding.right),
        bottom: LengthPercentage::Length(s.padding.bottom),
        left: LengthPercentage::Length(s.padding.left),
    };
    let border = s.border_widths();
    ts.border = Rect {
        top: LengthPercentage::Length(border.top),
        right: LengthPercentage::Length(border.right),
        bottom: LengthPercentage::Length(border.bottom),
        left: LengthPercentage::Length(border.left),
    };
    ts.gap = Size {
        width: LengthPercentage::Length(s.column_gap),
        height: LengthPercentage::Length(s.row_gap),
    };

    ts
}

fn dim_to_taffy(d: style::Dimension) -> Dimension {
    match d {
        style::Dimension::Auto => Dimension::Auto,
        style::Dimension::Pt(v) => Dimension::Length(v),
        style::Dimension::Percent(v) => Dimension::Percent(v / 100.0),
    }
}

// ---------------------------------------------------------------------------
// Image intrinsic-size helper
// ---------------------------------------------------------------------------

/// Decode a base64 data-URI image and return a cloned [`ComputedStyle`] with
/// `auto` width/height replaced by concrete point values derived from the
/// intrinsic size (one image pixel is one CSS pixel). Images wider than their
/// container are scaled down.
///
/// Returns `None` when the src is not a decodable data URI or both
/// dimensions are already specified.
fn resolve_img_dimensions(
    src: &str,
    style: &ComputedStyle,
    containing_width: f32,
) -> Option<ComputedStyle> {
    use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

    let known_w = style.width.resolve(containing_width);
    let known_h = match style.height {
        style::Dimension::Pt(v) => Some(v),
        _ => None,
    };
    if known_w.is_some() && known_h.is_some() {
        return None;
    }

    let (_, payload) = src.strip_prefix("data:")?.split_once(";base64,")?;
    let bytes = BASE64_STD.decode(payload.trim()).ok()?;
    let img = ::image::load_from_memory(&bytes).ok()?;
    let (nat_w, nat_h) = (img.width() as f32 * PX_TO_PT, img.height() as f32 * PX_TO_PT);
    if nat_w == 0.0 || nat_h == 0.0 {
        return None;
    }
    let aspect = nat_w / nat_h;

    let (mut w, mut h) = match (known_w, known_h) {
        (Some(w), None) => (w, w / aspect),
        (None, Some(h)) => (h * aspect, h),
        _ => (nat_w, nat_h),
    };
    let limit = containing_width - style.margin.left - style.margin.right;
    if known_w.is_none() && limit > 0.0 && w > limit {
        w = limit;
        h = w / aspect;
    }

    let mut s = style.clone();
    s.width = style::Dimension::Pt(w.max(1.0));
    s.height = style::Dimension::Pt(h.max(1.0));
    Some(s)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lay out a styled document (normally the `<body>` element) within
/// `content_width` points. Returned boxes are in document coordinates with
/// x offset by `origin_x`.
pub fn compute_layout(
    root: &StyledNode,
    content_width: f32,
    origin_x: f32,
    fonts: &FontManager,
) -> Result<Vec<PositionedBox>, TaffyError> {
    let mut builder = LayoutBuilder::new(fonts);

    let wrapper = ComputedStyle::default();
    let child_ids = builder.build_flow_children(
        &Tag::Html,
        &wrapper,
        std::slice::from_ref(root),
        content_width,
    )?;

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: Size {
            width: Dimension::Length(content_width),
            height: Dimension::Auto,
        },
        ..Default::default()
    };
    let root_id = builder.taffy.new_with_children(root_style, &child_ids)?;

    builder.taffy.compute_layout(
        root_id,
        Size {
            width: AvailableSpace::Definite(content_width),
            height: AvailableSpace::MaxContent,
        },
    )?;

    Ok(builder.extract(root_id, origin_x, 0.0)?.children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::parse_stylesheet;
    use crate::dom::{body_element, parse_html};
    use crate::style::style_document;

    fn layout(html: &str, css: &str, width: f32) -> Vec<PositionedBox> {
        let dom = parse_html(html);
        let styled = style_document(&body_element(&dom), &parse_stylesheet(css));
        compute_layout(&styled, width, 0.0, &FontManager::new()).unwrap()
    }

    fn body(boxes: &[PositionedBox]) -> &PositionedBox {
        assert_eq!(boxes.len(), 1, "body is the single top-level box");
        &boxes[0]
    }

    fn text_lines(b: &PositionedBox) -> Vec<String> {
        match &b.content {
            BoxContent::Text { lines, .. } => lines.clone(),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn paragraph_becomes_container_with_text_leaf() {
        let boxes = layout("<p>Hello world</p>", "p { margin: 0 }", 400.0);
        let p = &body(&boxes).children[0];
        assert!(p.width > 0.0 && p.height > 0.0);
        assert_eq!(text_lines(&p.children[0]), vec!["Hello world"]);
    }

    #[test]
    fn inline_elements_merge_into_one_run() {
        let boxes = layout(
            "<p>Rust <span>(native)</span> and <b>Go</b></p>",
            "",
            400.0,
        );
        let p = &body(&boxes).children[0];
        assert_eq!(p.children.len(), 1);
        assert_eq!(text_lines(&p.children[0]), vec!["Rust (native) and Go"]);
    }

    #[test]
    fn br_forces_a_new_line() {
        let boxes = layout("<p>one<br>two</p>", "", 400.0);
        let p = &body(&boxes).children[0];
        assert_eq!(text_lines(&p.children[0]), vec!["one", "two"]);
    }

    #[test]
    fn text_transform_applies_to_run() {
        let boxes = layout(r#"<h2 class="h">Skills</h2>"#, ".h { text-transform: uppercase }", 400.0);
        let h = &body(&boxes).children[0];
        assert_eq!(text_lines(&h.children[0]), vec!["SKILLS"]);
    }

    #[test]
    fn sole_inline_child_lends_its_typography() {
        let boxes = layout("<p><strong>Bold</strong></p>", "", 400.0);
        let leaf = &body(&boxes).children[0].children[0];
        assert_eq!(leaf.style.font_weight, style::FontWeight::Bold);
    }

    #[test]
    fn flex_row_splits_width() {
        let boxes = layout(
            r#"<div class="row"><div class="side">A</div><div class="main">B</div></div>"#,
            ".row { display: flex; flex-direction: row } .side { width: 25% } .main { flex: 1 }",
            400.0,
        );
        let row = &body(&boxes).children[0];
        assert_eq!(row.children.len(), 2);
        let (side, main) = (&row.children[0], &row.children[1]);
        assert!((side.width - 100.0).abs() < 0.5, "side width {}", side.width);
        assert!((main.width - 300.0).abs() < 0.5, "main width {}", main.width);
        assert!((main.x - 100.0).abs() < 0.5);
        assert_eq!(side.y, main.y);
    }

    #[test]
    fn narrow_column_wraps_text() {
        let words = "lorem ipsum dolor sit amet consectetur adipiscing elit";
        let html = format!(r#"<div class="row"><div class="side">{words}</div><div class="main">{words}</div></div>"#);
        let boxes = layout(
            &html,
            ".row { display: flex } .side { width: 20% } .main { flex: 1 }",
            500.0,
        );
        let row = &body(&boxes).children[0];
        let side_lines = text_lines(&row.children[0].children[0]).len();
        let main_lines = text_lines(&row.children[1].children[0]).len();
        assert!(side_lines > main_lines);
    }

    #[test]
    fn padding_and_border_offset_children() {
        let boxes = layout(
            r#"<div class="box"><p>x</p></div>"#,
            ".box { padding: 10pt; border-left: 2pt solid #000 } p { margin: 0 }",
            300.0,
        );
        let b = &body(&boxes).children[0];
        let p = &b.children[0];
        assert!((p.x - b.x - 12.0).abs() < 0.01);
        assert!((p.y - b.y - 10.0).abs() < 0.01);
        assert!(b.is_decorated());
    }

    #[test]
    fn list_items_get_markers() {
        let boxes = layout("<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol>", "", 300.0);
        let b = body(&boxes);
        let markers: Vec<String> = b
            .children
            .iter()
            .flat_map(|list| list.children.iter())
            .filter_map(|li| match &li.content {
                BoxContent::ListItem { marker } => Some(marker.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(markers, vec!["\u{2022}", "\u{2022}", "1."]);
    }

    #[test]
    fn list_style_none_hides_marker() {
        let boxes = layout("<ul class=\"plain\"><li>a</li></ul>", ".plain { list-style: none }", 300.0);
        let li = &body(&boxes).children[0].children[0];
        assert!(matches!(li.content, BoxContent::None));
    }

    #[test]
    fn table_cells_share_row_width() {
        let boxes = layout(
            "<table><tr><td>a</td><td>b</td></tr></table>",
            "td { padding: 0 }",
            200.0,
        );
        let row = &body(&boxes).children[0].children[0];
        assert_eq!(row.children.len(), 2);
        assert!((row.children[0].width - 100.0).abs() < 0.5);
        assert!((row.children[1].x - 100.0).abs() < 0.5);
    }

    #[test]
    fn image_with_fixed_size() {
        let boxes = layout(
            r#"<img src="data:image/png;base64,AAAA" style="width: 40pt; height: 30pt">"#,
            "",
            300.0,
        );
        let img = &body(&boxes).children[0];
        assert!((img.width - 40.0).abs() < 0.01);
        assert!((img.height - 30.0).abs() < 0.01);
        assert!(matches!(img.content, BoxContent::Image { .. }));
    }

    #[test]
    fn consecutive_blocks_stack() {
        let boxes = layout("<p>a</p><p>b</p>", "p { margin: 0 0 6pt 0 }", 300.0);
        let b = body(&boxes);
        let (first, second) = (&b.children[0], &b.children[1]);
        assert!((second.y - first.bottom() - 6.0).abs() < 0.01);
    }
}
