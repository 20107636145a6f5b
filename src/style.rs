//! Style resolver – cascades stylesheet rules and inline styles into a flat
//! [`ComputedStyle`] per element, consumed by the layout engine.
//!
//! All lengths are in points.

use std::collections::HashMap;

use crate::css::{self, Declaration, Edges, Stylesheet, ROOT_FONT_SIZE_PT};
use crate::dom::{DomNode, ElementNode, Tag};
use crate::fonts::{FontFamily, FontKey};

/// Fully resolved style for a single element.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub flex_basis: Dimension,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub row_gap: f32,
    pub column_gap: f32,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub max_width: Dimension,
    pub min_height: Dimension,

    // Spacing
    pub margin: Edges,
    pub padding: Edges,

    // Border
    pub border_top: BorderSide,
    pub border_right: BorderSide,
    pub border_bottom: BorderSide,
    pub border_left: BorderSide,

    // Typography (inherited)
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_family: FontFamily,
    pub font_style: FontStyle,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub text_transform: TextTransform,
    pub list_style_none: bool,

    pub text_decoration: TextDecoration,

    // Background
    pub background_color: Color,

    // Page break
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: Dimension::Auto,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            row_gap: 0.0,
            column_gap: 0.0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            max_width: Dimension::Auto,
            min_height: Dimension::Auto,
            margin: Edges::default(),
            padding: Edges::default(),
            border_top: BorderSide::NONE,
            border_right: BorderSide::NONE,
            border_bottom: BorderSide::NONE,
            border_left: BorderSide::NONE,
            font_size: ROOT_FONT_SIZE_PT,
            font_weight: FontWeight::Normal,
            font_family: FontFamily::SansSerif,
            font_style: FontStyle::Normal,
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.2,
            text_transform: TextTransform::None,
            list_style_none: false,
            text_decoration: TextDecoration::None,
            background_color: Color::TRANSPARENT,
            page_break_before: false,
            page_break_after: false,
            page_break_inside_avoid: false,
        }
    }
}

impl ComputedStyle {
    pub fn font_key(&self) -> FontKey {
        FontKey::new(
            self.font_family,
            self.font_weight == FontWeight::Bold,
            self.font_style == FontStyle::Italic,
        )
    }

    /// Border widths as edges.
    pub fn border_widths(&self) -> Edges {
        Edges {
            top: self.border_top.width,
            right: self.border_right.width,
            bottom: self.border_bottom.width,
            left: self.border_left.width,
        }
    }

    pub fn has_border(&self) -> bool {
        [
            self.border_top,
            self.border_right,
            self.border_bottom,
            self.border_left,
        ]
        .iter()
        .any(|b| b.is_visible())
    }

    /// Apply `text-transform` to a run of text.
    pub fn transform_text(&self, text: &str) -> String {
        match self.text_transform {
            TextTransform::None => text.to_string(),
            TextTransform::Uppercase => text.to_uppercase(),
            TextTransform::Lowercase => text.to_lowercase(),
            TextTransform::Capitalize => {
                let mut out = String::with_capacity(text.len());
                let mut at_word_start = true;
                for c in text.chars() {
                    if at_word_start && c.is_alphabetic() {
                        out.extend(c.to_uppercase());
                    } else {
                        out.push(c);
                    }
                    at_word_start = c.is_whitespace();
                }
                out
            }
        }
    }

    /// The style of text flowing inside this element: typography is kept,
    /// box-model properties are cleared so they are not drawn twice.
    pub fn for_text(&self) -> ComputedStyle {
        ComputedStyle {
            display: Display::Inline,
            border_top: BorderSide::NONE,
            border_right: BorderSide::NONE,
            border_bottom: BorderSide::NONE,
            border_left: BorderSide::NONE,
            background_color: Color::TRANSPARENT,
            margin: Edges::default(),
            padding: Edges::default(),
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            max_width: Dimension::Auto,
            min_height: Dimension::Auto,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: Dimension::Auto,
            page_break_before: false,
            page_break_after: false,
            page_break_inside_avoid: false,
            ..self.clone()
        }
    }

    /// Copy inherited properties from the parent.
    fn inherit_from(&mut self, parent: &ComputedStyle) {
        self.font_size = parent.font_size;
        self.font_weight = parent.font_weight;
        self.font_family = parent.font_family;
        self.font_style = parent.font_style;
        self.color = parent.color;
        self.text_align = parent.text_align;
        self.line_height = parent.line_height;
        self.text_transform = parent.text_transform;
        self.list_style_none = parent.list_style_none;
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Inline,
    InlineBlock,
    ListItem,
    Table,
    TableRow,
    TableCell,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoration {
    None,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTransform {
    None,
    Uppercase,
    Lowercase,
    Capitalize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Pt(f32),
    Percent(f32),
}

impl Dimension {
    /// Resolve against a containing size; `None` for `auto`.
    pub fn resolve(self, container: f32) -> Option<f32> {
        match self {
            Dimension::Auto => None,
            Dimension::Pt(v) => Some(v),
            Dimension::Percent(p) => Some(container * p / 100.0),
        }
    }
}

/// One side of a border.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderSide {
    pub width: f32,
    pub color: Color,
}

impl BorderSide {
    pub const NONE: Self = Self {
        width: 0.0,
        color: Color::BLACK,
    };

    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && !self.color.is_transparent()
    }
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    /// Flatten alpha against a white page.
    pub fn over_white(&self) -> [f32; 3] {
        let blend = |c: f32| c * self.a + (1.0 - self.a);
        [blend(self.r), blend(self.g), blend(self.b)]
    }
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve the style for an element: inherited values, tag defaults, matching
/// rules by specificity and source order, then the inline `style` attribute.
/// `!important` declarations are applied after all normal ones.
pub fn resolve_style(
    element: &ElementNode,
    ancestors: &[&ElementNode],
    parent: Option<&ComputedStyle>,
    sheet: &Stylesheet,
) -> ComputedStyle {
    let mut style = ComputedStyle::default();
    if let Some(p) = parent {
        style.inherit_from(p);
    }
    let parent_font_size = parent.map_or(ROOT_FONT_SIZE_PT, |p| p.font_size);
    apply_tag_defaults(&mut style, &element.tag);

    let mut matched: Vec<&css::Rule> = sheet
        .rules
        .iter()
        .filter(|r| r.selector.matches(element, ancestors))
        .collect();
    matched.sort_by_key(|r| (r.selector.specificity(), r.order));

    let inline = element
        .inline_style()
        .map(css::parse_declarations)
        .unwrap_or_default();

    let mut ordered: Vec<&Declaration> = Vec::new();
    for important in [false, true] {
        ordered.extend(
            matched
                .iter()
                .flat_map(|r| r.declarations.iter())
                .chain(inline.iter())
                .filter(|d| d.important == important),
        );
    }

    // Font size first so `em` lengths in the same block see the final size.
    for decl in ordered.iter().filter(|d| d.property == "font-size") {
        apply_font_size(&mut style, &decl.value, parent_font_size);
    }
    for decl in ordered.iter().filter(|d| d.property != "font-size") {
        apply_css_property(&mut style, &decl.property, &decl.value);
    }

    style
}

/// Default styles based on tag semantics.
fn apply_tag_defaults(s: &mut ComputedStyle, tag: &Tag) {
    let em = s.font_size;
    match tag {
        Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4 => {
            let (scale, margin) = match tag {
                Tag::H1 => (2.0, 0.67),
                Tag::H2 => (1.5, 0.83),
                Tag::H3 => (1.17, 1.0),
                _ => (1.0, 1.33),
            };
            s.font_size = em * scale;
            s.font_weight = FontWeight::Bold;
            s.margin.bottom = s.font_size * margin;
        }
        Tag::P => {
            s.margin.bottom = em;
        }
        Tag::Ul | Tag::Ol => {
            s.margin.bottom = em;
            s.padding.left = 24.0;
        }
        Tag::Li => {
            s.display = Display::ListItem;
        }
        Tag::Table => {
            s.display = Display::Table;
        }
        Tag::Tr => {
            s.display = Display::TableRow;
        }
        Tag::Td | Tag::Th => {
            s.display = Display::TableCell;
            s.padding = Edges {
                top: 3.0,
                right: 6.0,
                bottom: 3.0,
                left: 6.0,
            };
            if *tag == Tag::Th {
                s.font_weight = FontWeight::Bold;
            }
        }
        Tag::Strong | Tag::B => {
            s.display = Display::Inline;
            s.font_weight = FontWeight::Bold;
        }
        Tag::Em | Tag::I => {
            s.display = Display::Inline;
            s.font_style = FontStyle::Italic;
        }
        Tag::Small => {
            s.display = Display::Inline;
            s.font_size = em * 0.83;
        }
        Tag::A => {
            s.display = Display::Inline;
            s.text_decoration = TextDecoration::Underline;
        }
        Tag::Span | Tag::Br => {
            s.display = Display::Inline;
        }
        Tag::Img => {
            s.display = Display::InlineBlock;
        }
        Tag::Hr => {
            s.border_top = BorderSide {
                width: 0.75,
                color: Color::rgb(0.6, 0.6, 0.6),
            };
            s.margin.top = em * 0.5;
            s.margin.bottom = em * 0.5;
        }
        Tag::Head | Tag::Style | Tag::Title | Tag::Meta | Tag::Link => {
            s.display = Display::None;
        }
        Tag::Unknown(name) if name == "script" || name == "template" => {
            s.display = Display::None;
        }
        Tag::Html
        | Tag::Body
        | Tag::Div
        | Tag::Section
        | Tag::Header
        | Tag::Footer
        | Tag::Aside
        | Tag::Main
        | Tag::Article
        | Tag::Unknown(_) => {}
    }
}

fn apply_font_size(s: &mut ComputedStyle, val: &str, parent_size: f32) {
    let size = match val.trim().to_ascii_lowercase().as_str() {
        "xx-small" => Some(7.0),
        "x-small" => Some(7.5),
        "small" => Some(10.0),
        "medium" => Some(12.0),
        "large" => Some(13.5),
        "x-large" => Some(18.0),
        "xx-large" => Some(24.0),
        "smaller" => Some(parent_size * 0.83),
        "larger" => Some(parent_size * 1.2),
        v => match v.strip_suffix('%') {
            Some(p) => p.parse::<f32>().ok().map(|p| parent_size * p / 100.0),
            None => css::length_pt(v, parent_size),
        },
    };
    if let Some(size) = size.filter(|s| *s > 0.0) {
        s.font_size = size;
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    let v = val.trim().to_ascii_lowercase();
    let v = v.as_str();
    let em = s.font_size;
    match prop {
        "display" => {
            s.display = match v {
                "flex" | "inline-flex" => Display::Flex,
                "block" | "grid" => Display::Block,
                "inline" => Display::Inline,
                "inline-block" => Display::InlineBlock,
                "list-item" => Display::ListItem,
                "table" => Display::Table,
                "table-row" => Display::TableRow,
                "table-cell" => Display::TableCell,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "flex-direction" => {
            s.flex_direction = match v {
                "row" | "row-reverse" => FlexDirection::Row,
                "column" | "column-reverse" => FlexDirection::Column,
                _ => s.flex_direction,
            }
        }
        "flex-wrap" => {
            s.flex_wrap = match v {
                "wrap" | "wrap-reverse" => FlexWrap::Wrap,
                _ => FlexWrap::NoWrap,
            }
        }
        "flex" => apply_flex_shorthand(s, v),
        "flex-grow" => {
            if let Ok(g) = v.parse() {
                s.flex_grow = g;
            }
        }
        "flex-shrink" => {
            if let Ok(g) = v.parse() {
                s.flex_shrink = g;
            }
        }
        "flex-basis" => s.flex_basis = parse_dimension(v, em),
        "justify-content" => {
            s.justify_content = match v {
                "flex-start" | "start" | "left" | "normal" => JustifyContent::Start,
                "flex-end" | "end" | "right" => JustifyContent::End,
                "center" => JustifyContent::Center,
                "space-between" => JustifyContent::SpaceBetween,
                "space-around" => JustifyContent::SpaceAround,
                "space-evenly" => JustifyContent::SpaceEvenly,
                _ => s.justify_content,
            }
        }
        "align-items" => {
            s.align_items = match v {
                "flex-start" | "start" | "baseline" => AlignItems::Start,
                "flex-end" | "end" => AlignItems::End,
                "center" => AlignItems::Center,
                "stretch" | "normal" => AlignItems::Stretch,
                _ => s.align_items,
            }
        }
        "gap" => {
            let gaps: Vec<f32> = v.split_whitespace().filter_map(|g| css::length_pt(g, em)).collect();
            match gaps[..] {
                [g] => {
                    s.row_gap = g;
                    s.column_gap = g;
                }
                [r, c] => {
                    s.row_gap = r;
                    s.column_gap = c;
                }
                _ => {}
            }
        }
        "row-gap" => {
            if let Some(g) = css::length_pt(v, em) {
                s.row_gap = g;
            }
        }
        "column-gap" => {
            if let Some(g) = css::length_pt(v, em) {
                s.column_gap = g;
            }
        }
        "width" => s.width = parse_dimension(v, em),
        "height" => s.height = parse_dimension(v, em),
        "min-width" => s.min_width = parse_dimension(v, em),
        "max-width" => s.max_width = parse_dimension(v, em),
        "min-height" => s.min_height = parse_dimension(v, em),
        "margin" => {
            if let Some(e) = css::parse_edges(v, em) {
                s.margin = e;
            }
        }
        "padding" => {
            if let Some(e) = css::parse_edges(v, em) {
                s.padding = e;
            }
        }
        "margin-top" | "margin-right" | "margin-bottom" | "margin-left" => {
            let len = if v == "auto" { Some(0.0) } else { css::length_pt(v, em) };
            if let Some(len) = len {
                *edge_mut(&mut s.margin, &prop["margin-".len()..]) = len;
            }
        }
        "padding-top" | "padding-right" | "padding-bottom" | "padding-left" => {
            if let Some(len) = css::length_pt(v, em) {
                *edge_mut(&mut s.padding, &prop["padding-".len()..]) = len;
            }
        }
        "border" => {
            if let Some(side) = parse_border(v, em) {
                s.border_top = side;
                s.border_right = side;
                s.border_bottom = side;
                s.border_left = side;
            }
        }
        "border-top" | "border-right" | "border-bottom" | "border-left" => {
            if let Some(side) = parse_border(v, em) {
                *border_mut(s, &prop["border-".len()..]) = side;
            }
        }
        "border-width" => {
            if let Some(e) = css::parse_edges(v, em) {
                s.border_top.width = e.top;
                s.border_right.width = e.right;
                s.border_bottom.width = e.bottom;
                s.border_left.width = e.left;
            }
        }
        "border-color" => {
            if let Some(c) = css::parse_color(v) {
                for side in [
                    &mut s.border_top,
                    &mut s.border_right,
                    &mut s.border_bottom,
                    &mut s.border_left,
                ] {
                    side.color = c;
                }
            }
        }
        "border-style" => {
            if v == "none" || v == "hidden" {
                s.border_top.width = 0.0;
                s.border_right.width = 0.0;
                s.border_bottom.width = 0.0;
                s.border_left.width = 0.0;
            }
        }
        "border-top-width" | "border-right-width" | "border-bottom-width" | "border-left-width" => {
            if let Some(w) = css::length_pt(v, em) {
                let side = prop
                    .trim_start_matches("border-")
                    .trim_end_matches("-width");
                border_mut(s, side).width = w;
            }
        }
        "border-top-color" | "border-right-color" | "border-bottom-color"
        | "border-left-color" => {
            if let Some(c) = css::parse_color(v) {
                let side = prop
                    .trim_start_matches("border-")
                    .trim_end_matches("-color");
                border_mut(s, side).color = c;
            }
        }
        "font-weight" => {
            s.font_weight = match v {
                "bold" | "bolder" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = match v {
                "italic" | "oblique" => FontStyle::Italic,
                _ => FontStyle::Normal,
            }
        }
        "font-family" => s.font_family = FontFamily::from_css(val),
        "color" => {
            if let Some(c) = css::parse_color(v) {
                s.color = c;
            }
        }
        "background-color" => {
            if let Some(c) = css::parse_color(v) {
                s.background_color = c;
            }
        }
        "background" => {
            if v == "none" {
                s.background_color = Color::TRANSPARENT;
            } else if let Some(c) = css::parse_color(v)
                .or_else(|| v.split_whitespace().find_map(css::parse_color))
            {
                s.background_color = c;
            }
        }
        "text-align" => {
            s.text_align = match v {
                "center" => TextAlign::Center,
                "right" | "end" => TextAlign::Right,
                _ => TextAlign::Left,
            }
        }
        "text-transform" => {
            s.text_transform = match v {
                "uppercase" => TextTransform::Uppercase,
                "lowercase" => TextTransform::Lowercase,
                "capitalize" => TextTransform::Capitalize,
                _ => TextTransform::None,
            }
        }
        "text-decoration" | "text-decoration-line" => {
            s.text_decoration = if v.contains("underline") {
                TextDecoration::Underline
            } else {
                TextDecoration::None
            }
        }
        "list-style" | "list-style-type" => {
            s.list_style_none = v.split_whitespace().any(|w| w == "none");
        }
        "line-height" => {
            if v == "normal" {
                s.line_height = 1.2;
            } else if let Ok(factor) = v.parse::<f32>() {
                s.line_height = factor;
            } else if let Some(p) = v.strip_suffix('%').and_then(|p| p.parse::<f32>().ok()) {
                s.line_height = p / 100.0;
            } else if let Some(pt) = css::length_pt(v, em) {
                s.line_height = pt / em;
            }
        }
        "break-before" | "page-break-before" => {
            s.page_break_before = matches!(v, "always" | "page" | "left" | "right");
        }
        "break-after" | "page-break-after" => {
            s.page_break_after = matches!(v, "always" | "page" | "left" | "right");
        }
        "break-inside" | "page-break-inside" => {
            s.page_break_inside_avoid = matches!(v, "avoid" | "avoid-page");
        }
        _ => {}
    }
}

fn apply_flex_shorthand(s: &mut ComputedStyle, v: &str) {
    match v {
        "none" => {
            s.flex_grow = 0.0;
            s.flex_shrink = 0.0;
            s.flex_basis = Dimension::Auto;
        }
        "auto" => {
            s.flex_grow = 1.0;
            s.flex_shrink = 1.0;
            s.flex_basis = Dimension::Auto;
        }
        _ => {
            let mut numbers = Vec::new();
            let mut basis = None;
            for token in v.split_whitespace() {
                match token.parse::<f32>() {
                    Ok(n) if numbers.len() < 2 => numbers.push(n),
                    _ => basis = Some(parse_dimension(token, s.font_size)),
                }
            }
            if let Some(&grow) = numbers.first() {
                s.flex_grow = grow;
                s.flex_shrink = numbers.get(1).copied().unwrap_or(1.0);
                s.flex_basis = basis.unwrap_or(Dimension::Percent(0.0));
            } else if let Some(basis) = basis {
                s.flex_grow = 1.0;
                s.flex_shrink = 1.0;
                s.flex_basis = basis;
            }
        }
    }
}

fn edge_mut<'a>(edges: &'a mut Edges, side: &str) -> &'a mut f32 {
    match side {
        "top" => &mut edges.top,
        "right" => &mut edges.right,
        "bottom" => &mut edges.bottom,
        _ => &mut edges.left,
    }
}

fn border_mut<'a>(s: &'a mut ComputedStyle, side: &str) -> &'a mut BorderSide {
    match side {
        "top" => &mut s.border_top,
        "right" => &mut s.border_right,
        "bottom" => &mut s.border_bottom,
        _ => &mut s.border_left,
    }
}

/// `<width> <style> <color>` in any order. Missing width with a visible
/// style means 1px.
fn parse_border(v: &str, em: f32) -> Option<BorderSide> {
    if v == "none" || v == "0" {
        return Some(BorderSide::NONE);
    }
    let mut side = BorderSide {
        width: 0.75,
        color: Color::BLACK,
    };
    let mut understood = false;
    for token in v.split_whitespace() {
        if let Some(w) = css::length_pt(token, em) {
            side.width = w;
        } else if let Some(c) = css::parse_color(token) {
            side.color = c;
        } else if matches!(token, "none" | "hidden") {
            side.width = 0.0;
        } else if !matches!(token, "solid" | "dashed" | "dotted" | "double") {
            return None;
        }
        understood = true;
    }
    understood.then_some(side)
}

fn parse_dimension(v: &str, em: f32) -> Dimension {
    if v == "auto" {
        return Dimension::Auto;
    }
    if let Some(p) = v.strip_suffix('%') {
        return p
            .trim()
            .parse::<f32>()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto);
    }
    css::length_pt(v, em)
        .map(Dimension::Pt)
        .unwrap_or(Dimension::Auto)
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        /// Original attributes (for images src, etc.)
        attrs: HashMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

impl StyledNode {
    pub fn style(&self) -> &ComputedStyle {
        match self {
            StyledNode::Element { style, .. } | StyledNode::Text { style, .. } => style,
        }
    }
}

/// Style the `<body>` element and everything below it.
pub fn style_document(body: &ElementNode, sheet: &Stylesheet) -> StyledNode {
    let html = ElementNode::new(Tag::Html);
    let root_style = resolve_style(&html, &[], None, sheet);
    let mut ancestors = vec![&html];
    let style = resolve_style(body, &ancestors, Some(&root_style), sheet);
    ancestors.push(body);
    let children = build_styled_tree(&body.children, &style, &mut ancestors, sheet);
    StyledNode::Element {
        tag: body.tag.clone(),
        style,
        children,
        attrs: body.attributes.clone(),
    }
}

/// Build a styled tree from DOM nodes, resolving styles top-down.
/// `display: none` subtrees are dropped.
pub fn build_styled_tree<'a>(
    nodes: &'a [DomNode],
    parent_style: &ComputedStyle,
    ancestors: &mut Vec<&'a ElementNode>,
    sheet: &Stylesheet,
) -> Vec<StyledNode> {
    let has_inline_sibling = nodes.iter().any(|n| match n {
        DomNode::Element(e) => e.tag.is_inline(),
        DomNode::Text(t) => !t.trim().is_empty(),
    });

    let mut result = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) => {
                let style = resolve_style(e, ancestors, Some(parent_style), sheet);
                if style.display == Display::None {
                    continue;
                }
                ancestors.push(e);
                let children = build_styled_tree(&e.children, &style, ancestors, sheet);
                ancestors.pop();
                result.push(StyledNode::Element {
                    tag: e.tag.clone(),
                    style,
                    children,
                    attrs: e.attributes.clone(),
                });
            }
            DomNode::Text(text) => {
                // Whitespace only separates inline content.
                if text.trim().is_empty() && !has_inline_sibling {
                    continue;
                }
                result.push(StyledNode::Text {
                    text: text.clone(),
                    style: parent_style.for_text(),
                });
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::parse_stylesheet;
    use crate::dom::{body_element, parse_html};

    fn styled(html: &str, css: &str) -> StyledNode {
        let dom = parse_html(html);
        style_document(&body_element(&dom), &parse_stylesheet(css))
    }

    fn child(node: &StyledNode, path: &[usize]) -> StyledNode {
        let mut cur = node.clone();
        for &i in path {
            cur = match cur {
                StyledNode::Element { children, .. } => children[i].clone(),
                StyledNode::Text { .. } => panic!("text has no children"),
            };
        }
        cur
    }

    #[test]
    fn specificity_beats_source_order() {
        let root = styled(
            r#"<p class="x" id="y">t</p>"#,
            "#y { color: #00ff00 } .x { color: #ff0000 } p { color: #0000ff }",
        );
        let p = child(&root, &[0]);
        assert_eq!(p.style().color, Color::rgb(0.0, 1.0, 0.0));
    }

    #[test]
    fn later_rule_wins_on_tie() {
        let root = styled(r#"<p class="a b">t</p>"#, ".a { font-size: 10pt } .b { font-size: 14pt }");
        assert_eq!(child(&root, &[0]).style().font_size, 14.0);
    }

    #[test]
    fn inline_beats_rules_and_important_beats_inline() {
        let root = styled(
            r#"<p class="a" style="font-size: 20pt; color: #ff0000">t</p>"#,
            ".a { font-size: 8pt; color: #0000ff !important }",
        );
        let p = child(&root, &[0]);
        assert_eq!(p.style().font_size, 20.0);
        assert_eq!(p.style().color, Color::rgb(0.0, 0.0, 1.0));
    }

    #[test]
    fn typography_is_inherited() {
        let root = styled(
            r#"<div class="side"><p>t</p></div>"#,
            "body { font-size: 9pt; font-family: Georgia, serif } .side { color: #ffffff; text-transform: uppercase }",
        );
        let p = child(&root, &[0, 0]);
        assert_eq!(p.style().font_size, 9.0);
        assert_eq!(p.style().font_family, FontFamily::Serif);
        assert_eq!(p.style().color, Color::WHITE);
        assert_eq!(p.style().transform_text("abc"), "ABC");
    }

    #[test]
    fn em_lengths_use_element_font_size() {
        let root = styled(r#"<p style="margin: 1em; font-size: 10pt">t</p>"#, "");
        assert_eq!(child(&root, &[0]).style().margin, Edges::uniform(10.0));
    }

    #[test]
    fn display_none_is_dropped() {
        let root = styled("<p>a</p><p class=\"h\">b</p>", ".h { display: none }");
        let StyledNode::Element { children, .. } = root else {
            panic!("expected body element");
        };
        assert_eq!(children.len(), 1);
    }

    #[test]
    fn border_shorthands() {
        let root = styled(
            r#"<h2>t</h2>"#,
            "h2 { border-bottom: 1pt solid #1e3a5f; border-top: none }",
        );
        let s = child(&root, &[0]).style().clone();
        assert_eq!(s.border_bottom.width, 1.0);
        assert_eq!(s.border_top.width, 0.0);
        assert!(s.has_border());
    }

    #[test]
    fn flex_shorthand() {
        let mut s = ComputedStyle::default();
        apply_css_property(&mut s, "flex", "1");
        assert_eq!(s.flex_grow, 1.0);
        assert_eq!(s.flex_basis, Dimension::Percent(0.0));
        apply_css_property(&mut s, "flex", "0 0 30%");
        assert_eq!(s.flex_grow, 0.0);
        assert_eq!(s.flex_basis, Dimension::Percent(30.0));
    }

    #[test]
    fn capitalize_words() {
        let s = ComputedStyle {
            text_transform: TextTransform::Capitalize,
            ..ComputedStyle::default()
        };
        assert_eq!(s.transform_text("hello big world"), "Hello Big World");
    }

    #[test]
    fn heading_defaults_scale_with_parent() {
        let root = styled("<h1>t</h1>", "body { font-size: 10pt }");
        let h1 = child(&root, &[0]);
        assert_eq!(h1.style().font_size, 20.0);
        assert_eq!(h1.style().font_weight, FontWeight::Bold);
    }
}
