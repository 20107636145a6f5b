//! Stylesheet parser – turns `<style>` text and the rendered stylesheet
//! template into rules the style resolver can cascade.
//!
//! Supported: type / class / id / universal selectors, compound selectors,
//! descendant and child combinators, selector lists, `!important`,
//! `@page { size; margin }` and `@media print|all`. Anything else is skipped
//! with a debug log.

use crate::dom::ElementNode;
use crate::style::Color;

/// CSS pixels per point.
pub const PX_TO_PT: f32 = 0.75;
pub const MM_TO_PT: f32 = 72.0 / 25.4;
/// Font size of the root element, in points (16px).
pub const ROOT_FONT_SIZE_PT: f32 = 12.0;

/// A parsed stylesheet.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
    pub page: PageRule,
}

/// One selector with its declaration block. Selector lists are split into
/// one rule per selector.
#[derive(Debug, Clone)]
pub struct Rule {
    pub selector: Selector,
    pub declarations: Vec<Declaration>,
    /// Source order, used to break specificity ties.
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// Settings from `@page`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageRule {
    /// Page size in points as written (before orientation is applied).
    pub size: Option<(f32, f32)>,
    /// `Some(true)` for `landscape`, `Some(false)` for `portrait`.
    pub landscape: Option<bool>,
    pub margin: Option<Edges>,
}

/// Four box edges, in points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub fn uniform(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    /// Expand 1-4 shorthand values the CSS way.
    pub fn from_shorthand(values: &[f32]) -> Option<Self> {
        let (top, right, bottom, left) = match *values {
            [a] => (a, a, a, a),
            [a, b] => (a, b, a, b),
            [a, b, c] => (a, b, c, b),
            [a, b, c, d] => (a, b, c, d),
            _ => return None,
        };
        Some(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// `tag#id.class.class` – every part optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

impl Compound {
    fn parse(token: &str) -> Option<Self> {
        if token.contains([':', '[', '+', '~', '(', ')']) {
            return None;
        }
        let mut compound = Compound::default();
        let end = token.find(['.', '#']).unwrap_or(token.len());
        let (head, mut rest) = token.split_at(end);
        match head {
            "" | "*" => {}
            name => compound.tag = Some(name.to_ascii_lowercase()),
        }
        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['.', '#']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return None;
            }
            if marker == '.' {
                compound.classes.push(name.to_string());
            } else {
                compound.id = Some(name.to_string());
            }
            rest = &body[end..];
        }
        Some(compound)
    }

    pub fn matches(&self, element: &ElementNode) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag.name() != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| element.has_class(c))
    }
}

/// A complex selector: compounds joined by combinators, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

impl Selector {
    /// Parse a single selector (no commas). Returns `None` for anything
    /// outside the supported subset.
    pub fn parse(text: &str) -> Option<Self> {
        let spaced = text.replace('>', " > ");
        let mut compounds = Vec::new();
        let mut combinators = Vec::new();
        let mut next = Combinator::Descendant;
        let mut dangling = false;
        for token in spaced.split_whitespace() {
            if token == ">" {
                if compounds.is_empty() || dangling {
                    return None;
                }
                next = Combinator::Child;
                dangling = true;
                continue;
            }
            let compound = Compound::parse(token)?;
            if !compounds.is_empty() {
                combinators.push(next);
            }
            compounds.push(compound);
            next = Combinator::Descendant;
            dangling = false;
        }
        if compounds.is_empty() || dangling {
            return None;
        }
        Some(Self {
            compounds,
            combinators,
        })
    }

    /// `(ids, classes, types)`.
    pub fn specificity(&self) -> (u32, u32, u32) {
        self.compounds.iter().fold((0, 0, 0), |(a, b, c), comp| {
            (
                a + comp.id.is_some() as u32,
                b + comp.classes.len() as u32,
                c + comp.tag.is_some() as u32,
            )
        })
    }

    /// Match against `element`, whose ancestors are listed root first.
    pub fn matches(&self, element: &ElementNode, ancestors: &[&ElementNode]) -> bool {
        let Some((last, rest)) = self.compounds.split_last() else {
            return false;
        };
        last.matches(element) && self.match_ancestors(rest, ancestors)
    }

    fn match_ancestors(&self, compounds: &[Compound], ancestors: &[&ElementNode]) -> bool {
        let Some((compound, rest)) = compounds.split_last() else {
            return true;
        };
        match self.combinators[compounds.len() - 1] {
            Combinator::Child => match ancestors.split_last() {
                Some((parent, up)) => compound.matches(parent) && self.match_ancestors(rest, up),
                None => false,
            },
            Combinator::Descendant => (0..ancestors.len()).rev().any(|i| {
                compound.matches(ancestors[i]) && self.match_ancestors(rest, &ancestors[..i])
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Stylesheet parsing
// ---------------------------------------------------------------------------

/// Parse stylesheet text. Never fails: unsupported constructs are dropped.
pub fn parse_stylesheet(css: &str) -> Stylesheet {
    let mut sheet = Stylesheet::default();
    let src = strip_comments(css);
    parse_rules_into(&src, &mut sheet);
    log::debug!(
        "Parsed stylesheet: {} rules, @page {:?}",
        sheet.rules.len(),
        sheet.page
    );
    sheet
}

fn parse_rules_into(src: &str, sheet: &mut Stylesheet) {
    let mut rest = src;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let brace = rest.find('{');
        let semi = rest.find(';');
        if let Some(s) = semi {
            if brace.map_or(true, |b| s < b) {
                // Statement at-rule such as @import or @charset.
                log::debug!("Ignoring CSS statement '{}'", rest[..s].trim());
                rest = &rest[s + 1..];
                continue;
            }
        }
        let Some(open) = brace else {
            break;
        };
        let prelude = rest[..open].trim();
        let close = matching_brace(rest, open);
        let body = &rest[open + 1..close];
        rest = rest.get(close + 1..).unwrap_or("");

        if let Some(at) = prelude.strip_prefix('@') {
            parse_at_rule(at, body, sheet);
        } else {
            add_rule(prelude, body, sheet);
        }
    }
}

/// Byte index of the `}` closing the block opened at `open`, or the end of
/// input if unbalanced.
fn matching_brace(src: &str, open: usize) -> usize {
    let mut depth = 0usize;
    for (i, b) in src.bytes().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    src.len()
}

fn parse_at_rule(at: &str, body: &str, sheet: &mut Stylesheet) {
    let (name, params) = at.split_once(char::is_whitespace).unwrap_or((at, ""));
    match name.to_ascii_lowercase().as_str() {
        "page" => {
            if !params.trim().is_empty() {
                log::debug!("Ignoring @page {}", params.trim());
                return;
            }
            for decl in parse_declarations(body) {
                match decl.property.as_str() {
                    "size" => apply_page_size(&mut sheet.page, &decl.value),
                    "margin" => {
                        if let Some(edges) = parse_edges(&decl.value, ROOT_FONT_SIZE_PT) {
                            sheet.page.margin = Some(edges);
                        }
                    }
                    _ => {}
                }
            }
        }
        "media" => {
            if media_applies(params) {
                parse_rules_into(body, sheet);
            } else {
                log::debug!("Skipping @media {}", params.trim());
            }
        }
        other => log::debug!("Ignoring @{other} block"),
    }
}

/// True when any query in the list targets print or all media.
fn media_applies(params: &str) -> bool {
    params.split(',').any(|query| {
        let mut words = query.split_whitespace().map(str::to_ascii_lowercase);
        let mut first = words.next();
        if first.as_deref() == Some("only") {
            first = words.next();
        }
        matches!(first.as_deref(), Some("print" | "all"))
    })
}

fn apply_page_size(page: &mut PageRule, value: &str) {
    let mut lengths = Vec::new();
    for word in value.split_whitespace() {
        match word.to_ascii_lowercase().as_str() {
            "landscape" => page.landscape = Some(true),
            "portrait" => page.landscape = Some(false),
            "auto" => {}
            named => {
                if let Some(size) = named_page_size(named) {
                    page.size = Some(size);
                } else if let Some(v) = length_pt(word, ROOT_FONT_SIZE_PT) {
                    lengths.push(v);
                }
            }
        }
    }
    match lengths[..] {
        [side] => page.size = Some((side, side)),
        [w, h] => page.size = Some((w, h)),
        _ => {}
    }
}

/// Portrait dimensions of a named page size, in points.
pub fn named_page_size(name: &str) -> Option<(f32, f32)> {
    let size = match name.to_ascii_lowercase().as_str() {
        "a3" => (841.89, 1190.55),
        "a4" => (595.28, 841.89),
        "a5" => (419.53, 595.28),
        "letter" => (612.0, 792.0),
        "legal" => (612.0, 1008.0),
        _ => return None,
    };
    Some(size)
}

fn add_rule(prelude: &str, body: &str, sheet: &mut Stylesheet) {
    let declarations = parse_declarations(body);
    if declarations.is_empty() {
        return;
    }
    for text in prelude.split(',') {
        match Selector::parse(text) {
            Some(selector) => {
                let order = sheet.rules.len();
                sheet.rules.push(Rule {
                    selector,
                    declarations: declarations.clone(),
                    order,
                });
            }
            None => log::debug!("Skipping unsupported selector '{}'", text.trim()),
        }
    }
}

/// Parse a declaration block (also used for inline `style` attributes).
pub fn parse_declarations(body: &str) -> Vec<Declaration> {
    split_top_level(body, ';')
        .into_iter()
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let mut value = value.trim();
            let mut important = false;
            if let Some(idx) = value.to_ascii_lowercase().rfind("!important") {
                important = true;
                value = value[..idx].trim_end();
            }
            if property.is_empty() || value.is_empty() {
                return None;
            }
            Some(Declaration {
                property,
                value: value.to_string(),
                important,
            })
        })
        .collect()
}

/// Split on `sep` outside parentheses and quotes.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth -= 1,
            (None, c) if c == sep && depth <= 0 => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// Parse an absolute or font-relative length into points. Percentages are
/// not lengths here; see [`crate::style::Dimension`]. Unitless numbers are
/// taken as pixels.
pub fn length_pt(value: &str, font_size: f32) -> Option<f32> {
    let v = value.trim().to_ascii_lowercase();
    let split = v
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(v.len());
    let (num, unit) = v.split_at(split);
    let n: f32 = num.parse().ok()?;
    let pt = match unit {
        "" | "px" => n * PX_TO_PT,
        "pt" => n,
        "mm" => n * MM_TO_PT,
        "cm" => n * MM_TO_PT * 10.0,
        "in" => n * 72.0,
        "pc" => n * 12.0,
        "em" => n * font_size,
        "rem" => n * ROOT_FONT_SIZE_PT,
        _ => return None,
    };
    Some(pt)
}

/// Parse 1-4 lengths into edges (`margin`, `padding`, `border-width`).
/// `auto` counts as zero.
pub fn parse_edges(value: &str, font_size: f32) -> Option<Edges> {
    let values: Option<Vec<f32>> = value
        .split_whitespace()
        .map(|v| {
            if v.eq_ignore_ascii_case("auto") {
                Some(0.0)
            } else {
                length_pt(v, font_size)
            }
        })
        .collect();
    Edges::from_shorthand(&values?)
}

/// Parse a CSS color: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`,
/// `rgb()` / `rgba()`, `transparent` or a common name.
pub fn parse_color(value: &str) -> Option<Color> {
    let v = value.trim().to_ascii_lowercase();
    if let Some(hex) = v.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(args) = v
        .strip_prefix("rgba(")
        .or_else(|| v.strip_prefix("rgb("))
        .and_then(|s| s.strip_suffix(')'))
    {
        return parse_rgb_args(args);
    }
    named_color(&v)
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
    let short = |i: usize| channel(&hex[i..i + 1].repeat(2));
    match hex.len() {
        3 => Some(Color::rgb(short(0)?, short(1)?, short(2)?)),
        4 => Some(Color {
            a: short(3)?,
            ..Color::rgb(short(0)?, short(1)?, short(2)?)
        }),
        6 => Some(Color::rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        8 => Some(Color {
            a: channel(&hex[6..8])?,
            ..Color::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )
        }),
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<Color> {
    let parts: Vec<&str> = args
        .split([',', '/', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() < 3 || parts.len() > 4 {
        return None;
    }
    let channel = |s: &str| -> Option<f32> {
        match s.strip_suffix('%') {
            Some(p) => p.parse::<f32>().ok().map(|p| p / 100.0),
            None => s.parse::<f32>().ok().map(|v| v / 255.0),
        }
    };
    let alpha = match parts.get(3) {
        Some(a) => match a.strip_suffix('%') {
            Some(p) => p.parse::<f32>().ok()? / 100.0,
            None => a.parse::<f32>().ok()?,
        },
        None => 1.0,
    };
    Some(Color {
        r: channel(parts[0])?.clamp(0.0, 1.0),
        g: channel(parts[1])?.clamp(0.0, 1.0),
        b: channel(parts[2])?.clamp(0.0, 1.0),
        a: alpha.clamp(0.0, 1.0),
    })
}

fn named_color(name: &str) -> Option<Color> {
    let hex = match name {
        "transparent" => return Some(Color::TRANSPARENT),
        "black" => "000000",
        "white" => "ffffff",
        "red" => "ff0000",
        "green" => "008000",
        "blue" => "0000ff",
        "yellow" => "ffff00",
        "orange" => "ffa500",
        "purple" => "800080",
        "gray" | "grey" => "808080",
        "darkgray" | "darkgrey" => "a9a9a9",
        "lightgray" | "lightgrey" => "d3d3d3",
        "dimgray" | "dimgrey" => "696969",
        "silver" => "c0c0c0",
        "navy" => "000080",
        "maroon" => "800000",
        "olive" => "808000",
        "teal" => "008080",
        "aqua" | "cyan" => "00ffff",
        "fuchsia" | "magenta" => "ff00ff",
        "lime" => "00ff00",
        "steelblue" => "4682b4",
        "darkblue" => "00008b",
        "whitesmoke" => "f5f5f5",
        _ => return None,
    };
    parse_hex(hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_html, DomNode};

    fn element(html: &str) -> ElementNode {
        match parse_html(html).into_iter().next() {
            Some(DomNode::Element(e)) => e,
            other => panic!("Expected element, got {other:?}"),
        }
    }

    #[test]
    fn parses_rules_and_selector_lists() {
        let sheet = parse_stylesheet("/* c */ h1, .name { color: red; } p { margin: 0 }");
        assert_eq!(sheet.rules.len(), 3);
        assert_eq!(sheet.rules[1].declarations[0].property, "color");
        assert_eq!(sheet.rules[2].order, 2);
    }

    #[test]
    fn page_rule_size_and_margin() {
        let sheet = parse_stylesheet("@page { size: A4 landscape; margin: 12mm; }");
        assert_eq!(sheet.page.size, Some((595.28, 841.89)));
        assert_eq!(sheet.page.landscape, Some(true));
        let margin = sheet.page.margin.unwrap();
        assert!((margin.left - 34.015).abs() < 0.01);
    }

    #[test]
    fn media_print_applies_screen_does_not() {
        let sheet = parse_stylesheet(
            "@media screen { .a { color: red } } @media print { .b { color: blue } }",
        );
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].selector, Selector::parse(".b").unwrap());
    }

    #[test]
    fn unsupported_selectors_are_skipped() {
        let sheet = parse_stylesheet("a:hover, li + li, .ok { color: red }");
        assert_eq!(sheet.rules.len(), 1);
    }

    #[test]
    fn specificity_counts() {
        let sel = Selector::parse("div#main .entry > p.title").unwrap();
        assert_eq!(sel.specificity(), (1, 2, 2));
    }

    #[test]
    fn descendant_and_child_matching() {
        let outer = element(r#"<div class="entry-highlights"></div>"#);
        let ul = element("<ul></ul>");
        let li = element("<li></li>");

        let desc = Selector::parse(".entry-highlights li").unwrap();
        assert!(desc.matches(&li, &[&outer, &ul]));

        let child = Selector::parse(".entry-highlights > li").unwrap();
        assert!(!child.matches(&li, &[&outer, &ul]));
        assert!(child.matches(&li, &[&ul, &outer]));
    }

    #[test]
    fn important_and_inline_declarations() {
        let decls = parse_declarations("color: red !important; background: url(data:x;y); ;");
        assert_eq!(decls.len(), 2);
        assert!(decls[0].important);
        assert_eq!(decls[0].value, "red");
        assert_eq!(decls[1].value, "url(data:x;y)");
    }

    #[test]
    fn lengths_convert_to_points() {
        assert_eq!(length_pt("16px", 12.0), Some(12.0));
        assert_eq!(length_pt("10pt", 12.0), Some(10.0));
        assert_eq!(length_pt("1in", 12.0), Some(72.0));
        assert_eq!(length_pt("2em", 9.0), Some(18.0));
        assert_eq!(length_pt("1rem", 9.0), Some(ROOT_FONT_SIZE_PT));
        assert_eq!(length_pt("35%", 12.0), None);
    }

    #[test]
    fn colors() {
        let c = parse_color("#1e3a5f").unwrap();
        assert!((c.r - 30.0 / 255.0).abs() < 0.001);
        assert_eq!(parse_color("#fff"), Some(Color::WHITE));
        assert_eq!(parse_color("rgba(0, 0, 0, 0.5)").unwrap().a, 0.5);
        assert_eq!(parse_color("white"), Some(Color::WHITE));
        assert!(parse_color("transparent").unwrap().is_transparent());
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("nonsense"), None);
    }

    #[test]
    fn edges_shorthand() {
        let e = parse_edges("4pt 8pt", 12.0).unwrap();
        assert_eq!(e, Edges { top: 4.0, right: 8.0, bottom: 4.0, left: 8.0 });
        assert_eq!(parse_edges("0", 12.0), Some(Edges::uniform(0.0)));
        assert_eq!(parse_edges("1pt 2pt 3pt 4pt 5pt", 12.0), None);
    }
}
