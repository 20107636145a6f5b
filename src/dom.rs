//! HTML parser – converts an HTML string into a simple DOM tree.
//!
//! We support the controlled subset the CV templates produce:
//! - Structural: html, body, div, section, header, footer, aside, main,
//!   article, p, h1-h4, ul, ol, li, table, tr, td, th, hr, img
//! - Inline: span, strong, b, em, i, a, small, br
//! - Metadata (parsed, never drawn): head, title, style, meta, link
//!
//! Styling comes from `class` / `id` / `style` attributes and from the
//! `<style>` blocks collected by [`collect_stylesheets`].

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// The tag name of a supported element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Html,
    Head,
    Body,
    Div,
    Section,
    Header,
    Footer,
    Aside,
    Main,
    Article,
    P,
    H1,
    H2,
    H3,
    H4,
    Ul,
    Ol,
    Li,
    Table,
    Tr,
    Td,
    Th,
    Span,
    Strong,
    B,
    Em,
    I,
    A,
    Small,
    Img,
    Br,
    Hr,
    Style,
    Title,
    Meta,
    Link,
    /// Catch-all for unknown tags – they are kept but treated as divs.
    Unknown(String),
}

impl Tag {
    pub fn from_name(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "html" => Tag::Html,
            "head" => Tag::Head,
            "body" => Tag::Body,
            "div" => Tag::Div,
            "section" => Tag::Section,
            "header" => Tag::Header,
            "footer" => Tag::Footer,
            "aside" => Tag::Aside,
            "main" => Tag::Main,
            "article" => Tag::Article,
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "h4" => Tag::H4,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "table" => Tag::Table,
            "tr" => Tag::Tr,
            "td" => Tag::Td,
            "th" => Tag::Th,
            "span" => Tag::Span,
            "strong" => Tag::Strong,
            "b" => Tag::B,
            "em" => Tag::Em,
            "i" => Tag::I,
            "a" => Tag::A,
            "small" => Tag::Small,
            "img" => Tag::Img,
            "br" => Tag::Br,
            "hr" => Tag::Hr,
            "style" => Tag::Style,
            "title" => Tag::Title,
            "meta" => Tag::Meta,
            "link" => Tag::Link,
            other => Tag::Unknown(other.to_string()),
        }
    }

    /// Lower-case tag name as used by CSS type selectors.
    pub fn name(&self) -> &str {
        match self {
            Tag::Html => "html",
            Tag::Head => "head",
            Tag::Body => "body",
            Tag::Div => "div",
            Tag::Section => "section",
            Tag::Header => "header",
            Tag::Footer => "footer",
            Tag::Aside => "aside",
            Tag::Main => "main",
            Tag::Article => "article",
            Tag::P => "p",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::H4 => "h4",
            Tag::Ul => "ul",
            Tag::Ol => "ol",
            Tag::Li => "li",
            Tag::Table => "table",
            Tag::Tr => "tr",
            Tag::Td => "td",
            Tag::Th => "th",
            Tag::Span => "span",
            Tag::Strong => "strong",
            Tag::B => "b",
            Tag::Em => "em",
            Tag::I => "i",
            Tag::A => "a",
            Tag::Small => "small",
            Tag::Img => "img",
            Tag::Br => "br",
            Tag::Hr => "hr",
            Tag::Style => "style",
            Tag::Title => "title",
            Tag::Meta => "meta",
            Tag::Link => "link",
            Tag::Unknown(name) => name,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Tag::Span | Tag::Strong | Tag::B | Tag::Em | Tag::I | Tag::A | Tag::Small | Tag::Br
        )
    }

    /// Elements that never produce boxes.
    pub fn is_metadata(&self) -> bool {
        matches!(
            self,
            Tag::Head | Tag::Style | Tag::Title | Tag::Meta | Tag::Link
        )
    }

    /// Elements without content or a closing tag.
    pub fn is_void(&self) -> bool {
        matches!(self, Tag::Img | Tag::Br | Tag::Hr | Tag::Meta | Tag::Link)
    }

    /// Elements whose content is raw text, not markup.
    fn is_raw_text(&self) -> bool {
        matches!(self, Tag::Style) || matches!(self, Tag::Unknown(n) if n == "script")
    }
}

/// A node in our DOM tree.
#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

/// An element node carrying tag, attributes, and children.
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|x| x == class))
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attr("style")
    }

    pub fn src(&self) -> Option<&str> {
        self.attr("src")
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[DomNode], out: &mut String) {
    for node in nodes {
        match node {
            DomNode::Text(t) => out.push_str(t),
            DomNode::Element(e) => collect_text(&e.children, out),
        }
    }
}

// ---------------------------------------------------------------------------
// Parser – simple recursive descent over HTML
// ---------------------------------------------------------------------------

/// Parse an HTML string into a list of DOM nodes.
///
/// A hand-written parser is enough for the controlled markup the templates
/// produce. Whitespace-only text is kept; the style pass decides whether it
/// separates inline content. Malformed input never fails: unknown constructs
/// are skipped and unclosed elements are closed at end of input.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    let mut nodes = parser.parse_nodes();
    // Stray closing tags at top level are dropped.
    while !parser.eof() {
        parser.skip_past(">");
        nodes.extend(parser.parse_nodes());
    }
    nodes
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        loop {
            if self.eof() || self.starts_with("</") {
                break;
            }
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Option<DomNode> {
        if self.starts_with("<!--") {
            self.skip_comment();
            return None;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            // Doctype / processing instruction
            self.skip_past(">");
            return None;
        }
        let next_is_name = self.input[self.pos..]
            .chars()
            .nth(1)
            .is_some_and(|c| c.is_ascii_alphabetic());
        if self.starts_with("<") && next_is_name {
            Some(self.parse_element())
        } else {
            Some(self.parse_text())
        }
    }

    fn parse_text(&mut self) -> DomNode {
        let start = self.pos;
        // A stray '<' that does not open a tag is literal text.
        self.advance(1);
        while !self.eof() && !self.starts_with("<") {
            self.advance(1);
        }
        let text = &self.input[start..self.pos];
        DomNode::Text(decode_entities(text))
    }

    fn parse_element(&mut self) -> DomNode {
        // Consume '<'
        self.advance(1);
        let tag_name = self.parse_name();
        let tag = Tag::from_name(&tag_name);
        let mut elem = ElementNode::new(tag);

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let before = self.pos;
            let (key, value) = self.parse_attribute();
            if self.pos == before {
                // Junk inside the tag; skip a character so we make progress.
                self.advance(1);
                continue;
            }
            if !key.is_empty() {
                elem.attributes.insert(key.to_ascii_lowercase(), value);
            }
        }

        if self.starts_with("/>") {
            self.advance(2);
            return DomNode::Element(elem);
        }
        if self.starts_with(">") {
            self.advance(1);
        }
        if elem.tag.is_void() {
            return DomNode::Element(elem);
        }

        if elem.tag.is_raw_text() {
            let close = format!("</{}", elem.tag.name());
            let rest = &self.input[self.pos..];
            let end = rest
                .to_ascii_lowercase()
                .find(&close)
                .unwrap_or(rest.len());
            let raw = &rest[..end];
            if !raw.trim().is_empty() {
                elem.children.push(DomNode::Text(raw.to_string()));
            }
            self.pos += end;
        } else {
            elem.children = self.parse_nodes();
        }

        // Consume closing tag
        if self.starts_with("</") {
            self.advance(2);
            self.parse_name();
            self.skip_past(">");
        }

        DomNode::Element(elem)
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ':' {
                self.advance(1);
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.advance(1); // skip '='
        self.skip_whitespace();
        let value = self.parse_attr_value();
        (key, value)
    }

    fn parse_attr_value(&mut self) -> String {
        for quote in ["\"", "'"] {
            if self.starts_with(quote) {
                self.advance(1);
                let start = self.pos;
                while !self.eof() && !self.starts_with(quote) {
                    self.advance(1);
                }
                let val = &self.input[start..self.pos];
                if !self.eof() {
                    self.advance(1);
                }
                return decode_entities(val);
            }
        }
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_whitespace() || c == '>' {
                break;
            }
            self.advance(1);
        }
        decode_entities(&self.input[start..self.pos])
    }

    fn skip_whitespace(&mut self) {
        while !self.eof() && self.current_char().is_whitespace() {
            self.advance(1);
        }
    }

    fn skip_comment(&mut self) {
        self.advance(4); // skip <!--
        match self.input[self.pos..].find("-->") {
            Some(i) => self.pos += i + 3,
            None => self.pos = self.input.len(),
        }
    }

    fn skip_past(&mut self, s: &str) {
        match self.input[self.pos..].find(s) {
            Some(i) => self.pos += i + s.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn advance(&mut self, n: usize) {
        // Advance by `n` characters (not bytes).
        for _ in 0..n {
            if let Some(c) = self.input[self.pos..].chars().next() {
                self.pos += c.len_utf8();
            }
        }
    }
}

/// Decode named and numeric character references in a single pass, so
/// `&amp;lt;` stays `&lt;`.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest[1..]
            .find(';')
            .filter(|&end| end > 0 && end <= 10)
            .and_then(|end| decode_entity(&rest[1..=end]).map(|c| (c, end + 2)));
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "middot" => '\u{00B7}',
        "bull" => '\u{2022}',
        "hellip" => '\u{2026}',
        "copy" => '\u{00A9}',
        "euro" => '\u{20AC}',
        _ => return None,
    };
    Some(c)
}

// ---------------------------------------------------------------------------
// Convenience helpers
// ---------------------------------------------------------------------------

/// Depth-first search for the first element with `tag`.
pub fn find_element<'a>(nodes: &'a [DomNode], tag: &Tag) -> Option<&'a ElementNode> {
    nodes.iter().find_map(|node| match node {
        DomNode::Element(e) if e.tag == *tag => Some(e),
        DomNode::Element(e) => find_element(&e.children, tag),
        DomNode::Text(_) => None,
    })
}

/// The `<body>` element. Documents without one get a synthetic body holding
/// every non-metadata node.
pub fn body_element(nodes: &[DomNode]) -> ElementNode {
    if let Some(body) = find_element(nodes, &Tag::Body) {
        return body.clone();
    }
    let mut body = ElementNode::new(Tag::Body);
    body.children = content_nodes(nodes);
    body
}

fn content_nodes(nodes: &[DomNode]) -> Vec<DomNode> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) if e.tag == Tag::Html => out.extend(content_nodes(&e.children)),
            DomNode::Element(e) if e.tag.is_metadata() => {}
            other => out.push(other.clone()),
        }
    }
    out
}

/// Text of every `<style>` element, in document order.
pub fn collect_stylesheets(nodes: &[DomNode]) -> Vec<String> {
    let mut sheets = Vec::new();
    collect_styles_into(nodes, &mut sheets);
    sheets
}

fn collect_styles_into(nodes: &[DomNode], sheets: &mut Vec<String>) {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == Tag::Style {
                sheets.push(e.text_content());
            } else {
                collect_styles_into(&e.children, sheets);
            }
        }
    }
}

/// Whitespace-normalized `<title>` text, if present and non-empty.
pub fn document_title(nodes: &[DomNode]) -> Option<String> {
    let title = find_element(nodes, &Tag::Title)?.text_content();
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element(nodes: &[DomNode]) -> &ElementNode {
        match &nodes[0] {
            DomNode::Element(e) => e,
            DomNode::Text(t) => panic!("Expected element, got text {t:?}"),
        }
    }

    #[test]
    fn parse_simple_div() {
        let html = r#"<div class="entry first" id="top"><p>Hello</p></div>"#;
        let nodes = parse_html(html);
        assert_eq!(nodes.len(), 1);
        let e = first_element(&nodes);
        assert_eq!(e.tag, Tag::Div);
        assert_eq!(e.classes(), vec!["entry", "first"]);
        assert!(e.has_class("first"));
        assert_eq!(e.id(), Some("top"));
        assert_eq!(e.children.len(), 1);
    }

    #[test]
    fn void_elements_need_no_closing_tag() {
        let html = r#"<div><img src="a.png"><br><p>after</p></div>"#;
        let nodes = parse_html(html);
        let div = first_element(&nodes);
        assert_eq!(div.children.len(), 3);
        let DomNode::Element(img) = &div.children[0] else {
            panic!("Expected img element");
        };
        assert_eq!(img.src(), Some("a.png"));
    }

    #[test]
    fn parse_nested_inline() {
        let html = r#"<p>Hello <strong>world</strong>!</p>"#;
        let nodes = parse_html(html);
        let p = first_element(&nodes);
        assert_eq!(p.tag, Tag::P);
        assert_eq!(p.children.len(), 3); // "Hello ", <strong>, "!"
        assert_eq!(p.text_content(), "Hello world!");
    }

    #[test]
    fn parse_table() {
        let html = r#"<table><tr><th>Name</th><th>Age</th></tr><tr><td>Alice</td><td>30</td></tr></table>"#;
        let nodes = parse_html(html);
        let table = first_element(&nodes);
        assert_eq!(table.tag, Tag::Table);
        assert_eq!(table.children.len(), 2);
    }

    #[test]
    fn style_content_is_raw_text() {
        let html = "<head><style>.a > .b { color: red; }</style></head><body><p>x</p></body>";
        let nodes = parse_html(html);
        assert_eq!(collect_stylesheets(&nodes), vec![".a > .b { color: red; }"]);
        let body = body_element(&nodes);
        assert_eq!(body.children.len(), 1);
    }

    #[test]
    fn decodes_handlebars_escapes() {
        assert_eq!(decode_entities("O&#x27;Brien &amp; Co"), "O'Brien & Co");
        assert_eq!(decode_entities("a &#x3D; b"), "a = b");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
        assert_eq!(decode_entities("AT&T; fish & chips"), "AT&T; fish & chips");
    }

    #[test]
    fn title_and_synthetic_body() {
        let html = "<html><head><title>\n  Jane   Doe </title><meta charset=\"utf-8\"></head><div>x</div></html>";
        let nodes = parse_html(html);
        assert_eq!(document_title(&nodes).as_deref(), Some("Jane Doe"));
        let body = body_element(&nodes);
        assert_eq!(body.tag, Tag::Body);
        assert_eq!(body.children.len(), 1);
    }

    #[test]
    fn comments_and_doctype_are_skipped() {
        let nodes = parse_html("<!DOCTYPE html><!-- note --><p>x</p>");
        assert_eq!(nodes.len(), 1);
        assert_eq!(first_element(&nodes).tag, Tag::P);
    }
}
