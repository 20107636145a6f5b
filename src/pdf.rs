//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).

use std::collections::{BTreeSet, HashMap, HashSet};

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use printpdf::*;

use crate::error::ExportError;
use crate::fonts::{self, FontFamily, FontKey};
use crate::page_layout::*;

const PT_TO_MM: f32 = 25.4 / 72.0;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Render a LayoutConfig into PDF bytes.
///
/// Images whose `src` is not a base64 data URI, or whose bytes cannot be
/// decoded, are skipped with a warning.
pub fn render_pdf(config: &LayoutConfig) -> Result<Vec<u8>, ExportError> {
    if !(config.page_width_pt > 0.0 && config.page_height_pt > 0.0) {
        return Err(ExportError::Pdf(format!(
            "invalid page size {}x{} pt",
            config.page_width_pt, config.page_height_pt
        )));
    }
    let page_w = Mm(config.page_width_pt * PT_TO_MM);
    let page_h = Mm(config.page_height_pt * PT_TO_MM);

    let unsupported = unsupported_chars(config);
    if !unsupported.is_empty() {
        let list: String = unsupported.iter().collect();
        log::warn!(
            "{} character(s) have no glyph in the built-in fonts and are drawn as '?': {list}",
            unsupported.len()
        );
    }

    let mut doc = PdfDocument::new(&config.title);

    // ── Pre-register all images ────────────────────────────────────────────
    let mut all_srcs: HashSet<&str> = HashSet::new();
    for page_layout in &config.pages {
        for lbox in &page_layout.boxes {
            collect_image_srcs(lbox, &mut all_srcs);
        }
    }

    let mut image_resources: HashMap<String, ImageResource> = HashMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();
    for src in all_srcs {
        let bytes = match parse_data_uri(src) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Skipping image: {e}");
                continue;
            }
        };
        let dyn_img = match ::image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Skipping image: decode error: {e}");
                continue;
            }
        };
        let raw = match RawImage::decode_from_bytes(&bytes, &mut img_warnings) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping image: PDF encode error: {e}");
                continue;
            }
        };
        let xobj_id = doc.add_image(&raw);
        image_resources.insert(
            src.to_string(),
            ImageResource {
                xobj_id,
                px_width: dyn_img.width(),
                px_height: dyn_img.height(),
            },
        );
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages: Vec<PdfPage> = config
        .pages
        .iter()
        .map(|page_layout| {
            let mut ops = Vec::new();
            for lbox in &page_layout.boxes {
                render_box(&mut ops, lbox, config.page_height_pt, &image_resources);
            }
            PdfPage::new(page_w, page_h, ops)
        })
        .collect();
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }
    log::debug!("Writing {} PDF page(s)", pages.len());

    doc.with_pages(pages);
    Ok(doc.save(&PdfSaveOptions::default(), &mut Vec::new()))
}

/// The base-14 face for a family / weight / slant combination.
fn builtin_font(key: FontKey) -> BuiltinFont {
    match (key.family, key.bold, key.italic) {
        (FontFamily::SansSerif, false, false) => BuiltinFont::Helvetica,
        (FontFamily::SansSerif, true, false) => BuiltinFont::HelveticaBold,
        (FontFamily::SansSerif, false, true) => BuiltinFont::HelveticaOblique,
        (FontFamily::SansSerif, true, true) => BuiltinFont::HelveticaBoldOblique,
        (FontFamily::Serif, false, false) => BuiltinFont::TimesRoman,
        (FontFamily::Serif, true, false) => BuiltinFont::TimesBold,
        (FontFamily::Serif, false, true) => BuiltinFont::TimesItalic,
        (FontFamily::Serif, true, true) => BuiltinFont::TimesBoldItalic,
        (FontFamily::Monospace, false, false) => BuiltinFont::Courier,
        (FontFamily::Monospace, true, false) => BuiltinFont::CourierBold,
        (FontFamily::Monospace, false, true) => BuiltinFont::CourierOblique,
        (FontFamily::Monospace, true, true) => BuiltinFont::CourierBoldOblique,
    }
}

/// Translucent colours are flattened against the white page.
fn pdf_color(c: [f32; 4]) -> Color {
    let blend = |v: f32| v * c[3] + (1.0 - c[3]);
    Color::Rgb(Rgb {
        r: blend(c[0]),
        g: blend(c[1]),
        b: blend(c[2]),
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

fn fill_rect(ops: &mut Vec<Op>, x: f32, y_bottom: f32, w: f32, h: f32, color: [f32; 4]) {
    ops.push(Op::SetFillColor {
        col: pdf_color(color),
    });
    ops.push(Op::DrawPolygon {
        polygon: Polygon {
            rings: vec![PolygonRing {
                points: vec![
                    point(x, y_bottom),
                    point(x + w, y_bottom),
                    point(x + w, y_bottom + h),
                    point(x, y_bottom + h),
                ],
            }],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        },
    });
}

fn stroke_line(ops: &mut Vec<Op>, from: (f32, f32), to: (f32, f32), width: f32, color: [f32; 4]) {
    ops.push(Op::SetOutlineColor {
        col: pdf_color(color),
    });
    ops.push(Op::SetOutlineThickness { pt: Pt(width) });
    ops.push(Op::DrawLine {
        line: Line {
            points: vec![point(from.0, from.1), point(to.0, to.1)],
            is_closed: false,
        },
    });
}

/// The Windows-1252 byte for `c`, if the base-14 fonts can draw it.
fn winansi_byte(c: char) -> Option<u8> {
    let b = match c {
        '\u{20AC}' => 0x80, // euro
        '\u{201A}' => 0x82, // single low-9 quote
        '\u{201E}' => 0x84, // double low-9 quote
        '\u{2026}' => 0x85, // ellipsis
        '\u{2018}' => 0x91, // left single quote
        '\u{2019}' => 0x92, // right single quote
        '\u{201C}' => 0x93, // left double quote
        '\u{201D}' => 0x94, // right double quote
        '\u{2022}' => 0x95, // bullet
        '\u{2013}' => 0x96, // en dash
        '\u{2014}' => 0x97, // em dash
        '\u{2122}' => 0x99, // trademark
        '\u{00A0}' => 0x20, // non-breaking space
        c if (c as u32) < 256 => c as u8,
        _ => return None,
    };
    Some(b)
}

/// Characters in the layout that will be drawn as `?`.
fn unsupported_chars(config: &LayoutConfig) -> BTreeSet<char> {
    config
        .text_lines()
        .flat_map(str::chars)
        .filter(|&c| winansi_byte(c).is_none())
        .collect()
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s.chars().map(|c| winansi_byte(c).unwrap_or(b'?')).collect();
    // SAFETY: intentionally non-UTF-8 for the 0x80-0xFF range; printpdf passes
    // these bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

/// Parse a `data:<mime>;base64,<data>` URI and return the decoded bytes.
pub(crate) fn parse_data_uri(src: &str) -> Result<Vec<u8>, String> {
    let Some(rest) = src.strip_prefix("data:") else {
        let preview: String = src.chars().take(80).collect();
        return Err(format!("image src must be a base64 data URI, got {preview:?}"));
    };
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| "invalid data URI: missing `,` after the header".to_string())?;
    if !header.contains(";base64") {
        return Err("only base64-encoded data URIs are supported".to_string());
    }
    BASE64_STD
        .decode(data.trim())
        .map_err(|e| format!("base64 decode error: {e}"))
}

/// Recursively collect all unique `image.src` strings from a [`LayoutBox`] tree.
fn collect_image_srcs<'a>(lbox: &'a LayoutBox, srcs: &mut HashSet<&'a str>) {
    if let Some(img) = &lbox.image {
        srcs.insert(img.src.as_str());
    }
    for child in &lbox.children {
        collect_image_srcs(child, srcs);
    }
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    page_height: f32,
    images: &HashMap<String, ImageResource>,
) {
    // PDF origin is bottom-left; layout origin is top-left.
    let top = page_height - lbox.y;
    let bottom = top - lbox.height;
    let (left, right) = (lbox.x, lbox.x + lbox.width);

    if let Some(bg) = lbox.background_color {
        fill_rect(ops, left, bottom, lbox.width, lbox.height, bg);
    }

    // Each border is stroked along the middle of its band.
    let b = &lbox.border;
    if let Some(e) = b.top {
        let y = top - e.width / 2.0;
        stroke_line(ops, (left, y), (right, y), e.width, e.color);
    }
    if let Some(e) = b.bottom {
        let y = bottom + e.width / 2.0;
        stroke_line(ops, (left, y), (right, y), e.width, e.color);
    }
    if let Some(e) = b.left {
        let x = left + e.width / 2.0;
        stroke_line(ops, (x, bottom), (x, top), e.width, e.color);
    }
    if let Some(e) = b.right {
        let x = right - e.width / 2.0;
        stroke_line(ops, (x, bottom), (x, top), e.width, e.color);
    }

    if let Some(text) = &lbox.text {
        render_text(ops, lbox, text, top);
    }

    if let Some(img) = &lbox.image {
        if let Some(res) = images.get(&img.src) {
            // At dpi=72 printpdf renders 1 px = 1 pt.
            let scale = |target: f32, px: u32| if px > 0 { target / px as f32 } else { 1.0 };
            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(lbox.x)),
                    translate_y: Some(Pt(top - img.height)),
                    dpi: Some(72.0),
                    scale_x: Some(scale(img.width, res.px_width)),
                    scale_y: Some(scale(img.height, res.px_height)),
                    rotate: None,
                },
            });
        }
    }

    for child in &lbox.children {
        render_box(ops, child, page_height, images);
    }
}

fn render_text(ops: &mut Vec<Op>, lbox: &LayoutBox, text: &TextContent, top: f32) {
    let font = builtin_font(text.font);
    let baseline = fonts::baseline_offset(text.font_size, text.line_height);

    for tline in text.lines.iter().filter(|l| !l.text.is_empty()) {
        let x = lbox.x + tline.x_offset;
        let y = top - tline.y_offset - baseline;

        ops.push(Op::StartTextSection);
        ops.push(Op::SetTextCursor {
            pos: Point { x: Pt(x), y: Pt(y) },
        });
        ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(text.font_size),
            font,
        });
        ops.push(Op::SetLineHeight {
            lh: Pt(text.line_height),
        });
        ops.push(Op::SetFillColor {
            col: pdf_color(text.color),
        });
        ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(to_winlatin(&tline.text))],
            font,
        });
        ops.push(Op::EndTextSection);

        if text.underline {
            let uy = y - text.font_size * 0.1;
            stroke_line(ops, (x, uy), (x + tline.width, uy), 0.5, text.color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED_PIXEL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn a4() -> LayoutConfig {
        LayoutConfig::new("Test", 595.28, 841.89)
    }

    #[test]
    fn render_empty_document() {
        let bytes = render_pdf(&a4()).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn render_text_borders_and_image() {
        let mut lbox = LayoutBox::new(40.0, 40.0, 200.0, 60.0);
        lbox.background_color = Some([0.9, 0.9, 0.9, 1.0]);
        lbox.border.bottom = Some(BorderEdge {
            width: 1.0,
            color: [0.0, 0.0, 0.0, 1.0],
        });
        lbox.text = Some(TextContent {
            lines: vec![TextLine {
                text: "Café – naïve".to_string(),
                x_offset: 0.0,
                y_offset: 0.0,
                width: 60.0,
            }],
            font: FontKey::new(FontFamily::Serif, true, false),
            font_size: 11.0,
            color: [0.1, 0.2, 0.3, 1.0],
            line_height: 14.0,
            underline: true,
        });
        let mut img = LayoutBox::new(40.0, 110.0, 20.0, 20.0);
        img.image = Some(ImageContent {
            src: RED_PIXEL_PNG.to_string(),
            width: 20.0,
            height: 20.0,
        });
        lbox.children.push(img);

        let mut config = a4();
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![lbox],
        });
        let bytes = render_pdf(&config).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn invalid_page_size_is_an_error() {
        let config = LayoutConfig::new("Bad", 0.0, 841.89);
        assert!(matches!(render_pdf(&config), Err(ExportError::Pdf(_))));
    }

    #[test]
    fn data_uri_parsing() {
        assert!(parse_data_uri(RED_PIXEL_PNG).is_ok());
        assert!(parse_data_uri("https://example.com/a.png").is_err());
        assert!(parse_data_uri("data:image/png,plain").is_err());
        assert!(parse_data_uri("data:image/png;base64").is_err());
    }

    #[test]
    fn builtin_faces_follow_family_and_weight() {
        assert!(matches!(
            builtin_font(FontKey::new(FontFamily::Monospace, true, true)),
            BuiltinFont::CourierBoldOblique
        ));
        assert!(matches!(builtin_font(FontKey::default()), BuiltinFont::Helvetica));
    }

    #[test]
    fn winlatin_maps_typographic_characters() {
        let s = to_winlatin("a\u{2013}b\u{2022}");
        assert_eq!(s.as_bytes(), &[b'a', 0x96, b'b', 0x95]);
    }

    #[test]
    fn characters_outside_winansi_are_reported_once() {
        let line = |t: &str| TextLine {
            text: t.to_string(),
            x_offset: 0.0,
            y_offset: 0.0,
            width: 10.0,
        };
        let mut lbox = LayoutBox::new(0.0, 0.0, 100.0, 20.0);
        lbox.text = Some(TextContent {
            lines: vec![line("\u{141}ukasz Dvo\u{159}\u{e1}k"), line("\u{141}\u{f3}d\u{17a}")],
            font: FontKey::default(),
            font_size: 10.0,
            color: [0.0, 0.0, 0.0, 1.0],
            line_height: 12.0,
            underline: false,
        });
        let mut config = a4();
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![lbox],
        });

        let missing: Vec<char> = unsupported_chars(&config).into_iter().collect();
        assert_eq!(missing, vec!['\u{141}', '\u{159}', '\u{17a}']);
        assert_eq!(to_winlatin("\u{141}a").as_bytes(), b"?a");
        assert!(render_pdf(&config).is_ok());
    }
}
