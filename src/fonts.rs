//! Font selection and text measurement using `ttf-parser`.
//!
//! The PDF is drawn with the base-14 Helvetica / Times / Courier faces, which
//! carry no embedded metrics. When the metric-compatible Liberation faces are
//! installed we measure glyph advances from them; otherwise a per-character
//! width table approximates the base-14 faces.

use std::collections::HashMap;

/// Ascender / descender of the base-14 faces, in em units (Helvetica AFM).
const BUILTIN_ASCENT: f32 = 0.718;
const BUILTIN_DESCENT: f32 = 0.207;

/// Code points whose advances are cached from a loaded face. Everything the
/// PDF can draw with WinAnsiEncoding falls inside these.
const CACHED_RANGES: &[(u32, u32)] = &[(0x20, 0x24F), (0x2000, 0x206F), (0x20AC, 0x20AC), (0x2122, 0x2122)];

/// Generic family the PDF renderer can draw with a base-14 font.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq)]
pub enum FontFamily {
    #[default]
    SansSerif,
    Serif,
    Monospace,
}

impl FontFamily {
    /// Map a CSS `font-family` list to the first family we recognize.
    pub fn from_css(list: &str) -> Self {
        for name in list.split(',') {
            let name = name.trim().trim_matches(['"', '\'']).to_ascii_lowercase();
            let family = match name.as_str() {
                "helvetica" | "helvetica neue" | "arial" | "liberation sans" | "sans-serif"
                | "system-ui" | "verdana" | "roboto" | "inter" | "open sans" | "segoe ui"
                | "dejavu sans" => Self::SansSerif,
                "times" | "times new roman" | "georgia" | "garamond" | "liberation serif"
                | "serif" | "cambria" => Self::Serif,
                "courier" | "courier new" | "liberation mono" | "monospace" | "menlo"
                | "consolas" => Self::Monospace,
                _ => continue,
            };
            return family;
        }
        Self::SansSerif
    }

    fn liberation_name(self) -> &'static str {
        match self {
            Self::SansSerif => "Liberation Sans",
            Self::Serif => "Liberation Serif",
            Self::Monospace => "Liberation Mono",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: FontFamily,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: FontFamily, bold: bool, italic: bool) -> Self {
        Self {
            family,
            bold,
            italic,
        }
    }

    fn liberation_query(&self) -> fontdb::Query<'static> {
        const SANS: &[fontdb::Family<'static>] = &[fontdb::Family::Name("Liberation Sans")];
        const SERIF: &[fontdb::Family<'static>] = &[fontdb::Family::Name("Liberation Serif")];
        const MONO: &[fontdb::Family<'static>] = &[fontdb::Family::Name("Liberation Mono")];
        let families = match self.family {
            FontFamily::SansSerif => SANS,
            FontFamily::Serif => SERIF,
            FontFamily::Monospace => MONO,
        };
        fontdb::Query {
            families,
            weight: if self.bold {
                fontdb::Weight::BOLD
            } else {
                fontdb::Weight::NORMAL
            },
            stretch: fontdb::Stretch::Normal,
            style: if self.italic {
                fontdb::Style::Italic
            } else {
                fontdb::Style::Normal
            },
        }
    }
}

/// Metrics of a loaded font face. Advances are read once at load time.
#[derive(Debug, Clone)]
pub struct FontData {
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
    advances: HashMap<char, u16>,
}

/// Measures text for the layout engine.
#[derive(Default, Clone)]
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
}

impl FontManager {
    /// A manager with no loaded faces; every measurement uses the heuristic.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load Liberation faces from the fonts installed on the system.
    /// Missing faces fall back to the heuristic silently.
    pub fn with_system_metrics() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Self::from_database(&db)
    }

    /// Load the Liberation faces found in `db`.
    pub fn from_database(db: &fontdb::Database) -> Self {
        let mut mgr = Self::new();
        for family in [FontFamily::SansSerif, FontFamily::Serif, FontFamily::Monospace] {
            for (bold, italic) in [(false, false), (true, false), (false, true), (true, true)] {
                let key = FontKey::new(family, bold, italic);
                let Some(id) = db.query(&key.liberation_query()) else {
                    continue;
                };
                let loaded = db.with_face_data(id, |bytes, index| mgr.load_font(key, bytes, index));
                if let Some(Err(e)) = loaded {
                    log::warn!("Ignoring {} face: {e}", family.liberation_name());
                }
            }
        }
        log::debug!("Loaded {} system font faces for metrics", mgr.fonts.len());
        mgr
    }

    /// Load a TTF/OTF face from bytes.
    pub fn load_font(
        &mut self,
        key: FontKey,
        bytes: &[u8],
        index: u32,
    ) -> Result<(), ttf_parser::FaceParsingError> {
        let face = ttf_parser::Face::parse(bytes, index)?;
        let advances = CACHED_RANGES
            .iter()
            .flat_map(|&(lo, hi)| (lo..=hi).filter_map(char::from_u32))
            .filter_map(|ch| {
                let gid = face.glyph_index(ch)?;
                Some((ch, face.glyph_hor_advance(gid)?))
            })
            .collect();
        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            advances,
        };
        self.fonts.insert(key, data);
        Ok(())
    }

    pub fn has_real_fonts(&self) -> bool {
        !self.fonts.is_empty()
    }

    /// Width of `text` in points.
    pub fn measure_text_width(&self, text: &str, font_size: f32, key: FontKey) -> f32 {
        let Some(data) = self.fonts.get(&key) else {
            return text
                .chars()
                .map(|c| heuristic_advance(c, key))
                .sum::<f32>()
                * font_size;
        };

        let scale = font_size / data.units_per_em;
        text.chars()
            .map(|ch| match data.advances.get(&ch) {
                Some(&advance) => advance as f32 * scale,
                None => heuristic_advance(ch, key) * font_size,
            })
            .sum()
    }

    /// Height of one line box in points.
    pub fn line_height_pt(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }
}

/// Distance from the top of a line box to the baseline, centring the
/// base-14 glyph box in the line the way browsers split half-leading.
pub fn baseline_offset(font_size: f32, line_height: f32) -> f32 {
    let content = (BUILTIN_ASCENT + BUILTIN_DESCENT) * font_size;
    (line_height - content) / 2.0 + BUILTIN_ASCENT * font_size
}

/// Approximate advance of `c` in em units.
fn heuristic_advance(c: char, key: FontKey) -> f32 {
    if key.family == FontFamily::Monospace {
        return 0.6;
    }
    let base = match c {
        ' ' => 0.278,
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' => 0.25,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '-' | '/' => 0.333,
        'm' | 'M' | 'W' => 0.833,
        'w' => 0.722,
        '@' => 1.0,
        c if c.is_ascii_digit() => 0.556,
        c if c.is_uppercase() => 0.667,
        c if c.is_lowercase() => 0.530,
        _ => 0.584,
    };
    let weight = if key.bold { 1.07 } else { 1.0 };
    let family = if key.family == FontFamily::Serif { 0.92 } else { 1.0 };
    base * weight * family
}

/// Word-wrap text to fit within `max_width` points. Explicit `\n` always
/// breaks. Words wider than the line are kept whole.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    key: FontKey,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let space = fonts.measure_text_width(" ", font_size, key);
    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        let mut current_width = 0.0f32;
        for word in words {
            let w = fonts.measure_text_width(word, font_size, key);
            if current_line.is_empty() {
                current_line.push_str(word);
                current_width = w;
            } else if max_width > 0.0 && current_width + space + w > max_width {
                lines.push(std::mem::take(&mut current_line));
                current_line.push_str(word);
                current_width = w;
            } else {
                current_line.push(' ');
                current_line.push_str(word);
                current_width += space + w;
            }
        }
        lines.push(current_line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const SANS: FontKey = FontKey {
        family: FontFamily::SansSerif,
        bold: false,
        italic: false,
    };

    #[test]
    fn css_family_lists() {
        assert_eq!(
            FontFamily::from_css("Helvetica Neue, Helvetica, Arial, sans-serif"),
            FontFamily::SansSerif
        );
        assert_eq!(FontFamily::from_css("'Fancy Font', Georgia, serif"), FontFamily::Serif);
        assert_eq!(FontFamily::from_css("\"Courier New\""), FontFamily::Monospace);
        assert_eq!(FontFamily::from_css("Unknown"), FontFamily::SansSerif);
    }

    #[test]
    fn heuristic_text_width() {
        let mgr = FontManager::new();
        let mono = FontKey::new(FontFamily::Monospace, false, false);
        let w = mgr.measure_text_width("Hello", 10.0, mono);
        assert!((w - 30.0).abs() < 0.01);

        let regular = mgr.measure_text_width("Hello", 10.0, SANS);
        let bold = mgr.measure_text_width("Hello", 10.0, FontKey::new(FontFamily::SansSerif, true, false));
        assert!(bold > regular);
        assert!(mgr.measure_text_width("iii", 10.0, SANS) < mgr.measure_text_width("MMM", 10.0, SANS));
    }

    #[test]
    fn word_wrap_basic() {
        let mgr = FontManager::new();
        let lines = wrap_text("Hello world foo bar", 16.0, SANS, 60.0, &mgr);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
        assert!(lines.iter().all(|l| !l.starts_with(' ')));
    }

    #[test]
    fn explicit_newlines_break() {
        let mgr = FontManager::new();
        let lines = wrap_text("one\ntwo", 10.0, SANS, 1000.0, &mgr);
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn long_word_stays_whole() {
        let mgr = FontManager::new();
        let lines = wrap_text("supercalifragilistic", 10.0, SANS, 20.0, &mgr);
        assert_eq!(lines, vec!["supercalifragilistic"]);
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        let mut mgr = FontManager::new();
        assert!(mgr.load_font(SANS, b"not a font", 0).is_err());
        assert!(!mgr.has_real_fonts());
    }

    #[test]
    fn empty_database_uses_heuristic() {
        let mgr = FontManager::from_database(&fontdb::Database::new());
        assert!(!mgr.has_real_fonts());
        assert_eq!(
            mgr.measure_text_width("Hello", 10.0, SANS),
            FontManager::new().measure_text_width("Hello", 10.0, SANS)
        );
    }

    #[test]
    fn cached_advances_match_the_face() {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        let Some(id) = db.query(&SANS.liberation_query()) else {
            // Liberation Sans is not installed here.
            return;
        };
        let expected = db
            .with_face_data(id, |bytes, index| {
                let face = ttf_parser::Face::parse(bytes, index).unwrap();
                let scale = 10.0 / face.units_per_em() as f32;
                "Hello"
                    .chars()
                    .map(|c| face.glyph_hor_advance(face.glyph_index(c).unwrap()).unwrap() as f32 * scale)
                    .sum::<f32>()
            })
            .unwrap();
        let mgr = FontManager::from_database(&db);
        assert!(mgr.has_real_fonts());
        assert!((mgr.measure_text_width("Hello", 10.0, SANS) - expected).abs() < 0.001);
    }

    #[test]
    fn baseline_sits_inside_line() {
        let b = baseline_offset(10.0, 14.0);
        assert!(b > 7.0 && b < 14.0);
    }
}
