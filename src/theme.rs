//! Style options – the `style:` section of a CV document merged over the
//! built-in defaults.
//!
//! Values are substituted verbatim into the stylesheet template; colors and
//! units are not validated.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::data::scalar_text;

/// Color options (`style.colors.*`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorOptions {
    pub primary: String,
    pub sidebar_bg: String,
    pub sidebar_text: String,
    pub body_text: String,
    pub muted_text: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Default for ColorOptions {
    fn default() -> Self {
        Self {
            primary: "#1e3a5f".to_string(),
            sidebar_bg: "#1e3a5f".to_string(),
            sidebar_text: "#ffffff".to_string(),
            body_text: "#333333".to_string(),
            muted_text: "#666666".to_string(),
            extra: BTreeMap::new(),
        }
    }
}

/// Font options (`style.fonts.*`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontOptions {
    pub main: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Default for FontOptions {
    fn default() -> Self {
        Self {
            main: "Helvetica Neue, Helvetica, Arial, sans-serif".to_string(),
            extra: BTreeMap::new(),
        }
    }
}

/// Spacing options (`style.spacing.*`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpacingOptions {
    pub sidebar_width: String,
    pub page_padding: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Default for SpacingOptions {
    fn default() -> Self {
        Self {
            sidebar_width: "35%".to_string(),
            page_padding: "12mm".to_string(),
            extra: BTreeMap::new(),
        }
    }
}

/// All style options after merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleOptions {
    pub colors: ColorOptions,
    pub fonts: FontOptions,
    pub spacing: SpacingOptions,
    /// Any other `style.*` groups, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StyleOptions {
    /// Merge a user `style` value over the defaults, key by key.
    ///
    /// Anything that is not a mapping is ignored; scalar values are
    /// stringified so `primary: 000000` still reaches the stylesheet.
    pub fn from_value(user: Option<&Value>) -> Self {
        let mut style = Self::default();
        let Some(user) = user.and_then(Value::as_object) else {
            return style;
        };

        for (group, value) in user {
            let Some(entries) = value.as_object() else {
                log::debug!("Ignoring non-mapping style group '{group}'");
                continue;
            };
            match group.as_str() {
                "colors" => merge_group(entries, &mut style.colors.extra, |key, val| {
                    let slot = match key {
                        "primary" => &mut style.colors.primary,
                        "sidebar_bg" => &mut style.colors.sidebar_bg,
                        "sidebar_text" => &mut style.colors.sidebar_text,
                        "body_text" => &mut style.colors.body_text,
                        "muted_text" => &mut style.colors.muted_text,
                        _ => return Some(val),
                    };
                    *slot = val;
                    None
                }),
                "fonts" => merge_group(entries, &mut style.fonts.extra, |key, val| {
                    if key == "main" {
                        style.fonts.main = val;
                        None
                    } else {
                        Some(val)
                    }
                }),
                "spacing" => merge_group(entries, &mut style.spacing.extra, |key, val| {
                    let slot = match key {
                        "sidebar_width" => &mut style.spacing.sidebar_width,
                        "page_padding" => &mut style.spacing.page_padding,
                        _ => return Some(val),
                    };
                    *slot = val;
                    None
                }),
                _ => {
                    style.extra.insert(group.clone(), value.clone());
                }
            }
        }
        style
    }
}

/// Apply every scalar entry of a group. `assign` stores known keys and hands
/// unknown ones back so they land in `extra`.
fn merge_group<F>(entries: &Map<String, Value>, extra: &mut BTreeMap<String, String>, mut assign: F)
where
    F: FnMut(&str, String) -> Option<String>,
{
    for (key, value) in entries {
        let Some(text) = scalar_text(value) else {
            continue;
        };
        if let Some(unknown) = assign(key, text) {
            extra.insert(key.clone(), unknown);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_when_style_missing() {
        let style = StyleOptions::from_value(None);
        assert_eq!(style.colors.primary, "#1e3a5f");
        assert_eq!(style.fonts.main, "Helvetica Neue, Helvetica, Arial, sans-serif");
        assert_eq!(style.spacing.sidebar_width, "35%");
        assert_eq!(style.spacing.page_padding, "12mm");
    }

    #[test]
    fn user_values_override_per_key() {
        let user = json!({"colors": {"primary": "#000000"}, "spacing": {"page_padding": "20mm"}});
        let style = StyleOptions::from_value(Some(&user));
        assert_eq!(style.colors.primary, "#000000");
        assert_eq!(style.colors.sidebar_bg, "#1e3a5f");
        assert_eq!(style.spacing.page_padding, "20mm");
        assert_eq!(style.spacing.sidebar_width, "35%");
    }

    #[test]
    fn unknown_keys_pass_through() {
        let user = json!({"colors": {"accent": "#ff0000"}, "borders": {"radius": "4px"}});
        let style = StyleOptions::from_value(Some(&user));
        assert_eq!(style.colors.extra["accent"], "#ff0000");
        assert_eq!(style.extra["borders"]["radius"], "4px");

        let ctx = serde_json::to_value(&style).unwrap();
        assert_eq!(ctx["colors"]["accent"], "#ff0000");
        assert_eq!(ctx["colors"]["primary"], "#1e3a5f");
    }

    #[test]
    fn scalars_are_stringified_and_garbage_ignored() {
        let user = json!({"colors": {"primary": 123456, "muted_text": null}, "fonts": "serif"});
        let style = StyleOptions::from_value(Some(&user));
        assert_eq!(style.colors.primary, "123456");
        assert_eq!(style.colors.muted_text, "#666666");
        assert_eq!(style.fonts, FontOptions::default());
    }
}
