//! Render context – normalizes a [`CvDocument`] into the shape the HTML
//! template binds against.
//!
//! Every section is optional. Absent or malformed sections become empty
//! lists so the template's `{{#if}}` blocks drop them.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::data::{scalar_text, CvDocument};
use crate::theme::StyleOptions;

/// Contact fields recognized in `personal` / `contact`, in display order.
const CONTACT_FIELDS: &[(&str, &str)] = &[
    ("email", "Email"),
    ("phone", "Phone"),
    ("location", "Location"),
    ("website", "Website"),
    ("linkedin", "LinkedIn"),
    ("github", "GitHub"),
];

/// Keys of `personal` that are not contact details.
const PERSONAL_FIELDS: &[&str] = &["name", "title", "summary", "avatar", "contact"];

const TITLE_ALIASES: &[&str] = &["title", "position", "role", "degree", "name"];
const ORGANIZATION_ALIASES: &[&str] = &[
    "organization",
    "company",
    "employer",
    "institution",
    "school",
    "issuer",
];

/// The data handed to the templates.
#[derive(Debug, Clone, Serialize)]
pub struct CvContext {
    pub personal: Map<String, Value>,
    pub contact: Vec<ContactItem>,
    pub summary: Option<String>,
    pub experience: Vec<Value>,
    pub education: Vec<Value>,
    pub certificates: Vec<Value>,
    pub projects: Vec<Value>,
    pub skills: Vec<SkillGroup>,
    pub languages: Vec<LanguageItem>,
    pub interests: Vec<String>,
    pub avatar: Option<String>,
    pub style: StyleOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactItem {
    pub key: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillGroup {
    pub category: Option<String>,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageItem {
    pub name: String,
    pub level: Option<String>,
}

/// Build the template context. `avatar` is the already-encoded data URI.
pub fn build_context(doc: &CvDocument, avatar: Option<String>) -> CvContext {
    let personal = personal_section(doc);
    let contact = contact_items(doc, &personal);
    let summary = personal
        .get("summary")
        .or_else(|| doc.get("summary"))
        .and_then(scalar_text);

    CvContext {
        contact,
        summary,
        experience: entries(doc.get("experience")),
        education: entries(doc.get("education")),
        certificates: entries(doc.get("certificates")),
        projects: entries(doc.get("projects")),
        skills: skill_groups(doc.get("skills")),
        languages: languages(doc.get("languages")),
        interests: text_list(doc.get("interests")),
        avatar,
        style: StyleOptions::from_value(doc.get("style")),
        personal,
    }
}

/// `personal`, with top-level `name` / `title` filling gaps.
fn personal_section(doc: &CvDocument) -> Map<String, Value> {
    let mut personal = doc.personal().cloned().unwrap_or_default();
    for key in ["name", "title"] {
        let missing = personal.get(key).and_then(scalar_text).is_none();
        if missing {
            if let Some(v) = doc.get(key).and_then(scalar_text) {
                personal.insert(key.to_string(), Value::String(v));
            }
        }
    }
    personal
}

fn contact_items(doc: &CvDocument, personal: &Map<String, Value>) -> Vec<ContactItem> {
    // Later sources only fill keys the earlier ones left empty.
    let mut merged: Map<String, Value> = Map::new();
    let sources = [
        Some(personal),
        personal.get("contact").and_then(Value::as_object),
        doc.get("contact").and_then(Value::as_object),
    ];
    for source in sources.into_iter().flatten() {
        for (key, value) in source {
            if PERSONAL_FIELDS.contains(&key.as_str()) || merged.contains_key(key) {
                continue;
            }
            if scalar_text(value).is_some() {
                merged.insert(key.clone(), value.clone());
            }
        }
    }

    let mut items = Vec::new();
    for (key, label) in CONTACT_FIELDS {
        if let Some(value) = merged.get(*key).and_then(scalar_text) {
            items.push(ContactItem {
                key: key.to_string(),
                label: label.to_string(),
                value,
            });
        }
    }
    for (key, value) in &merged {
        if CONTACT_FIELDS.iter().any(|(known, _)| *known == key.as_str()) {
            continue;
        }
        if let Some(value) = scalar_text(value) {
            items.push(ContactItem {
                key: key.clone(),
                label: humanize(key),
                value,
            });
        }
    }
    items
}

/// Normalize a list of entries, adding canonical `title` / `organization`
/// keys. Bare strings become `{title: ...}`.
fn entries(value: Option<&Value>) -> Vec<Value> {
    let Some(list) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    list.iter()
        .filter_map(|item| match item {
            Value::Object(map) => {
                let mut map = map.clone();
                fill_alias(&mut map, "title", TITLE_ALIASES);
                fill_alias(&mut map, "organization", ORGANIZATION_ALIASES);
                Some(Value::Object(map))
            }
            other => {
                let text = scalar_text(other)?;
                let mut map = Map::new();
                map.insert("title".to_string(), Value::String(text));
                Some(Value::Object(map))
            }
        })
        .collect()
}

fn fill_alias(map: &mut Map<String, Value>, canonical: &str, aliases: &[&str]) {
    if map.get(canonical).and_then(scalar_text).is_some() {
        return;
    }
    let found = aliases
        .iter()
        .filter(|alias| **alias != canonical)
        .find_map(|alias| map.get(*alias).and_then(scalar_text));
    if let Some(text) = found {
        map.insert(canonical.to_string(), Value::String(text));
    }
}

fn skill_groups(value: Option<&Value>) -> Vec<SkillGroup> {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(category, items)| {
                let items = text_list(Some(items));
                (!items.is_empty()).then(|| SkillGroup {
                    category: Some(category.clone()),
                    items,
                })
            })
            .collect(),
        Some(Value::Array(list)) => {
            // A list may hold plain skills or `{category, items}` groups.
            let mut groups = Vec::new();
            let mut loose = Vec::new();
            for item in list {
                match item {
                    Value::Object(map) => {
                        let items = text_list(map.get("items").or_else(|| map.get("skills")));
                        if !items.is_empty() {
                            groups.push(SkillGroup {
                                category: map
                                    .get("category")
                                    .or_else(|| map.get("name"))
                                    .and_then(scalar_text),
                                items,
                            });
                        }
                    }
                    other => loose.extend(scalar_text(other)),
                }
            }
            if !loose.is_empty() {
                groups.insert(
                    0,
                    SkillGroup {
                        category: None,
                        items: loose,
                    },
                );
            }
            groups
        }
        _ => Vec::new(),
    }
}

fn languages(value: Option<&Value>) -> Vec<LanguageItem> {
    let Some(list) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    list.iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(LanguageItem {
                name: map
                    .get("name")
                    .or_else(|| map.get("language"))
                    .and_then(scalar_text)?,
                level: map
                    .get("level")
                    .or_else(|| map.get("proficiency"))
                    .and_then(scalar_text),
            }),
            other => Some(LanguageItem {
                name: scalar_text(other)?,
                level: None,
            }),
        })
        .collect()
}

/// A scalar list. A single scalar becomes a one-element list.
fn text_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(list)) => list.iter().filter_map(scalar_text).collect(),
        Some(other) => scalar_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

/// `stack_overflow` → `Stack overflow`.
fn humanize(key: &str) -> String {
    let spaced = key.replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> CvDocument {
        CvDocument::from_yaml_str(yaml, ".").unwrap()
    }

    #[test]
    fn empty_document_builds_empty_sections() {
        let ctx = build_context(&doc(""), None);
        assert!(ctx.personal.is_empty());
        assert!(ctx.contact.is_empty());
        assert!(ctx.experience.is_empty());
        assert!(ctx.skills.is_empty());
        assert_eq!(ctx.style, StyleOptions::default());
    }

    #[test]
    fn top_level_name_and_contact_are_aliases() {
        let ctx = build_context(
            &doc("name: Jane Doe\ncontact:\n  email: jane@example.com\n  mastodon: '@jane'\n"),
            None,
        );
        assert_eq!(ctx.personal["name"], "Jane Doe");
        assert_eq!(ctx.contact.len(), 2);
        assert_eq!(ctx.contact[0].label, "Email");
        assert_eq!(ctx.contact[1].label, "Mastodon");
    }

    #[test]
    fn contact_fields_follow_display_order() {
        let ctx = build_context(
            &doc("personal:\n  name: A\n  github: gh/a\n  phone: '123'\n  email: a@b.c\n"),
            None,
        );
        let keys: Vec<&str> = ctx.contact.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["email", "phone", "github"]);
    }

    #[test]
    fn personal_wins_over_top_level_contact() {
        let ctx = build_context(
            &doc("personal:\n  email: first@x.y\ncontact:\n  email: second@x.y\n"),
            None,
        );
        assert_eq!(ctx.contact.len(), 1);
        assert_eq!(ctx.contact[0].value, "first@x.y");
    }

    #[test]
    fn entry_aliases_are_filled() {
        let ctx = build_context(
            &doc("experience:\n  - position: Engineer\n    company: Acme\neducation:\n  - degree: BSc\n    school: MIT\n"),
            None,
        );
        assert_eq!(ctx.experience[0]["title"], "Engineer");
        assert_eq!(ctx.experience[0]["organization"], "Acme");
        assert_eq!(ctx.education[0]["title"], "BSc");
        assert_eq!(ctx.education[0]["organization"], "MIT");
    }

    #[test]
    fn skills_mapping_keeps_category_order() {
        let ctx = build_context(
            &doc("skills:\n  Languages: [Rust, Python]\n  Tools: Docker\n  Empty: []\n"),
            None,
        );
        assert_eq!(ctx.skills.len(), 2);
        assert_eq!(ctx.skills[0].category.as_deref(), Some("Languages"));
        assert_eq!(ctx.skills[0].items, vec!["Rust", "Python"]);
        assert_eq!(ctx.skills[1].items, vec!["Docker"]);
    }

    #[test]
    fn skills_list_becomes_uncategorized_group() {
        let ctx = build_context(&doc("skills: [Rust, SQL]\n"), None);
        assert_eq!(ctx.skills.len(), 1);
        assert_eq!(ctx.skills[0].category, None);
    }

    #[test]
    fn languages_accept_strings_and_mappings() {
        let ctx = build_context(
            &doc("languages:\n  - English\n  - name: German\n    level: B2\n  - level: orphan\n"),
            None,
        );
        assert_eq!(ctx.languages.len(), 2);
        assert_eq!(ctx.languages[1].level.as_deref(), Some("B2"));
    }

    #[test]
    fn malformed_sections_are_dropped() {
        let ctx = build_context(&doc("experience: nope\nprojects: 12\ninterests: chess\n"), None);
        assert!(ctx.experience.is_empty());
        assert!(ctx.projects.is_empty());
        assert_eq!(ctx.interests, vec!["chess"]);
    }
}
