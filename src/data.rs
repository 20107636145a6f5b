//! Data loader – reads the YAML CV document into a nested mapping.
//!
//! The document is kept as a [`serde_json::Map`] so that the template layer
//! can bind it directly. No schema is enforced here: only the top-level value
//! must be a mapping. Everything else is interpreted (tolerantly) by
//! [`crate::context`].

use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use serde_json::{Map, Value};

use crate::error::LoadError;

/// A parsed CV document together with the directory it was loaded from
/// (relative asset paths such as the avatar resolve against it).
#[derive(Debug, Clone, Default)]
pub struct CvDocument {
    data: Map<String, Value>,
    base_dir: PathBuf,
}

/// Load a CV document from a YAML file.
pub fn load_cv_data(path: &Path) -> Result<CvDocument, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let src = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let doc = CvDocument::parse(&src, base_dir, path)?;
    log::info!(
        "Loaded '{}' ({} top-level keys)",
        path.display(),
        doc.data.len()
    );
    Ok(doc)
}

impl CvDocument {
    /// Parse a YAML string. `base_dir` is used to resolve relative paths.
    pub fn from_yaml_str(src: &str, base_dir: impl Into<PathBuf>) -> Result<Self, LoadError> {
        Self::parse(src, base_dir.into(), Path::new("<memory>"))
    }

    /// Wrap an already-built mapping.
    pub fn from_map(data: Map<String, Value>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            data,
            base_dir: base_dir.into(),
        }
    }

    fn parse(src: &str, base_dir: PathBuf, origin: &Path) -> Result<Self, LoadError> {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(src).map_err(|source| LoadError::Yaml {
                path: origin.to_path_buf(),
                source,
            })?;
        let data = match yaml_to_json(yaml) {
            Value::Object(map) => map,
            // An empty file is an empty CV.
            Value::Null => Map::new(),
            _ => return Err(LoadError::NotAMapping(origin.to_path_buf())),
        };
        Ok(Self::from_map(data, base_dir))
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// The whole top-level mapping.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Directory relative asset paths resolve against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The `personal` section, if it is a mapping.
    pub fn personal(&self) -> Option<&Map<String, Value>> {
        self.data.get("personal").and_then(Value::as_object)
    }

    /// Read `personal.avatar` and return it as a base64 data URI.
    ///
    /// Missing files and formats other than PNG/JPEG are reported with a
    /// warning and skipped; they never fail the run.
    pub fn avatar_data_uri(&self) -> Option<String> {
        let avatar = self.personal()?.get("avatar")?.as_str()?.trim();
        if avatar.is_empty() {
            return None;
        }
        let mut path = PathBuf::from(avatar);
        if path.is_relative() {
            path = self.base_dir.join(path);
        }

        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Avatar file not found: {} ({e})", path.display());
                return None;
            }
        };
        let mime = match ::image::guess_format(&bytes) {
            Ok(::image::ImageFormat::Png) => "image/png",
            Ok(::image::ImageFormat::Jpeg) => "image/jpeg",
            Ok(other) => {
                log::warn!(
                    "Skipping avatar {}: unsupported format {other:?}",
                    path.display()
                );
                return None;
            }
            Err(e) => {
                log::warn!("Skipping avatar {}: {e}", path.display());
                return None;
            }
        };
        Some(format!("data:{mime};base64,{}", BASE64_STD.encode(&bytes)))
    }
}

/// Convert a YAML value into JSON, stringifying non-string mapping keys.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => {
            Value::Array(seq.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (k, v) in mapping {
                map.insert(yaml_key(k), yaml_to_json(v));
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        other => match yaml_to_json(other) {
            Value::String(s) => s,
            v => v.to_string(),
        },
    }
}

/// Render a scalar as display text. Mappings and sequences yield `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

    fn temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    #[test]
    fn parses_nested_mapping() {
        let doc = CvDocument::from_yaml_str(
            "personal:\n  name: Jane Doe\nexperience:\n  - title: Engineer\n    start: 2019\n",
            ".",
        )
        .unwrap();
        assert_eq!(doc.personal().unwrap()["name"], "Jane Doe");
        let exp = doc.get("experience").unwrap().as_array().unwrap();
        assert_eq!(exp[0]["start"], 2019);
    }

    #[test]
    fn empty_document_is_empty_mapping() {
        let doc = CvDocument::from_yaml_str("", ".").unwrap();
        assert!(doc.as_map().is_empty());
    }

    #[test]
    fn sequence_at_top_level_is_rejected() {
        let err = CvDocument::from_yaml_str("- a\n- b\n", ".").unwrap_err();
        assert!(matches!(err, LoadError::NotAMapping(_)));
    }

    #[test]
    fn syntax_error_is_yaml_error() {
        let err = CvDocument::from_yaml_str("name: [unclosed", ".").unwrap_err();
        assert!(matches!(err, LoadError::Yaml { .. }));
    }

    #[test]
    fn non_string_keys_are_stringified() {
        let doc = CvDocument::from_yaml_str("skills:\n  2020: [Rust]\n  true: yes\n", ".").unwrap();
        let skills = doc.get("skills").unwrap().as_object().unwrap();
        assert!(skills.contains_key("2020"));
        assert!(skills.contains_key("true"));
    }

    #[test]
    fn key_order_is_preserved() {
        let doc = CvDocument::from_yaml_str("zeta: 1\nalpha: 2\nmid: 3\n", ".").unwrap();
        let keys: Vec<&str> = doc.as_map().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = temp_dir();
        let err = load_cv_data(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn loads_file_and_records_base_dir() {
        let dir = temp_dir();
        let path = dir.path().join("cv.yaml");
        fs::write(&path, "name: Jane Doe\n").unwrap();
        let doc = load_cv_data(&path).unwrap();
        assert_eq!(doc.get("name").unwrap(), "Jane Doe");
        assert_eq!(doc.base_dir(), dir.path());
    }

    #[test]
    fn avatar_resolves_relative_to_yaml() {
        let dir = temp_dir();
        fs::write(dir.path().join("me.png"), BASE64_STD.decode(PIXEL_PNG).unwrap()).unwrap();
        let doc =
            CvDocument::from_yaml_str("personal:\n  avatar: me.png\n", dir.path()).unwrap();
        let uri = doc.avatar_data_uri().unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn missing_avatar_is_skipped() {
        let dir = temp_dir();
        let doc =
            CvDocument::from_yaml_str("personal:\n  avatar: nope.png\n", dir.path()).unwrap();
        assert_eq!(doc.avatar_data_uri(), None);
    }

    #[test]
    fn scalar_text_formats_numbers() {
        assert_eq!(scalar_text(&Value::from(2021)), Some("2021".to_string()));
        assert_eq!(scalar_text(&Value::from("  ")), None);
        assert_eq!(scalar_text(&Value::Null), None);
    }
}
