//! Typed path expressions over JSON documents
//!
//! Migrations and validation rules address values with dotted paths such as
//! `profile.contact.email` or `career.experience[0].company`. Paths are
//! parsed once into segments and evaluated against a [`serde_json::Value`].
//!
//! ```
//! use cvdata_meta::path::{JsonPath, PathSegment};
//! use serde_json::json;
//!
//! let path = JsonPath::parse("career.experience[0].company");
//! assert_eq!(path.segments()[2], PathSegment::Index(0));
//!
//! let doc = json!({"career": {"experience": [{"company": "Acme"}]}});
//! assert_eq!(path.get(&doc), Some(&json!("Acme")));
//! ```

use std::fmt;

use serde_json::{Map, Value};

/// A segment of a path - either a key or an array index
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A key in an object
    Key(String),
    /// An index in an array
    Index(usize),
}

/// A parsed dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

impl JsonPath {
    /// Parse `a.b[0].c` into segments.
    ///
    /// Empty keys are skipped and unparseable indices are dropped.
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        let mut current_key = String::new();
        let mut chars = path.chars();

        while let Some(ch) = chars.next() {
            match ch {
                '.' => {
                    if !current_key.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut current_key)));
                    }
                }
                '[' => {
                    if !current_key.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut current_key)));
                    }
                    let mut index_str = String::new();
                    for ch in chars.by_ref() {
                        if ch == ']' {
                            break;
                        }
                        index_str.push(ch);
                    }
                    if let Ok(index) = index_str.trim().parse::<usize>() {
                        segments.push(PathSegment::Index(index));
                    }
                }
                _ => current_key.push(ch),
            }
        }

        if !current_key.is_empty() {
            segments.push(PathSegment::Key(current_key));
        }

        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// True for the empty path, which addresses the whole document.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path of the containing value.
    pub fn parent(&self) -> Option<JsonPath> {
        let (_, head) = self.segments.split_last()?;
        Some(Self {
            segments: head.to_vec(),
        })
    }

    /// The final segment.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Same parent, different final key.
    pub fn with_last_key(&self, key: &str) -> JsonPath {
        let mut segments = self.parent().map(|p| p.segments).unwrap_or_default();
        segments.push(PathSegment::Key(key.to_string()));
        Self { segments }
    }

    /// Append a key segment.
    pub fn child(&self, key: &str) -> JsonPath {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self { segments }
    }

    /// Borrow the value at this path.
    pub fn get<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(value, |current, segment| match segment {
                PathSegment::Key(key) => current.get(key),
                PathSegment::Index(idx) => current.get(*idx),
            })
    }

    /// Mutably borrow the value at this path.
    pub fn get_mut<'a>(&self, value: &'a mut Value) -> Option<&'a mut Value> {
        self.segments
            .iter()
            .try_fold(value, |current, segment| match segment {
                PathSegment::Key(key) => current.get_mut(key),
                PathSegment::Index(idx) => current.get_mut(*idx),
            })
    }

    /// Whether a value exists at this path.
    pub fn exists(&self, value: &Value) -> bool {
        self.get(value).is_some()
    }

    /// Write `new_value` at this path, creating intermediate objects.
    ///
    /// Missing keys (including `null` placeholders) become empty objects.
    /// Returns `false` when an intermediate value is a scalar or an array
    /// index is out of bounds; the document is left untouched in that case.
    pub fn insert(&self, value: &mut Value, new_value: Value) -> bool {
        if !self.can_insert(value) {
            return false;
        }
        let Some((last, head)) = self.segments.split_last() else {
            *value = new_value;
            return true;
        };

        let mut current = value;
        for segment in head {
            current = match segment {
                PathSegment::Key(key) => {
                    if current.is_null() {
                        *current = Value::Object(Map::new());
                    }
                    let Value::Object(map) = current else {
                        return false;
                    };
                    map.entry(key.clone())
                        .or_insert_with(|| Value::Object(Map::new()))
                }
                PathSegment::Index(idx) => match current.get_mut(*idx) {
                    Some(next) => next,
                    None => return false,
                },
            };
        }

        match last {
            PathSegment::Key(key) => {
                if current.is_null() {
                    *current = Value::Object(Map::new());
                }
                match current {
                    Value::Object(map) => {
                        map.insert(key.clone(), new_value);
                        true
                    }
                    _ => false,
                }
            }
            PathSegment::Index(idx) => match current {
                Value::Array(arr) if *idx < arr.len() => {
                    arr[*idx] = new_value;
                    true
                }
                _ => false,
            },
        }
    }

    // Dry walk so a failing insert never leaves half-created intermediates.
    fn can_insert(&self, value: &Value) -> bool {
        let mut current = Some(value);
        for (i, segment) in self.segments.iter().enumerate() {
            let is_last = i + 1 == self.segments.len();
            let Some(node) = current else {
                // Everything below a missing key is created fresh
                return matches!(segment, PathSegment::Key(_));
            };
            match segment {
                PathSegment::Key(key) => {
                    if !(node.is_object() || node.is_null()) {
                        return false;
                    }
                    current = node.get(key).filter(|v| !v.is_null());
                    if !is_last && current.is_some_and(|v| !(v.is_object() || v.is_array())) {
                        return false;
                    }
                }
                PathSegment::Index(idx) => {
                    let Value::Array(arr) = node else {
                        return false;
                    };
                    if *idx >= arr.len() {
                        return false;
                    }
                    current = arr.get(*idx);
                }
            }
        }
        true
    }

    /// Remove and return the value at this path. Absent paths are a no-op.
    pub fn remove(&self, value: &mut Value) -> Option<Value> {
        let (last, _) = self.segments.split_last()?;
        let parent = self.parent()?.get_mut(value)?;
        match (last, parent) {
            (PathSegment::Key(key), Value::Object(map)) => map.shift_remove(key),
            (PathSegment::Index(idx), Value::Array(arr)) if *idx < arr.len() => {
                Some(arr.remove(*idx))
            }
            _ => None,
        }
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl From<&str> for JsonPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_mixed() {
        let path = JsonPath::parse("items[0].name");
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("items".to_string()),
                PathSegment::Index(0),
                PathSegment::Key("name".to_string()),
            ]
        );
        assert_eq!(path.to_string(), "items[0].name");
    }

    #[test]
    fn test_insert_creates_intermediates() {
        let mut doc = json!({});
        assert!(JsonPath::parse("profile.personal.name").insert(&mut doc, json!("Ada")));
        assert_eq!(doc, json!({"profile": {"personal": {"name": "Ada"}}}));
    }

    #[test]
    fn test_insert_through_scalar_fails_cleanly() {
        let mut doc = json!({"profile": "flat"});
        assert!(!JsonPath::parse("profile.personal.name").insert(&mut doc, json!("Ada")));
        assert_eq!(doc, json!({"profile": "flat"}));
    }

    #[test]
    fn test_insert_replaces_null_placeholder() {
        let mut doc = json!({"metadata": null});
        assert!(JsonPath::parse("metadata.version").insert(&mut doc, json!("4.0.0")));
        assert_eq!(doc, json!({"metadata": {"version": "4.0.0"}}));
    }

    #[test]
    fn test_insert_array_index_out_of_bounds() {
        let mut doc = json!({"items": []});
        assert!(!JsonPath::parse("items[2]").insert(&mut doc, json!(1)));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut doc = json!({"a": 1});
        assert_eq!(JsonPath::parse("b.c").remove(&mut doc), None);
        assert_eq!(doc, json!({"a": 1}));
    }

    #[test]
    fn test_remove_keeps_key_order() {
        let mut doc = json!({"a": 1, "b": 2, "c": 3});
        assert_eq!(JsonPath::parse("b").remove(&mut doc), Some(json!(2)));
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_with_last_key() {
        let path = JsonPath::parse("profile.contact.mail");
        assert_eq!(path.with_last_key("email").to_string(), "profile.contact.email");
    }

    #[test]
    fn test_root_path_get() {
        let doc = json!({"a": 1});
        assert_eq!(JsonPath::parse("").get(&doc), Some(&doc));
    }
}
