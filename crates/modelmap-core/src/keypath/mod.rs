//! Dotted key paths into nested JSON objects
//!
//! A [`KeyPath`] addresses a location inside a tree of JSON objects, e.g.
//! `"owner.profile.name"`. Reading ([`KeyPath::get`]) is lenient: a missing
//! segment, or an intermediate node that is not an object, simply means the
//! value is absent. Writing ([`KeyPath::set`]) creates intermediate objects as
//! needed but refuses to overwrite an existing non-object node, since that
//! means two declared key paths disagree about the shape of the tree.
//!
//! Multi-keypath properties are handled by [`merge`].
//!
//! Copyright (c) 2025 Modelmap Team
//! Licensed under the Apache-2.0 license

pub mod merge;

use crate::error::KeyPathError;
use crate::value::{json_kind, JsonMap};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A parsed, non-empty key path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Separator between segments
    pub const SEPARATOR: char = '.';

    /// Parse a dotted key path. Every segment must be non-empty.
    pub fn parse(raw: &str) -> Result<Self, KeyPathError> {
        if raw.is_empty() {
            return Err(KeyPathError::Empty);
        }

        let segments: Vec<String> = raw.split(Self::SEPARATOR).map(str::to_string).collect();
        if let Some(position) = segments.iter().position(String::is_empty) {
            return Err(KeyPathError::EmptySegment {
                path: raw.to_string(),
                position,
            });
        }

        Ok(Self { segments })
    }

    /// Build a key path from already-split segments
    pub fn from_segments<I, S>(segments: I) -> Result<Self, KeyPathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(KeyPathError::Empty);
        }
        if let Some(position) = segments.iter().position(String::is_empty) {
            return Err(KeyPathError::EmptySegment {
                path: segments.join("."),
                position,
            });
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The final segment
    pub fn leaf(&self) -> &str {
        // Never empty: both constructors reject empty paths
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether `self` is a proper prefix of `other`
    pub fn is_prefix_of(&self, other: &KeyPath) -> bool {
        self.segments.len() < other.segments.len()
            && other.segments.iter().zip(&self.segments).all(|(a, b)| a == b)
    }

    /// Whether writing both paths into one tree would collide: the paths are
    /// equal or one is a prefix of the other
    pub fn overlaps(&self, other: &KeyPath) -> bool {
        self == other || self.is_prefix_of(other) || other.is_prefix_of(self)
    }

    /// Look up the value at this path. Returns `None` when a segment is
    /// missing or an intermediate node is not an object.
    pub fn get<'a>(&self, tree: &'a JsonMap) -> Option<&'a Value> {
        let (last, parents) = self.segments.split_last()?;
        let mut current = tree;
        for segment in parents {
            current = current.get(segment)?.as_object()?;
        }
        current.get(last)
    }

    /// Write `value` at this path, creating intermediate objects for missing
    /// segments and replacing any existing value at the leaf.
    pub fn set(&self, tree: &mut JsonMap, value: Value) -> Result<(), KeyPathError> {
        let Some((last, parents)) = self.segments.split_last() else {
            return Err(KeyPathError::Empty);
        };

        let mut current = tree;
        for segment in parents {
            let node = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(JsonMap::new()));
            let found = json_kind(node);
            current = match node {
                Value::Object(map) => map,
                _ => {
                    return Err(KeyPathError::NotAnObject {
                        path: self.to_string(),
                        segment: segment.clone(),
                        found,
                    })
                }
            };
        }

        current.insert(last.clone(), value);
        Ok(())
    }
}

impl FromStr for KeyPath {
    type Err = KeyPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", Self::SEPARATOR)?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> JsonMap {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_parse_segments() {
        let path = KeyPath::parse("owner.profile.name").unwrap();
        assert_eq!(path.segments(), ["owner", "profile", "name"]);
        assert_eq!(path.leaf(), "name");
        assert_eq!(path.to_string(), "owner.profile.name");
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert_eq!(KeyPath::parse(""), Err(KeyPathError::Empty));
        assert_eq!(
            KeyPath::parse("a..b"),
            Err(KeyPathError::EmptySegment {
                path: "a..b".to_string(),
                position: 1
            })
        );
        assert!(KeyPath::parse(".a").is_err());
        assert!(KeyPath::parse("a.").is_err());
    }

    #[test]
    fn test_equality_is_segment_wise() {
        let parsed: KeyPath = "a.b".parse().unwrap();
        let built = KeyPath::from_segments(["a", "b"]).unwrap();
        assert_eq!(parsed, built);
        assert_ne!(parsed, KeyPath::parse("a.c").unwrap());
    }

    #[test]
    fn test_get_nested_value() {
        let tree = object(json!({"POI": {"name": "Cafe", "rating": 4}}));
        let path = KeyPath::parse("POI.name").unwrap();
        assert_eq!(path.get(&tree), Some(&json!("Cafe")));
    }

    #[test]
    fn test_get_missing_or_non_object_is_absent() {
        let tree = object(json!({"POI": "not an object", "other": {"x": 1}}));
        assert_eq!(KeyPath::parse("POI.name").unwrap().get(&tree), None);
        assert_eq!(KeyPath::parse("other.y").unwrap().get(&tree), None);
        assert_eq!(KeyPath::parse("missing.deep.path").unwrap().get(&tree), None);
    }

    #[test]
    fn test_get_returns_explicit_null() {
        let tree = object(json!({"a": null}));
        assert_eq!(KeyPath::parse("a").unwrap().get(&tree), Some(&Value::Null));
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut tree = JsonMap::new();
        KeyPath::parse("a.b.c").unwrap().set(&mut tree, json!(1)).unwrap();
        KeyPath::parse("a.b.d").unwrap().set(&mut tree, json!(2)).unwrap();
        KeyPath::parse("a.e").unwrap().set(&mut tree, json!(3)).unwrap();
        assert_eq!(Value::Object(tree), json!({"a": {"b": {"c": 1, "d": 2}, "e": 3}}));
    }

    #[test]
    fn test_set_replaces_leaf() {
        let mut tree = object(json!({"a": {"b": 1}}));
        KeyPath::parse("a.b").unwrap().set(&mut tree, json!("x")).unwrap();
        assert_eq!(Value::Object(tree), json!({"a": {"b": "x"}}));
    }

    #[test]
    fn test_set_through_non_object_fails() {
        let mut tree = object(json!({"a": 5}));
        let err = KeyPath::parse("a.b").unwrap().set(&mut tree, json!(1)).unwrap_err();
        assert_eq!(
            err,
            KeyPathError::NotAnObject {
                path: "a.b".to_string(),
                segment: "a".to_string(),
                found: "number",
            }
        );
        assert_eq!(Value::Object(tree), json!({"a": 5}));
    }

    #[test]
    fn test_prefix() {
        let a = KeyPath::parse("a").unwrap();
        let ab = KeyPath::parse("a.b").unwrap();
        assert!(a.is_prefix_of(&ab));
        assert!(!ab.is_prefix_of(&a));
        assert!(!a.is_prefix_of(&a));
    }

    #[test]
    fn test_overlaps_is_symmetric() {
        let a = KeyPath::parse("a").unwrap();
        let ab = KeyPath::parse("a.b").unwrap();
        let ac = KeyPath::parse("a.c").unwrap();
        assert!(a.overlaps(&ab));
        assert!(ab.overlaps(&a));
        assert!(ab.overlaps(&ab.clone()));
        assert!(!ab.overlaps(&ac));
        assert!(!KeyPath::parse("ab").unwrap().overlaps(&ab));
    }
}
