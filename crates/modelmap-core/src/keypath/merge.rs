//! Merge-mapping for properties backed by several key paths
//!
//! A property mapped to `["p.lat", "p.lon"]` reads as one object keyed by
//! each path's leaf segment (`{"lat": .., "lon": ..}`) and writes back by
//! splitting that object across the original paths.

use super::KeyPath;
use crate::error::KeyPathError;
use crate::value::JsonMap;

/// Collect the values found at `paths` into one object keyed by leaf segment.
///
/// Paths with no value, or holding JSON `null`, are left out. Returns `None`
/// when none of the paths had a value, so a tree written with `null` at
/// every path reads back as no value at all.
pub fn gather(paths: &[KeyPath], tree: &JsonMap) -> Option<JsonMap> {
    let merged: JsonMap = paths
        .iter()
        .filter_map(|path| {
            path.get(tree)
                .filter(|value| !value.is_null())
                .map(|value| (path.leaf().to_string(), value.clone()))
        })
        .collect();

    if merged.is_empty() {
        None
    } else {
        Some(merged)
    }
}

/// Write each leaf entry of `merged` back at its full key path.
///
/// Leaf keys missing from `merged` are skipped; entries in `merged` that no
/// path claims are ignored.
pub fn scatter(paths: &[KeyPath], merged: &JsonMap, tree: &mut JsonMap) -> Result<(), KeyPathError> {
    for path in paths {
        if let Some(value) = merged.get(path.leaf()) {
            path.set(tree, value.clone())?;
        }
    }
    Ok(())
}

/// First leaf segment shared by two of the given paths, if any
pub fn duplicate_leaf(paths: &[KeyPath]) -> Option<&str> {
    paths.iter().enumerate().find_map(|(i, path)| {
        paths[..i]
            .iter()
            .any(|earlier| earlier.leaf() == path.leaf())
            .then(|| path.leaf())
    })
}
