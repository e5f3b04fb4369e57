//! Schema compilation
//!
//! A [`Schema`] is the validated association between a model type's
//! properties and their JSON key paths. It is built once per type from the
//! model's declarations ([`Model::property_descriptors`] and
//! [`JsonSerializing::json_key_paths`]) and is immutable afterwards.
//!
//! Copyright (c) 2025 Modelmap Team
//! Licensed under the Apache-2.0 license

use crate::adapter::guard;
use crate::error::{ConversionError, Result};
use crate::keypath::{merge, KeyPath};
use crate::model::{JsonKey, JsonSerializing, Model, StorageKind};
use std::collections::BTreeSet;

/// Where one property is read from and written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyMapping {
    /// A single key path
    Single(KeyPath),
    /// Several key paths merged into one map keyed by leaf segment
    Merged(Vec<KeyPath>),
    /// Not part of JSON conversion
    Excluded,
}

impl PropertyMapping {
    pub fn is_excluded(&self) -> bool {
        matches!(self, PropertyMapping::Excluded)
    }

    /// Every key path the property touches
    pub fn key_paths(&self) -> &[KeyPath] {
        match self {
            PropertyMapping::Single(path) => std::slice::from_ref(path),
            PropertyMapping::Merged(paths) => paths,
            PropertyMapping::Excluded => &[],
        }
    }
}

/// One compiled property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySchema {
    pub name: &'static str,
    pub kind: StorageKind,
    pub mapping: PropertyMapping,
}

/// Compiled mapping for one model type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    model: &'static str,
    properties: Vec<PropertySchema>,
    property_names: BTreeSet<&'static str>,
}

impl Schema {
    /// Compile the schema of `M`.
    ///
    /// Fails with `InvalidMapping` when the declared key paths name a
    /// property `M` does not have, when a key path is malformed, when a
    /// merge mapping is empty or repeats a leaf key, when two key paths
    /// overlap (one equals or is a prefix of the other), or when the
    /// descriptors list a property twice.
    pub fn compile<M: JsonSerializing>() -> Result<Self> {
        let model = M::model_name();

        let descriptors = guard::catch(M::property_descriptors).map_err(|message| {
            ConversionError::invalid_mapping(
                model,
                None,
                format!("property_descriptors panicked: {}", message),
            )
        })?;
        let declared = guard::catch(M::json_key_paths).map_err(|message| {
            ConversionError::invalid_mapping(model, None, format!("json_key_paths panicked: {}", message))
        })?;

        let mut property_names = BTreeSet::new();
        for descriptor in &descriptors {
            if !property_names.insert(descriptor.name) {
                return Err(ConversionError::invalid_mapping(
                    model,
                    Some(descriptor.name),
                    format!("property '{}' is described more than once", descriptor.name),
                ));
            }
        }

        if let Some(unknown) = declared
            .keys()
            .find(|key| !property_names.contains(key.as_str()))
        {
            return Err(ConversionError::invalid_mapping(
                model,
                Some(unknown.as_str()),
                format!("'{}' is not a property of {}", unknown, model),
            ));
        }

        let properties = descriptors
            .iter()
            .map(|descriptor| -> Result<PropertySchema> {
                let mapping = match declared.get(descriptor.name) {
                    None | Some(JsonKey::Excluded) => PropertyMapping::Excluded,
                    Some(key) => compile_key(model, descriptor.name, key)?,
                };
                Ok(PropertySchema {
                    name: descriptor.name,
                    kind: descriptor.kind,
                    mapping,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(overlap) = first_overlap(&properties) {
            return Err(ConversionError::invalid_mapping(
                model,
                Some(overlap.property),
                format!(
                    "key path '{}' of {} overlaps key path '{}' of {}",
                    overlap.path, overlap.property, overlap.earlier_path, overlap.earlier
                ),
            ));
        }

        let schema = Self {
            model,
            properties,
            property_names,
        };
        log::debug!(
            "Compiled schema for {}: {} of {} properties mapped",
            model,
            schema.mapped().count(),
            schema.properties.len()
        );
        Ok(schema)
    }

    pub fn model(&self) -> &'static str {
        self.model
    }

    /// All properties, in descriptor order
    pub fn properties(&self) -> &[PropertySchema] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|property| property.name == name)
    }

    /// Every property name the descriptors report
    pub fn property_names(&self) -> &BTreeSet<&'static str> {
        &self.property_names
    }

    /// Properties that take part in JSON conversion
    pub fn mapped(&self) -> impl Iterator<Item = &PropertySchema> {
        self.properties
            .iter()
            .filter(|property| !property.mapping.is_excluded())
    }

    /// Names of the properties that take part in JSON conversion
    pub fn mapped_keys(&self) -> Vec<&'static str> {
        self.mapped().map(|property| property.name).collect()
    }
}

struct Overlap<'a> {
    property: &'static str,
    path: &'a KeyPath,
    earlier: &'static str,
    earlier_path: &'a KeyPath,
}

/// First key path, in descriptor order, that collides with a path claimed
/// before it. Colliding paths would overwrite each other on encode.
fn first_overlap(properties: &[PropertySchema]) -> Option<Overlap<'_>> {
    let mut claimed: Vec<(&'static str, &KeyPath)> = Vec::new();
    for property in properties {
        for path in property.mapping.key_paths() {
            if let Some((earlier, earlier_path)) =
                claimed.iter().copied().find(|(_, other)| other.overlaps(path))
            {
                return Some(Overlap {
                    property: property.name,
                    path,
                    earlier,
                    earlier_path,
                });
            }
            claimed.push((property.name, path));
        }
    }
    None
}

fn compile_key(model: &'static str, property: &str, key: &JsonKey) -> Result<PropertyMapping> {
    let parse = |raw: &str| {
        KeyPath::parse(raw).map_err(|e| {
            ConversionError::invalid_mapping(model, Some(property), format!("{}: {}", property, e))
        })
    };

    match key {
        JsonKey::Path(raw) => parse(raw.as_str()).map(PropertyMapping::Single),
        JsonKey::Composite(raws) => {
            if raws.is_empty() {
                return Err(ConversionError::invalid_mapping(
                    model,
                    Some(property),
                    format!("{} maps to an empty list of key paths", property),
                ));
            }
            let paths = raws
                .iter()
                .map(|raw| parse(raw.as_str()))
                .collect::<Result<Vec<_>>>()?;
            if let Some(leaf) = merge::duplicate_leaf(&paths) {
                return Err(ConversionError::invalid_mapping(
                    model,
                    Some(property),
                    format!("{} maps more than one key path ending in '{}'", property, leaf),
                ));
            }
            Ok(PropertyMapping::Merged(paths))
        }
        JsonKey::Excluded => Ok(PropertyMapping::Excluded),
    }
}
