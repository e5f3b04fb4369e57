//! Model declaration surface
//!
//! A type takes part in conversions by implementing [`Model`] (its property
//! descriptors, construction from property values, extraction of property
//! values, self-validation) and [`JsonSerializing`] (its key-path mapping and
//! optional per-key transformers and class-cluster hooks). These are plain
//! declarations: the engine never reflects over a type at runtime.
//!
//! Copyright (c) 2025 Modelmap Team
//! Licensed under the Apache-2.0 license

use crate::adapter::JsonAdapter;
use crate::error::{ConversionError, Result};
use crate::transformer::ValueTransformer;
use crate::value::{JsonMap, PropertyValues};
use serde_json::Value;
use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Storage kinds for scalar properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Integer,
    UnsignedInteger,
    Float,
}

/// Declared types for reference-typed properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceType {
    String,
    Number,
    Url,
    Date,
    List,
    Map,
    /// A nested model, identified by its model name
    Model(&'static str),
    /// Any other application type, identified by name
    Other(&'static str),
    /// Untyped; values pass through as-is unless a transformer is declared
    Any,
}

/// Storage kind of a property, as reported by its descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Primitive(PrimitiveKind),
    Reference(ReferenceType),
}

/// One property of a model type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub kind: StorageKind,
}

impl PropertyDescriptor {
    pub const fn new(name: &'static str, kind: StorageKind) -> Self {
        Self { name, kind }
    }

    pub const fn primitive(name: &'static str, kind: PrimitiveKind) -> Self {
        Self::new(name, StorageKind::Primitive(kind))
    }

    pub const fn reference(name: &'static str, ty: ReferenceType) -> Self {
        Self::new(name, StorageKind::Reference(ty))
    }

    pub const fn bool(name: &'static str) -> Self {
        Self::primitive(name, PrimitiveKind::Bool)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::primitive(name, PrimitiveKind::Integer)
    }

    pub const fn float(name: &'static str) -> Self {
        Self::primitive(name, PrimitiveKind::Float)
    }

    pub const fn string(name: &'static str) -> Self {
        Self::reference(name, ReferenceType::String)
    }

    pub const fn url(name: &'static str) -> Self {
        Self::reference(name, ReferenceType::Url)
    }

    pub const fn date(name: &'static str) -> Self {
        Self::reference(name, ReferenceType::Date)
    }

    pub const fn any(name: &'static str) -> Self {
        Self::reference(name, ReferenceType::Any)
    }
}

/// Where a property lives in the JSON tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonKey {
    /// A single dotted key path
    Path(String),
    /// Several key paths merged into (and split from) one map value
    Composite(Vec<String>),
    /// The property takes no part in JSON conversion
    Excluded,
}

impl From<&str> for JsonKey {
    fn from(path: &str) -> Self {
        JsonKey::Path(path.to_string())
    }
}

impl From<String> for JsonKey {
    fn from(path: String) -> Self {
        JsonKey::Path(path)
    }
}

impl From<Vec<&str>> for JsonKey {
    fn from(paths: Vec<&str>) -> Self {
        JsonKey::Composite(paths.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for JsonKey {
    fn from(paths: Vec<String>) -> Self {
        JsonKey::Composite(paths)
    }
}

impl<const N: usize> From<[&str; N]> for JsonKey {
    fn from(paths: [&str; N]) -> Self {
        JsonKey::Composite(paths.iter().map(|p| p.to_string()).collect())
    }
}

/// Declared mapping from property name to JSON location
pub type KeyPathDeclarations = BTreeMap<String, JsonKey>;

/// Build a [`KeyPathDeclarations`] map from `(property, key)` pairs
pub fn key_paths<I, K, V>(pairs: I) -> KeyPathDeclarations
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<JsonKey>,
{
    pairs
        .into_iter()
        .map(|(property, key)| (property.into(), key.into()))
        .collect()
}

/// Map every property of `M` to a top-level JSON key of the same name
pub fn identity_key_paths<M: Model>() -> KeyPathDeclarations {
    M::property_descriptors()
        .into_iter()
        .map(|descriptor| (descriptor.name.to_string(), JsonKey::from(descriptor.name)))
        .collect()
}

/// A value type with named properties
pub trait Model: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Name used in errors and logs
    fn model_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Every property of the type together with its storage kind
    fn property_descriptors() -> Vec<PropertyDescriptor>;

    /// Construct an instance from converted property values.
    ///
    /// Properties the JSON did not provide read as
    /// [`PropertyValue::Absent`](crate::value::PropertyValue::Absent).
    fn from_properties(values: PropertyValues) -> anyhow::Result<Self>;

    /// Current property values, keyed by property name
    fn property_values(&self) -> PropertyValues;

    /// Self-validation, run once after a decoded instance is constructed
    fn validate(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A [`Model`] that can be converted to and from JSON
pub trait JsonSerializing: Model {
    /// Property → JSON key path(s). Properties left out do not take part.
    fn json_key_paths() -> KeyPathDeclarations;

    /// Transformer for a specific property; takes precedence over any
    /// transformer registered for the property's storage kind.
    fn transformer_for_key(_key: &str) -> Option<ValueTransformer> {
        None
    }

    /// Pick the concrete type to parse `json` as, or abort
    fn class_for_parsing(_json: &JsonMap) -> ClassSelection<Self> {
        ClassSelection::Requested
    }

    /// Concrete type to encode this instance through, for class clusters
    fn class_for_model(&self) -> Option<ModelClass<Self>> {
        None
    }
}

/// Outcome of [`JsonSerializing::class_for_parsing`]
pub enum ClassSelection<M> {
    /// Parse as the requested type
    Requested,
    /// Parse as another concrete type that converts into the requested one
    Class(ModelClass<M>),
    /// Refuse to parse; decoding fails with `NoClassFound`
    Abort,
}

impl<M> fmt::Debug for ClassSelection<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassSelection::Requested => f.write_str("Requested"),
            ClassSelection::Class(class) => f.debug_tuple("Class").field(class).finish(),
            ClassSelection::Abort => f.write_str("Abort"),
        }
    }
}

/// Type-erased handle to a concrete model type `S` standing in for `M`
pub struct ModelClass<M> {
    handle: Arc<dyn ClassHandle<M>>,
}

trait ClassHandle<M>: Send + Sync {
    fn concrete_type(&self) -> TypeId;
    fn name(&self) -> &'static str;
    fn decode(&self, adapter: &JsonAdapter, json: &JsonMap) -> Result<M>;
    fn encode(&self, adapter: &JsonAdapter, model: &M) -> Result<Value>;
}

struct Concrete<S, M> {
    project: fn(&M) -> Option<&S>,
}

impl<S, M> ClassHandle<M> for Concrete<S, M>
where
    S: JsonSerializing + Into<M>,
    M: 'static,
{
    fn concrete_type(&self) -> TypeId {
        TypeId::of::<S>()
    }

    fn name(&self) -> &'static str {
        S::model_name()
    }

    fn decode(&self, adapter: &JsonAdapter, json: &JsonMap) -> Result<M> {
        adapter.decode_object::<S>(json).map(Into::into)
    }

    fn encode(&self, adapter: &JsonAdapter, model: &M) -> Result<Value> {
        let concrete = (self.project)(model).ok_or_else(|| {
            ConversionError::invalid_mapping(
                S::model_name(),
                None,
                "class_for_model selected a class the instance does not belong to",
            )
        })?;
        adapter.encode_one(concrete)
    }
}

impl<M: 'static> ModelClass<M> {
    /// Handle for concrete type `S`; `project` borrows the `S` out of an `M`
    /// when encoding.
    pub fn of<S>(project: fn(&M) -> Option<&S>) -> Self
    where
        S: JsonSerializing + Into<M>,
    {
        Self {
            handle: Arc::new(Concrete { project }),
        }
    }

    /// Model name of the concrete type
    pub fn name(&self) -> &'static str {
        self.handle.name()
    }

    /// Whether the concrete type is `T`
    pub fn is<T: 'static>(&self) -> bool {
        self.handle.concrete_type() == TypeId::of::<T>()
    }

    pub(crate) fn decode(&self, adapter: &JsonAdapter, json: &JsonMap) -> Result<M> {
        self.handle.decode(adapter, json)
    }

    pub(crate) fn encode(&self, adapter: &JsonAdapter, model: &M) -> Result<Value> {
        self.handle.encode(adapter, model)
    }
}

impl<M: JsonSerializing> ModelClass<M> {
    /// Handle for `M` itself
    pub fn itself() -> Self {
        Self::of::<M>(|model| Some(model))
    }
}

impl<M> Clone for ModelClass<M> {
    fn clone(&self) -> Self {
        Self {
            handle: Arc::clone(&self.handle),
        }
    }
}

impl<M> fmt::Debug for ModelClass<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClass")
            .field("name", &self.handle.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_key_conversions() {
        assert_eq!(JsonKey::from("a.b"), JsonKey::Path("a.b".to_string()));
        assert_eq!(
            JsonKey::from(["p.lat", "p.lon"]),
            JsonKey::Composite(vec!["p.lat".to_string(), "p.lon".to_string()])
        );
        assert_eq!(
            JsonKey::from(vec!["x"]),
            JsonKey::Composite(vec!["x".to_string()])
        );
    }

    #[test]
    fn test_key_paths_builder() {
        let declared = key_paths([("name", JsonKey::from("user.name")), ("id", "id".into())]);
        assert_eq!(declared.len(), 2);
        assert_eq!(declared["name"], JsonKey::Path("user.name".to_string()));
    }

    #[test]
    fn test_descriptor_helpers() {
        let descriptor = PropertyDescriptor::bool("starred");
        assert_eq!(descriptor.kind, StorageKind::Primitive(PrimitiveKind::Bool));
        let descriptor = PropertyDescriptor::url("homepage");
        assert_eq!(descriptor.kind, StorageKind::Reference(ReferenceType::Url));
    }
}
