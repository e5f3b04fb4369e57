//! Model-side property values
//!
//! JSON trees are `serde_json` values. Once a value has been read out of a
//! tree it becomes a [`PropertyValue`], which can additionally hold the
//! richer types that transformers produce (URLs, dates, nested models) and
//! the [`PropertyValue::Absent`] sentinel for properties the JSON omitted.
//!
//! Copyright (c) 2025 Modelmap Team
//! Licensed under the Apache-2.0 license

use crate::error::TransformError;
use crate::model::Model;
use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// JSON object type used as the source and target of conversions
pub type JsonMap = Map<String, Value>;

/// A single property value on the model side of a conversion
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyValue {
    /// The JSON tree had nothing at the property's key path
    #[default]
    Absent,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Url(Url),
    Date(DateTime<Utc>),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
    Model(ModelValue),
}

static ABSENT: PropertyValue = PropertyValue::Absent;

impl PropertyValue {
    /// Convert a JSON value without any transformation
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => PropertyValue::Null,
            Value::Bool(b) => PropertyValue::Bool(b),
            Value::Number(n) => PropertyValue::Number(n),
            Value::String(s) => PropertyValue::String(s),
            Value::Array(items) => {
                PropertyValue::List(items.into_iter().map(PropertyValue::from_json).collect())
            }
            Value::Object(map) => PropertyValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, PropertyValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert back into JSON.
    ///
    /// URLs, dates and models have no JSON form of their own and must be
    /// reverse-transformed first. `Absent` entries inside lists or maps are
    /// dropped from maps and written as `null` inside lists.
    pub fn to_json(&self) -> Result<Value, TransformError> {
        match self {
            PropertyValue::Absent | PropertyValue::Null => Ok(Value::Null),
            PropertyValue::Bool(b) => Ok(Value::Bool(*b)),
            PropertyValue::Number(n) => Ok(Value::Number(n.clone())),
            PropertyValue::String(s) => Ok(Value::String(s.clone())),
            PropertyValue::List(items) => items
                .iter()
                .map(PropertyValue::to_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            PropertyValue::Map(entries) => {
                let mut map = JsonMap::new();
                for (key, value) in entries {
                    if value.is_absent() {
                        continue;
                    }
                    map.insert(key.clone(), value.to_json()?);
                }
                Ok(Value::Object(map))
            }
            other => Err(TransformError::Unrepresentable { kind: other.kind() }),
        }
    }

    /// Short name of the variant, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Absent => "absent",
            PropertyValue::Null => "null",
            PropertyValue::Bool(_) => "boolean",
            PropertyValue::Number(_) => "number",
            PropertyValue::String(_) => "string",
            PropertyValue::Url(_) => "url",
            PropertyValue::Date(_) => "date",
            PropertyValue::List(_) => "list",
            PropertyValue::Map(_) => "map",
            PropertyValue::Model(_) => "model",
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, PropertyValue::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// `true` for both `Absent` and `Null`
    pub fn is_empty(&self) -> bool {
        self.is_absent() || self.is_null()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_url(&self) -> Option<&Url> {
        match self {
            PropertyValue::Url(url) => Some(url),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            PropertyValue::Date(date) => Some(date),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            PropertyValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow a nested model of type `M`
    pub fn as_model<M: Model>(&self) -> Option<&M> {
        match self {
            PropertyValue::Model(model) => model.downcast_ref::<M>(),
            _ => None,
        }
    }

    /// Wrap a model instance
    pub fn model<M: Model>(model: M) -> Self {
        PropertyValue::Model(ModelValue::new(model))
    }

    /// Build a list of nested models
    pub fn models<M: Model>(models: impl IntoIterator<Item = M>) -> Self {
        PropertyValue::List(models.into_iter().map(PropertyValue::model).collect())
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(value.into())
    }
}

impl From<u64> for PropertyValue {
    fn from(value: u64) -> Self {
        PropertyValue::Number(value.into())
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Number(value.into())
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        // Non-finite floats have no JSON number form
        Number::from_f64(value)
            .map(PropertyValue::Number)
            .unwrap_or(PropertyValue::Null)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<Url> for PropertyValue {
    fn from(value: Url) -> Self {
        PropertyValue::Url(value)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        PropertyValue::Date(value)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(PropertyValue::Absent)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(values: Vec<T>) -> Self {
        PropertyValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PropertyValue>> From<BTreeMap<String, T>> for PropertyValue {
    fn from(entries: BTreeMap<String, T>) -> Self {
        PropertyValue::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Type-erased nested model stored inside a [`PropertyValue`]
#[derive(Clone)]
pub struct ModelValue {
    inner: Arc<dyn ErasedModel>,
}

trait ErasedModel: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn erased_name(&self) -> &'static str;
    fn eq_erased(&self, other: &dyn ErasedModel) -> bool;
    fn fmt_erased(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<M: Model> ErasedModel for M {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn erased_name(&self) -> &'static str {
        <M as Model>::model_name()
    }

    fn eq_erased(&self, other: &dyn ErasedModel) -> bool {
        other
            .as_any()
            .downcast_ref::<M>()
            .is_some_and(|other| self == other)
    }

    fn fmt_erased(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl ModelValue {
    pub fn new<M: Model>(model: M) -> Self {
        Self {
            inner: Arc::new(model),
        }
    }

    pub fn downcast_ref<M: Model>(&self) -> Option<&M> {
        self.inner.as_any().downcast_ref::<M>()
    }

    pub fn is<M: Model>(&self) -> bool {
        self.downcast_ref::<M>().is_some()
    }

    pub fn model_name(&self) -> &'static str {
        self.inner.erased_name()
    }
}

impl PartialEq for ModelValue {
    fn eq(&self, other: &Self) -> bool {
        self.inner.eq_erased(other.inner.as_ref())
    }
}

impl fmt::Debug for ModelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt_erased(f)
    }
}

/// Error returned when a property value does not have the type a model expects
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("property '{property}' expected {expected}, found {found}")]
pub struct ValueTypeError {
    pub property: String,
    pub expected: &'static str,
    pub found: &'static str,
}

/// Expected and found kinds of the innermost value that failed to convert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindMismatch {
    pub expected: &'static str,
    pub found: &'static str,
}

impl KindMismatch {
    /// `value` is not a `T`
    pub fn of<T: FromPropertyValue>(value: &PropertyValue) -> Self {
        Self {
            expected: T::EXPECTED,
            found: value.kind(),
        }
    }
}

/// Conversion from a [`PropertyValue`] into a concrete Rust type.
///
/// `Absent` and `Null` only convert into `Option<T>` (as `None`). Lists and
/// maps report the first element that fails, not the container.
pub trait FromPropertyValue: Sized {
    /// Name of the expected kind, used in [`ValueTypeError`]
    const EXPECTED: &'static str;

    fn from_property_value(value: PropertyValue) -> Result<Self, KindMismatch>;
}

impl FromPropertyValue for PropertyValue {
    const EXPECTED: &'static str = "any value";

    fn from_property_value(value: PropertyValue) -> Result<Self, KindMismatch> {
        Ok(value)
    }
}

impl FromPropertyValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_property_value(value: PropertyValue) -> Result<Self, KindMismatch> {
        value.as_bool().ok_or_else(|| KindMismatch::of::<Self>(&value))
    }
}

impl FromPropertyValue for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_property_value(value: PropertyValue) -> Result<Self, KindMismatch> {
        value.as_i64().ok_or_else(|| KindMismatch::of::<Self>(&value))
    }
}

impl FromPropertyValue for u64 {
    const EXPECTED: &'static str = "unsigned integer";

    fn from_property_value(value: PropertyValue) -> Result<Self, KindMismatch> {
        match &value {
            PropertyValue::Number(n) => n.as_u64(),
            _ => None,
        }
        .ok_or_else(|| KindMismatch::of::<Self>(&value))
    }
}

impl FromPropertyValue for f64 {
    const EXPECTED: &'static str = "number";

    fn from_property_value(value: PropertyValue) -> Result<Self, KindMismatch> {
        value.as_f64().ok_or_else(|| KindMismatch::of::<Self>(&value))
    }
}

impl FromPropertyValue for String {
    const EXPECTED: &'static str = "string";

    fn from_property_value(value: PropertyValue) -> Result<Self, KindMismatch> {
        match value {
            PropertyValue::String(s) => Ok(s),
            other => Err(KindMismatch::of::<Self>(&other)),
        }
    }
}

impl FromPropertyValue for Url {
    const EXPECTED: &'static str = "url";

    fn from_property_value(value: PropertyValue) -> Result<Self, KindMismatch> {
        match value {
            PropertyValue::Url(url) => Ok(url),
            other => Err(KindMismatch::of::<Self>(&other)),
        }
    }
}

impl FromPropertyValue for DateTime<Utc> {
    const EXPECTED: &'static str = "date";

    fn from_property_value(value: PropertyValue) -> Result<Self, KindMismatch> {
        match value {
            PropertyValue::Date(date) => Ok(date),
            other => Err(KindMismatch::of::<Self>(&other)),
        }
    }
}

impl<T: FromPropertyValue> FromPropertyValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_property_value(value: PropertyValue) -> Result<Self, KindMismatch> {
        if value.is_empty() {
            return Ok(None);
        }
        T::from_property_value(value).map(Some)
    }
}

impl<T: FromPropertyValue> FromPropertyValue for Vec<T> {
    const EXPECTED: &'static str = "list";

    fn from_property_value(value: PropertyValue) -> Result<Self, KindMismatch> {
        match value {
            PropertyValue::List(items) => items.into_iter().map(T::from_property_value).collect(),
            other => Err(KindMismatch::of::<Self>(&other)),
        }
    }
}

impl<T: FromPropertyValue> FromPropertyValue for BTreeMap<String, T> {
    const EXPECTED: &'static str = "map";

    fn from_property_value(value: PropertyValue) -> Result<Self, KindMismatch> {
        match value {
            PropertyValue::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| T::from_property_value(v).map(|v| (k, v)))
                .collect(),
            other => Err(KindMismatch::of::<Self>(&other)),
        }
    }
}

/// Property name → value map handed to and returned by models
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyValues {
    entries: BTreeMap<String, PropertyValue>,
}

impl PropertyValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, property: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(property, value);
        self
    }

    pub fn insert(&mut self, property: impl Into<String>, value: impl Into<PropertyValue>) {
        self.entries.insert(property.into(), value.into());
    }

    /// Borrow a value; missing properties read as [`PropertyValue::Absent`]
    pub fn get(&self, property: &str) -> &PropertyValue {
        self.entries.get(property).unwrap_or(&ABSENT)
    }

    /// Remove and return a value; missing properties yield `Absent`
    pub fn take(&mut self, property: &str) -> PropertyValue {
        self.entries.remove(property).unwrap_or_default()
    }

    /// Remove a value and convert it, reporting a typed error on mismatch
    pub fn take_as<T: FromPropertyValue>(&mut self, property: &str) -> Result<T, ValueTypeError> {
        T::from_property_value(self.take(property)).map_err(|mismatch| ValueTypeError {
            property: property.to_string(),
            expected: mismatch.expected,
            found: mismatch.found,
        })
    }

    /// Remove a nested model value; `Absent`/`Null` yield `None`
    pub fn take_model<M: Model>(&mut self, property: &str) -> Result<Option<M>, ValueTypeError> {
        match self.take(property) {
            PropertyValue::Absent | PropertyValue::Null => Ok(None),
            PropertyValue::Model(model) => {
                model.downcast_ref::<M>().cloned().map(Some).ok_or(ValueTypeError {
                    property: property.to_string(),
                    expected: M::model_name(),
                    found: model.model_name(),
                })
            }
            other => Err(ValueTypeError {
                property: property.to_string(),
                expected: M::model_name(),
                found: other.kind(),
            }),
        }
    }

    /// Remove a list of nested models; `Absent`/`Null` yield an empty list
    pub fn take_models<M: Model>(&mut self, property: &str) -> Result<Vec<M>, ValueTypeError> {
        let mismatch = |found: &'static str| ValueTypeError {
            property: property.to_string(),
            expected: M::model_name(),
            found,
        };
        match self.take(property) {
            PropertyValue::Absent | PropertyValue::Null => Ok(Vec::new()),
            PropertyValue::List(items) => items
                .iter()
                .map(|item| item.as_model::<M>().cloned().ok_or_else(|| mismatch(item.kind())))
                .collect(),
            other => Err(mismatch(other.kind())),
        }
    }

    pub fn contains(&self, property: &str) -> bool {
        self.entries.contains_key(property)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.entries.iter()
    }
}

impl FromIterator<(String, PropertyValue)> for PropertyValues {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for PropertyValues {
    type Item = (String, PropertyValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Name of a JSON value's kind, used in diagnostics
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_round_trip_for_plain_values() {
        let json = json!({"a": [1, "two", null, {"b": true}]});
        let value = PropertyValue::from_json(json.clone());
        assert_eq!(value.to_json().unwrap(), json);
    }

    #[test]
    fn test_rich_values_have_no_json_form() {
        let url = Url::parse("https://example.com/").unwrap();
        let err = PropertyValue::Url(url).to_json().unwrap_err();
        assert!(matches!(err, TransformError::Unrepresentable { kind: "url" }));
    }

    #[test]
    fn test_absent_entries_are_dropped_from_maps() {
        let mut entries = BTreeMap::new();
        entries.insert("kept".to_string(), PropertyValue::from(1i64));
        entries.insert("gone".to_string(), PropertyValue::Absent);
        let json = PropertyValue::Map(entries).to_json().unwrap();
        assert_eq!(json, json!({"kept": 1}));
    }

    #[test]
    fn test_option_conversions() {
        assert_eq!(PropertyValue::from(None::<String>), PropertyValue::Absent);
        assert_eq!(
            PropertyValue::from(Some("x")),
            PropertyValue::String("x".to_string())
        );
        assert!(PropertyValue::from(f64::NAN).is_null());
    }

    #[test]
    fn test_take_as_reports_type_mismatch() {
        let mut values = PropertyValues::new().with("age", "old");
        let err = values.take_as::<i64>("age").unwrap_err();
        assert_eq!(err.expected, "integer");
        assert_eq!(err.found, "string");
    }

    #[test]
    fn test_take_as_reports_failing_element() {
        let mut values = PropertyValues::new()
            .with("scores", vec![PropertyValue::from(1i64), PropertyValue::from("two")])
            .with(
                "location",
                BTreeMap::from([("lat".to_string(), PropertyValue::Null)]),
            )
            .with("tags", "not a list");

        let err = values.take_as::<Vec<i64>>("scores").unwrap_err();
        assert_eq!((err.expected, err.found), ("integer", "string"));

        let err = values
            .take_as::<Option<BTreeMap<String, f64>>>("location")
            .unwrap_err();
        assert_eq!(err.to_string(), "property 'location' expected number, found null");

        let err = values.take_as::<Vec<String>>("tags").unwrap_err();
        assert_eq!((err.expected, err.found), ("list", "string"));
    }

    #[test]
    fn test_take_as_optional_accepts_absent_and_null() {
        let mut values = PropertyValues::new().with("nickname", PropertyValue::Null);
        assert_eq!(values.take_as::<Option<String>>("nickname").unwrap(), None);
        assert_eq!(values.take_as::<Option<String>>("missing").unwrap(), None);
    }

    #[test]
    fn test_get_missing_is_absent() {
        let values = PropertyValues::new();
        assert!(values.get("anything").is_absent());
    }
}
