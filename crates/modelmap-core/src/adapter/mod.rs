//! Conversion between JSON trees and models
//!
//! [`JsonAdapter`] drives every conversion: it compiles (and caches) each
//! model type's schema, resolves the transformer for every mapped property,
//! reads and writes values through key paths, and runs class-cluster
//! dispatch and self-validation. Conversions are synchronous and either
//! fully succeed or fully fail; batch conversions stop at the first failing
//! element and report its index.
//!
//! # Examples
//!
//! ```
//! use modelmap_core::{
//!     key_paths, JsonAdapter, JsonKey, JsonSerializing, KeyPathDeclarations, Model,
//!     PropertyDescriptor, PropertyValues,
//! };
//! use serde_json::json;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Repository {
//!     name: String,
//!     stars: i64,
//!     private: bool,
//! }
//!
//! impl Model for Repository {
//!     fn property_descriptors() -> Vec<PropertyDescriptor> {
//!         vec![
//!             PropertyDescriptor::string("name"),
//!             PropertyDescriptor::integer("stars"),
//!             PropertyDescriptor::bool("private"),
//!         ]
//!     }
//!
//!     fn from_properties(mut values: PropertyValues) -> anyhow::Result<Self> {
//!         Ok(Self {
//!             name: values.take_as("name")?,
//!             stars: values.take_as::<Option<i64>>("stars")?.unwrap_or(0),
//!             private: values.take_as::<Option<bool>>("private")?.unwrap_or(false),
//!         })
//!     }
//!
//!     fn property_values(&self) -> PropertyValues {
//!         PropertyValues::new()
//!             .with("name", self.name.as_str())
//!             .with("stars", self.stars)
//!             .with("private", self.private)
//!     }
//! }
//!
//! impl JsonSerializing for Repository {
//!     fn json_key_paths() -> KeyPathDeclarations {
//!         key_paths([
//!             ("name", JsonKey::from("full_name")),
//!             ("stars", "stats.stargazers".into()),
//!             ("private", "private".into()),
//!         ])
//!     }
//! }
//!
//! # fn main() -> modelmap_core::Result<()> {
//! let adapter = JsonAdapter::new();
//! let json = json!({"full_name": "rust-lang/rust", "stats": {"stargazers": 90000}, "private": 0});
//!
//! let repository: Repository = adapter.decode_one(&json)?;
//! assert_eq!(repository.stars, 90000);
//! assert!(!repository.private);
//!
//! assert_eq!(
//!     adapter.encode_one(&repository)?,
//!     json!({"full_name": "rust-lang/rust", "stats": {"stargazers": 90000}, "private": false})
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Copyright (c) 2025 Modelmap Team
//! Licensed under the Apache-2.0 license

pub mod builder;
mod cache;
pub mod context;
pub(crate) mod guard;


pub use builder::JsonAdapterBuilder;
pub use cache::CompiledModel;
pub use context::{ConversionContext, ConversionStage, Direction};

use crate::config::{AbsentPolicy, AdapterConfig, EncodeFailurePolicy};
use crate::error::{ConversionError, Result, TransformError};
use crate::keypath::merge;
use crate::model::{ClassSelection, JsonSerializing, StorageKind};
use crate::schema::{PropertyMapping, PropertySchema};
use crate::transformer::{TransformContext, TransformerRegistry, ValueTransformer};
use crate::value::{json_kind, JsonMap, PropertyValue, PropertyValues};
use cache::SchemaCache;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Converts JSON trees to models and back
pub struct JsonAdapter {
    registry: TransformerRegistry,
    config: AdapterConfig,
    cache: SchemaCache,
}

impl JsonAdapter {
    /// An adapter with the default configuration and built-in transformers
    pub fn new() -> Self {
        Self::with_config(AdapterConfig::default())
    }

    pub fn with_config(config: AdapterConfig) -> Self {
        Self::from_parts(TransformerRegistry::with_built_ins(), config)
    }

    pub(crate) fn from_parts(registry: TransformerRegistry, config: AdapterConfig) -> Self {
        Self {
            registry,
            config,
            cache: SchemaCache::new(),
        }
    }

    pub fn builder() -> JsonAdapterBuilder {
        JsonAdapterBuilder::new()
    }

    /// Process-wide adapter with the default configuration
    pub fn shared() -> &'static JsonAdapter {
        static SHARED: OnceLock<JsonAdapter> = OnceLock::new();
        SHARED.get_or_init(JsonAdapter::new)
    }

    /// Register a transformer for a storage kind, returning the one it
    /// replaces. Clears the schema cache so later conversions see it.
    pub fn register_transformer(
        &mut self,
        kind: StorageKind,
        transformer: ValueTransformer,
    ) -> Option<ValueTransformer> {
        let previous = self.registry.register(kind, transformer);
        self.cache.clear();
        previous
    }

    pub fn registry(&self) -> &TransformerRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Number of model types with a cached schema
    pub fn cached_schema_count(&self) -> usize {
        self.cache.len()
    }

    /// Compiled schema and transformers for `M`
    pub fn compiled<M: JsonSerializing>(&self) -> Result<Arc<CompiledModel>> {
        if self.config.cache_schemas {
            self.cache.get_or_compile::<M>(&self.registry)
        } else {
            CompiledModel::compile::<M>(&self.registry).map(Arc::new)
        }
    }

    /// Adapter view for one model type, with an optional key filter for encoding
    pub fn for_model<M: JsonSerializing>(&self) -> ModelAdapter<'_, M> {
        ModelAdapter::new(self)
    }

    /// Decode one model from a JSON object
    pub fn decode_one<M: JsonSerializing>(&self, json: &Value) -> Result<M> {
        match json {
            Value::Object(map) => self.decode_object(map),
            other => {
                let error = ConversionError::InvalidSource {
                    model: M::model_name(),
                    found: json_kind(other),
                };
                log::debug!("decode of {} rejected: {}", M::model_name(), error);
                Err(error)
            }
        }
    }

    /// Decode every element of `json` in order; the first failure aborts
    /// the batch with `NestedFailure`
    pub fn decode_many<M: JsonSerializing>(&self, json: &[Value]) -> Result<Vec<M>> {
        json.iter()
            .enumerate()
            .map(|(index, element)| {
                self.decode_one::<M>(element).map_err(|cause| ConversionError::NestedFailure {
                    index,
                    cause: Box::new(cause),
                })
            })
            .collect()
    }

    /// Decode a JSON array of objects
    pub fn decode_array<M: JsonSerializing>(&self, json: &Value) -> Result<Vec<M>> {
        match json {
            Value::Array(elements) => self.decode_many(elements),
            other => Err(ConversionError::InvalidSource {
                model: M::model_name(),
                found: json_kind(other),
            }),
        }
    }

    /// Encode one model into a JSON object
    pub fn encode_one<M: JsonSerializing>(&self, model: &M) -> Result<Value> {
        self.encode_filtered(model, &AllKeys)
    }

    /// Encode every model in order; the first failure aborts the batch with
    /// `NestedFailure`
    pub fn encode_many<M: JsonSerializing>(&self, models: &[M]) -> Result<Vec<Value>> {
        models
            .iter()
            .enumerate()
            .map(|(index, model)| {
                self.encode_one(model).map_err(|cause| ConversionError::NestedFailure {
                    index,
                    cause: Box::new(cause),
                })
            })
            .collect()
    }

    pub(crate) fn decode_object<M: JsonSerializing>(&self, json: &JsonMap) -> Result<M> {
        let model_name = M::model_name();
        let span = tracing::debug_span!("decode", model = model_name);
        let _enter = span.enter();

        let mut context = ConversionContext::new(model_name, Direction::Decode);
        context.advance(ConversionStage::SourceValidated);

        match guard::catch(|| M::class_for_parsing(json)) {
            Err(message) => {
                return Err(context.fail(callback_panicked(model_name, "class_for_parsing", message)))
            }
            Ok(ClassSelection::Abort) => {
                return Err(context.fail(ConversionError::NoClassFound { model: model_name }))
            }
            Ok(ClassSelection::Class(class)) if !class.is::<M>() => {
                log::debug!("Decoding {} as {}", model_name, class.name());
                context.advance(ConversionStage::ClassResolved);
                let result = class.decode(self, json);
                return context.finish(result);
            }
            Ok(_) => context.advance(ConversionStage::ClassResolved),
        }

        let compiled = self.compiled::<M>().map_err(|e| context.fail(e))?;
        context.attach_schema(Arc::clone(&compiled));

        let values = self
            .read_properties::<M>(&compiled, json)
            .map_err(|e| context.fail(e))?;
        context.advance(ConversionStage::PropertiesConverted);

        let model = match guard::catch(|| M::from_properties(values)) {
            Ok(Ok(model)) => model,
            Ok(Err(cause)) => {
                return Err(context.fail(ConversionError::ValidationFailed {
                    model: model_name,
                    cause,
                }))
            }
            Err(message) => {
                return Err(context.fail(callback_panicked(model_name, "from_properties", message)))
            }
        };

        match guard::catch(|| model.validate()) {
            Ok(Ok(())) => {}
            Ok(Err(cause)) => {
                return Err(context.fail(ConversionError::ValidationFailed {
                    model: model_name,
                    cause,
                }))
            }
            Err(message) => {
                return Err(context.fail(callback_panicked(model_name, "validate", message)))
            }
        }
        context.advance(ConversionStage::Validated);

        context.finish(Ok(model))
    }

    fn read_properties<M: JsonSerializing>(
        &self,
        compiled: &CompiledModel,
        json: &JsonMap,
    ) -> Result<PropertyValues> {
        let mut values = PropertyValues::new();

        for property in compiled.schema().mapped() {
            let raw = match &property.mapping {
                PropertyMapping::Single(path) => path.get(json).cloned().map(PropertyValue::from_json),
                PropertyMapping::Merged(paths) => {
                    merge::gather(paths, json).map(|merged| PropertyValue::from_json(Value::Object(merged)))
                }
                PropertyMapping::Excluded => continue,
            }
            .unwrap_or_default();

            let value = match compiled.transformer(property.name) {
                Some(resolved) if !raw.is_empty() => self.apply::<M>(
                    &resolved.transformer,
                    property.name,
                    &raw,
                    Direction::Decode,
                )?,
                _ => raw,
            };
            values.insert(property.name, value);
        }

        Ok(values)
    }

    fn encode_filtered<M, F>(&self, model: &M, filter: &F) -> Result<Value>
    where
        M: JsonSerializing,
        F: SerializableKeys<M> + ?Sized,
    {
        let model_name = M::model_name();
        let span = tracing::debug_span!("encode", model = model_name);
        let _enter = span.enter();

        let mut context = ConversionContext::new(model_name, Direction::Encode);
        context.advance(ConversionStage::SourceValidated);

        match guard::catch(|| model.class_for_model()) {
            Err(message) => {
                return Err(context.fail(callback_panicked(model_name, "class_for_model", message)))
            }
            Ok(Some(class)) if !class.is::<M>() => {
                log::debug!("Encoding {} as {}", model_name, class.name());
                context.advance(ConversionStage::ClassResolved);
                let result = class.encode(self, model);
                return context.finish(result);
            }
            Ok(_) => context.advance(ConversionStage::ClassResolved),
        }

        let compiled = self.compiled::<M>().map_err(|e| context.fail(e))?;
        context.attach_schema(Arc::clone(&compiled));

        let all_keys = compiled.schema().mapped_keys();
        let selected = guard::catch(|| filter.serializable_keys(&all_keys, model))
            .map_err(|message| context.fail(callback_panicked(model_name, "serializable_keys", message)))?;
        let values = guard::catch(|| model.property_values())
            .map_err(|message| context.fail(callback_panicked(model_name, "property_values", message)))?;

        let mut json = JsonMap::new();
        for property in compiled
            .schema()
            .mapped()
            .filter(|property| selected.contains(&property.name))
        {
            let value = values.get(property.name);
            let encoded = if value.is_absent() {
                match self.config.absent_on_encode {
                    AbsentPolicy::Skip => continue,
                    AbsentPolicy::Null => Ok(Value::Null),
                }
            } else {
                self.encode_value::<M>(&compiled, property, value)
            };

            let encoded = match encoded {
                Ok(encoded) => encoded,
                Err(error) if self.config.encode_failure == EncodeFailurePolicy::OmitKey => {
                    log::warn!("Omitting {}.{} from JSON: {}", model_name, property.name, error);
                    continue;
                }
                Err(error) => return Err(context.fail(error)),
            };

            write_property(model_name, property, encoded, &mut json).map_err(|e| context.fail(e))?;
        }
        context.advance(ConversionStage::PropertiesConverted);

        context.finish(Ok(Value::Object(json)))
    }

    fn encode_value<M: JsonSerializing>(
        &self,
        compiled: &CompiledModel,
        property: &PropertySchema,
        value: &PropertyValue,
    ) -> Result<Value> {
        let transformed = match compiled.transformer(property.name) {
            Some(resolved) if resolved.transformer.is_reversible() => {
                self.apply::<M>(&resolved.transformer, property.name, value, Direction::Encode)?
            }
            _ => value.clone(),
        };

        let failed = |cause| ConversionError::TransformFailed {
            model: M::model_name(),
            property: property.name.to_string(),
            cause,
        };

        let json = transformed.to_json().map_err(failed)?;
        let merged = matches!(property.mapping, PropertyMapping::Merged(_));
        if merged && !matches!(json, Value::Object(_) | Value::Null) {
            return Err(failed(TransformError::invalid_input(
                "merge mapping",
                "map",
                json_kind(&json),
            )));
        }
        Ok(json)
    }

    fn apply<M: JsonSerializing>(
        &self,
        transformer: &ValueTransformer,
        property: &str,
        value: &PropertyValue,
        direction: Direction,
    ) -> Result<PropertyValue> {
        let context = TransformContext::new(self, M::model_name(), property);
        let outcome = guard::catch(|| match direction {
            Direction::Decode => transformer.transform(value, &context),
            Direction::Encode => transformer.reverse_transform(value, &context),
        });

        let cause = match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(cause)) => cause,
            Err(message) => TransformError::Panicked {
                transformer: transformer.name().to_string(),
                message,
            },
        };

        Err(ConversionError::TransformFailed {
            model: M::model_name(),
            property: property.to_string(),
            cause,
        })
    }
}

impl Default for JsonAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JsonAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonAdapter")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("cached_schemas", &self.cache.len())
            .finish()
    }
}

fn callback_panicked(model: &'static str, callback: &str, message: String) -> ConversionError {
    ConversionError::ValidationFailed {
        model,
        cause: anyhow::anyhow!("{} panicked: {}", callback, message),
    }
}

fn write_property(
    model: &'static str,
    property: &PropertySchema,
    value: Value,
    json: &mut JsonMap,
) -> Result<()> {
    let written = match (&property.mapping, value) {
        (PropertyMapping::Single(path), value) => path.set(json, value),
        (PropertyMapping::Merged(paths), Value::Object(merged)) => merge::scatter(paths, &merged, json),
        (PropertyMapping::Merged(paths), value) => paths
            .iter()
            .try_for_each(|path| path.set(json, value.clone())),
        (PropertyMapping::Excluded, _) => Ok(()),
    };

    written.map_err(|e| ConversionError::invalid_mapping(model, Some(property.name), e.to_string()))
}

/// Chooses which mapped properties of a model are written during encoding
pub trait SerializableKeys<M> {
    /// Subset of `all_keys` to encode for `model`. Names outside `all_keys`
    /// are ignored.
    fn serializable_keys(&self, all_keys: &[&'static str], model: &M) -> Vec<&'static str>;
}

/// Encodes every mapped property
#[derive(Debug, Clone, Copy, Default)]
pub struct AllKeys;

impl<M> SerializableKeys<M> for AllKeys {
    fn serializable_keys(&self, all_keys: &[&'static str], _model: &M) -> Vec<&'static str> {
        all_keys.to_vec()
    }
}

impl<M, F> SerializableKeys<M> for F
where
    F: Fn(&[&'static str], &M) -> Vec<&'static str>,
{
    fn serializable_keys(&self, all_keys: &[&'static str], model: &M) -> Vec<&'static str> {
        self(all_keys, model)
    }
}

/// [`JsonAdapter`] bound to one model type, with a configurable key filter.
///
/// The filter applies to the top-level model only; nested models and
/// class-cluster redirects encode every mapped key.
pub struct ModelAdapter<'a, M> {
    adapter: &'a JsonAdapter,
    filter: Box<dyn SerializableKeys<M> + 'a>,
}

impl<'a, M: JsonSerializing> ModelAdapter<'a, M> {
    fn new(adapter: &'a JsonAdapter) -> Self {
        Self {
            adapter,
            filter: Box::new(AllKeys),
        }
    }

    /// Filter the keys written by `encode_one`/`encode_many`
    pub fn with_key_filter<F>(self, filter: F) -> Self
    where
        F: Fn(&[&'static str], &M) -> Vec<&'static str> + 'a,
    {
        self.with_serializable_keys(filter)
    }

    pub fn with_serializable_keys(mut self, filter: impl SerializableKeys<M> + 'a) -> Self {
        self.filter = Box::new(filter);
        self
    }

    pub fn adapter(&self) -> &'a JsonAdapter {
        self.adapter
    }

    pub fn compiled(&self) -> Result<Arc<CompiledModel>> {
        self.adapter.compiled::<M>()
    }

    pub fn decode_one(&self, json: &Value) -> Result<M> {
        self.adapter.decode_one(json)
    }

    pub fn decode_many(&self, json: &[Value]) -> Result<Vec<M>> {
        self.adapter.decode_many(json)
    }

    pub fn encode_one(&self, model: &M) -> Result<Value> {
        self.adapter.encode_filtered(model, self.filter.as_ref())
    }

    pub fn encode_many(&self, models: &[M]) -> Result<Vec<Value>> {
        models
            .iter()
            .enumerate()
            .map(|(index, model)| {
                self.encode_one(model).map_err(|cause| ConversionError::NestedFailure {
                    index,
                    cause: Box::new(cause),
                })
            })
            .collect()
    }
}

impl<M> fmt::Debug for ModelAdapter<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelAdapter")
            .field("adapter", self.adapter)
            .finish_non_exhaustive()
    }
}
