//! Modelmap Core - bidirectional mapping between JSON trees and typed models
//!
//! Models declare where each property lives in a JSON document (dotted key
//! paths, or several paths merged into one value) and, optionally, how each
//! value is transformed on the way in and out. The engine compiles those
//! declarations into a cached schema and converts single objects or whole
//! batches in either direction.
//!
//! # Main Components
//!
//! - **Key paths**: dotted paths into nested JSON objects, plus merge-mapping
//! - **Transformers**: forward/reverse value conversions and their registry
//! - **Schemas**: validated, cached property → key path mappings
//! - **Adapter**: single-object and batch decode/encode with class-cluster dispatch
//!
//! # Example
//!
//! ```
//! use modelmap_core::{AbsentPolicy, EncodeFailurePolicy, JsonAdapter};
//!
//! let adapter = JsonAdapter::builder()
//!     .encode_failure(EncodeFailurePolicy::OmitKey)
//!     .absent_on_encode(AbsentPolicy::Null)
//!     .build();
//! assert_eq!(adapter.registry().len(), 2);
//! ```
//!
//! See the [`adapter`] module for a complete model declaration.

pub mod adapter;
pub mod config;
pub mod error;
pub mod keypath;
pub mod model;
pub mod schema;
pub mod transformer;
pub mod value;

pub use adapter::{
    AllKeys, CompiledModel, ConversionContext, ConversionStage, Direction, JsonAdapter,
    JsonAdapterBuilder, ModelAdapter, SerializableKeys,
};
pub use config::{AbsentPolicy, AdapterConfig, EncodeFailurePolicy};
pub use error::{ConfigError, ConversionError, KeyPathError, Result, TransformError};
pub use keypath::KeyPath;
pub use model::{
    identity_key_paths, key_paths, ClassSelection, JsonKey, JsonSerializing,
    KeyPathDeclarations, Model, ModelClass, PrimitiveKind, PropertyDescriptor, ReferenceType,
    StorageKind,
};
pub use schema::{PropertyMapping, PropertySchema, Schema};
pub use transformer::{
    built_in, ResolvedTransformer, TransformContext, TransformerRegistry, TransformerSource,
    ValueTransformer,
};
pub use value::{
    FromPropertyValue, JsonMap, KindMismatch, ModelValue, PropertyValue, PropertyValues,
    ValueTypeError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_shared_adapter_is_a_singleton() {
        let first = JsonAdapter::shared() as *const JsonAdapter;
        let second = JsonAdapter::shared() as *const JsonAdapter;
        assert_eq!(first, second);
        assert_eq!(JsonAdapter::shared().config(), &AdapterConfig::default());
    }
}
