//! Builder for configuring a [`JsonAdapter`]
//!
//! Copyright (c) 2025 Modelmap Team
//! Licensed under the Apache-2.0 license

use super::JsonAdapter;
use crate::config::{AbsentPolicy, AdapterConfig, EncodeFailurePolicy};
use crate::model::{PrimitiveKind, ReferenceType, StorageKind};
use crate::transformer::{TransformerRegistry, ValueTransformer};

/// Fluent builder for [`JsonAdapter`]
#[derive(Debug, Clone)]
pub struct JsonAdapterBuilder {
    config: AdapterConfig,
    registry: TransformerRegistry,
}

impl JsonAdapterBuilder {
    /// Start from the default configuration and the built-in transformers
    pub fn new() -> Self {
        Self {
            config: AdapterConfig::default(),
            registry: TransformerRegistry::with_built_ins(),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn encode_failure(mut self, policy: EncodeFailurePolicy) -> Self {
        self.config.encode_failure = policy;
        self
    }

    pub fn absent_on_encode(mut self, policy: AbsentPolicy) -> Self {
        self.config.absent_on_encode = policy;
        self
    }

    pub fn cache_schemas(mut self, enabled: bool) -> Self {
        self.config.cache_schemas = enabled;
        self
    }

    /// Register a transformer for a storage kind
    pub fn transformer(mut self, kind: StorageKind, transformer: ValueTransformer) -> Self {
        self.registry.register(kind, transformer);
        self
    }

    /// Unregister the URL and boolean transformers (the built-ins unless replaced)
    pub fn without_built_ins(mut self) -> Self {
        self.registry
            .unregister(StorageKind::Reference(ReferenceType::Url));
        self.registry
            .unregister(StorageKind::Primitive(PrimitiveKind::Bool));
        self
    }

    /// Build the adapter
    pub fn build(self) -> JsonAdapter {
        JsonAdapter::from_parts(self.registry, self.config)
    }
}

impl Default for JsonAdapterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
