//! Transformer lookup by storage kind
//!
//! The registry holds transformers keyed by declared reference type and by
//! primitive storage kind. [`TransformerRegistry::resolve`] layers the
//! model's own per-key transformer on top:
//!
//! 1. `M::transformer_for_key(property)`
//! 2. the transformer registered for the property's reference type
//! 3. the transformer registered for the property's primitive kind
//! 4. none, values pass through untouched
//!
//! Copyright (c) 2025 Modelmap Team
//! Licensed under the Apache-2.0 license

use super::built_in;
use super::types::{ResolvedTransformer, TransformerSource, ValueTransformer};
use crate::model::{JsonSerializing, PrimitiveKind, ReferenceType, StorageKind};
use std::collections::HashMap;

/// Transformers registered per storage kind
#[derive(Debug, Clone, Default)]
pub struct TransformerRegistry {
    by_type: HashMap<ReferenceType, ValueTransformer>,
    by_primitive: HashMap<PrimitiveKind, ValueTransformer>,
}

impl TransformerRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the URL and boolean built-ins
    pub fn with_built_ins() -> Self {
        let mut registry = Self::new();
        registry.register(StorageKind::Reference(ReferenceType::Url), built_in::url());
        registry.register(StorageKind::Primitive(PrimitiveKind::Bool), built_in::boolean());
        registry
    }

    /// Register `transformer` for `kind`, returning the one it replaces
    pub fn register(
        &mut self,
        kind: StorageKind,
        transformer: ValueTransformer,
    ) -> Option<ValueTransformer> {
        match kind {
            StorageKind::Reference(ty) => self.by_type.insert(ty, transformer),
            StorageKind::Primitive(primitive) => self.by_primitive.insert(primitive, transformer),
        }
    }

    pub fn unregister(&mut self, kind: StorageKind) -> Option<ValueTransformer> {
        match kind {
            StorageKind::Reference(ty) => self.by_type.remove(&ty),
            StorageKind::Primitive(primitive) => self.by_primitive.remove(&primitive),
        }
    }

    /// Transformer registered for exactly `kind`, ignoring model overrides
    pub fn lookup(&self, kind: StorageKind) -> Option<&ValueTransformer> {
        match kind {
            StorageKind::Reference(ty) => self.by_type.get(&ty),
            StorageKind::Primitive(primitive) => self.by_primitive.get(&primitive),
        }
    }

    pub fn len(&self) -> usize {
        self.by_type.len() + self.by_primitive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pick the transformer for `property` of model `M`
    pub fn resolve<M: JsonSerializing>(
        &self,
        property: &str,
        kind: StorageKind,
    ) -> Option<ResolvedTransformer> {
        if let Some(transformer) = M::transformer_for_key(property) {
            return Some(ResolvedTransformer {
                transformer,
                source: TransformerSource::ModelDeclared,
            });
        }

        let (transformer, source) = match kind {
            StorageKind::Reference(ty) => (self.by_type.get(&ty)?, TransformerSource::DeclaredType),
            StorageKind::Primitive(primitive) => (
                self.by_primitive.get(&primitive)?,
                TransformerSource::PrimitiveKind,
            ),
        };

        Some(ResolvedTransformer {
            transformer: transformer.clone(),
            source,
        })
    }
}
