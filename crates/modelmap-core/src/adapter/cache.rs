//! Compiled schema cache
//!
//! Entries are keyed by model `TypeId` and never change once published.
//! Compilation runs outside the lock; when two callers race on the same type
//! the first published entry wins and the other result is dropped. Failed
//! compilations are never cached.
//!
//! Copyright (c) 2025 Modelmap Team
//! Licensed under the Apache-2.0 license

use super::guard;
use crate::error::{ConversionError, Result};
use crate::model::JsonSerializing;
use crate::schema::Schema;
use crate::transformer::{ResolvedTransformer, TransformerRegistry};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// A schema together with the transformer resolved for each mapped property
#[derive(Debug, Clone)]
pub struct CompiledModel {
    schema: Schema,
    transformers: HashMap<&'static str, ResolvedTransformer>,
}

impl CompiledModel {
    /// Compile the schema of `M` and resolve its transformers against `registry`
    pub fn compile<M: JsonSerializing>(registry: &TransformerRegistry) -> Result<Self> {
        let schema = Schema::compile::<M>()?;

        let mut transformers = HashMap::new();
        for property in schema.mapped() {
            let resolved = guard::catch(|| registry.resolve::<M>(property.name, property.kind))
                .map_err(|message| {
                    ConversionError::invalid_mapping(
                        schema.model(),
                        Some(property.name),
                        format!("transformer_for_key panicked: {}", message),
                    )
                })?;
            if let Some(resolved) = resolved {
                transformers.insert(property.name, resolved);
            }
        }

        Ok(Self {
            schema,
            transformers,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Transformer for `property`, or `None` when values pass through as-is
    pub fn transformer(&self, property: &str) -> Option<&ResolvedTransformer> {
        self.transformers.get(property)
    }
}

#[derive(Debug, Default)]
pub(crate) struct SchemaCache {
    entries: RwLock<HashMap<TypeId, Arc<CompiledModel>>>,
}

impl SchemaCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get<M: 'static>(&self) -> Option<Arc<CompiledModel>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<M>())
            .cloned()
    }

    /// Cached entry for `M`, compiling and publishing it on first use
    pub(crate) fn get_or_compile<M: JsonSerializing>(
        &self,
        registry: &TransformerRegistry,
    ) -> Result<Arc<CompiledModel>> {
        if let Some(compiled) = self.get::<M>() {
            return Ok(compiled);
        }

        let compiled = Arc::new(CompiledModel::compile::<M>(registry)?);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(TypeId::of::<M>()).or_insert(compiled)))
    }

    pub(crate) fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
