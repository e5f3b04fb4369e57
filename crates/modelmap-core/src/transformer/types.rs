//! Core types for value transformation
//!
//! A [`ValueTransformer`] pairs a forward function (JSON side → model side)
//! with an optional reverse function. Both sides are [`PropertyValue`]s so
//! transformers compose freely (see `built_in::array_mapping`).
//!
//! Copyright (c) 2025 Modelmap Team
//! Licensed under the Apache-2.0 license

use crate::adapter::JsonAdapter;
use crate::error::TransformError;
use crate::value::PropertyValue;
use std::fmt;
use std::sync::Arc;

/// Signature shared by forward and reverse transform functions
pub type TransformFn =
    dyn Fn(&PropertyValue, &TransformContext<'_>) -> Result<PropertyValue, TransformError> + Send + Sync;

/// Information available to a transformer while it runs
#[derive(Clone, Copy)]
pub struct TransformContext<'a> {
    adapter: &'a JsonAdapter,
    model: &'static str,
    property: &'a str,
}

impl<'a> TransformContext<'a> {
    pub fn new(adapter: &'a JsonAdapter, model: &'static str, property: &'a str) -> Self {
        Self {
            adapter,
            model,
            property,
        }
    }

    /// Context bound to the shared adapter, for invoking transformers directly
    pub fn detached(property: &'a str) -> Self {
        Self::new(JsonAdapter::shared(), "", property)
    }

    /// Adapter driving the current conversion; nested models convert through it
    pub fn adapter(&self) -> &'a JsonAdapter {
        self.adapter
    }

    pub fn model(&self) -> &'static str {
        self.model
    }

    pub fn property(&self) -> &'a str {
        self.property
    }
}

impl fmt::Debug for TransformContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformContext")
            .field("model", &self.model)
            .field("property", &self.property)
            .finish()
    }
}

/// A named forward transform with an optional reverse transform
#[derive(Clone)]
pub struct ValueTransformer {
    name: Arc<str>,
    forward: Arc<TransformFn>,
    reverse: Option<Arc<TransformFn>>,
}

impl ValueTransformer {
    /// A transformer that only converts JSON values into model values
    pub fn forward_only<F>(name: impl Into<String>, forward: F) -> Self
    where
        F: Fn(&PropertyValue, &TransformContext<'_>) -> Result<PropertyValue, TransformError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: shared_name(name),
            forward: Arc::new(forward),
            reverse: None,
        }
    }

    /// A transformer that converts in both directions
    pub fn reversible<F, R>(name: impl Into<String>, forward: F, reverse: R) -> Self
    where
        F: Fn(&PropertyValue, &TransformContext<'_>) -> Result<PropertyValue, TransformError>
            + Send
            + Sync
            + 'static,
        R: Fn(&PropertyValue, &TransformContext<'_>) -> Result<PropertyValue, TransformError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: shared_name(name),
            forward: Arc::new(forward),
            reverse: Some(Arc::new(reverse)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_reversible(&self) -> bool {
        self.reverse.is_some()
    }

    /// Apply the forward transform. `Absent` and `Null` pass through untouched.
    pub fn transform(
        &self,
        value: &PropertyValue,
        context: &TransformContext<'_>,
    ) -> Result<PropertyValue, TransformError> {
        if value.is_empty() {
            return Ok(value.clone());
        }
        (self.forward)(value, context)
    }

    /// Apply the reverse transform. `Absent` and `Null` pass through untouched.
    pub fn reverse_transform(
        &self,
        value: &PropertyValue,
        context: &TransformContext<'_>,
    ) -> Result<PropertyValue, TransformError> {
        let reverse = self.reverse.as_ref().ok_or_else(|| TransformError::NotReversible {
            transformer: self.name.to_string(),
        })?;
        if value.is_empty() {
            return Ok(value.clone());
        }
        (**reverse)(value, context)
    }

    /// Swap the forward and reverse directions
    pub fn inverted(&self) -> Result<ValueTransformer, TransformError> {
        let reverse = self.reverse.clone().ok_or_else(|| TransformError::NotReversible {
            transformer: self.name.to_string(),
        })?;
        Ok(Self {
            name: Arc::from(format!("inverted({})", self.name)),
            forward: reverse,
            reverse: Some(Arc::clone(&self.forward)),
        })
    }
}

fn shared_name(name: impl Into<String>) -> Arc<str> {
    let name: String = name.into();
    Arc::from(name)
}

impl fmt::Debug for ValueTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueTransformer")
            .field("name", &self.name)
            .field("reversible", &self.is_reversible())
            .finish()
    }
}

/// Which precedence level supplied a resolved transformer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformerSource {
    /// Returned by the model's `transformer_for_key`
    ModelDeclared,
    /// Registered for the property's declared reference type
    DeclaredType,
    /// Registered for the property's primitive storage kind
    PrimitiveKind,
}

/// A transformer picked for one property of one model type
#[derive(Debug, Clone)]
pub struct ResolvedTransformer {
    pub transformer: ValueTransformer,
    pub source: TransformerSource,
}
