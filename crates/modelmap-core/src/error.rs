//! Error types for the modelmap core library
//!
//! Every failure the engine can produce is returned as a value. Conversion
//! failures are described by [`ConversionError`], whose variants nest so that a
//! failure deep inside a batch or a nested model can still be traced back to
//! the element and property that caused it (see [`ConversionError::path`]).
//!
//! Copyright (c) 2025 Modelmap Team
//! Licensed under the Apache-2.0 license

use std::fmt;
use thiserror::Error;

/// Main error type for conversions between models and JSON trees
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The model's classifier aborted parsing of the given JSON object
    #[error("No model class found: {model} declined to parse the given JSON object")]
    NoClassFound { model: &'static str },

    /// The source JSON is not an object (or, for batches, not a list of objects)
    #[error("Invalid JSON source for {model}: expected an object, found {found}")]
    InvalidSource {
        model: &'static str,
        found: &'static str,
    },

    /// The model's declared schema is internally inconsistent
    #[error("Invalid JSON mapping for {model}: {message}")]
    InvalidMapping {
        model: &'static str,
        key: Option<String>,
        message: String,
    },

    /// A value transformer rejected a property value
    #[error("Transformation of {model}.{property} failed: {cause}")]
    TransformFailed {
        model: &'static str,
        property: String,
        #[source]
        cause: TransformError,
    },

    /// The model rejected itself after its properties were populated
    #[error("Validation of {model} failed: {cause}")]
    ValidationFailed {
        model: &'static str,
        #[source]
        cause: anyhow::Error,
    },

    /// One element of a batch conversion failed
    #[error("Conversion of element {index} failed: {cause}")]
    NestedFailure {
        index: usize,
        #[source]
        cause: Box<ConversionError>,
    },
}

/// Convenience type alias for Results using [`ConversionError`]
pub type Result<T> = std::result::Result<T, ConversionError>;

impl ConversionError {
    pub(crate) fn invalid_mapping(
        model: &'static str,
        key: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        ConversionError::InvalidMapping {
            model,
            key: key.map(str::to_string),
            message: message.into(),
        }
    }

    /// Human-readable location of the failure, e.g. `[1].owner.homepage`.
    ///
    /// Batch indices render as `[n]`, property names are joined with `.`.
    /// Returns an empty string when the failure is not tied to a location.
    pub fn path(&self) -> String {
        let mut segments = Vec::new();
        self.collect_path(&mut segments);
        render_path(&segments)
    }

    /// The innermost error after unwrapping batch and nested-model layers
    pub fn root_cause(&self) -> &ConversionError {
        match self {
            ConversionError::NestedFailure { cause, .. } => cause.root_cause(),
            ConversionError::TransformFailed {
                cause: TransformError::Nested(inner),
                ..
            } => inner.root_cause(),
            other => other,
        }
    }

    fn collect_path(&self, out: &mut Vec<PathSegment>) {
        match self {
            ConversionError::NestedFailure { index, cause } => {
                out.push(PathSegment::Index(*index));
                cause.collect_path(out);
            }
            ConversionError::TransformFailed {
                property, cause, ..
            } => {
                out.push(PathSegment::Property(property.clone()));
                cause.collect_path(out);
            }
            _ => {}
        }
    }
}

/// Errors reported by value transformers
#[derive(Error, Debug)]
pub enum TransformError {
    /// The input value has a shape the transformer cannot handle
    #[error("{transformer} cannot convert {value}: expected {expected}")]
    InvalidInput {
        transformer: String,
        expected: &'static str,
        value: String,
    },

    /// A formatter could not parse or render the value
    #[error("{0}")]
    Format(String),

    /// An element of a list failed to transform
    #[error("Could not transform value at index {offset}: {source}")]
    Element {
        offset: usize,
        #[source]
        source: Box<TransformError>,
    },

    /// A reverse transformation was requested from a forward-only transformer
    #[error("Transformer '{transformer}' does not allow reverse transformation")]
    NotReversible { transformer: String },

    /// A model-side value has no JSON form and nothing converted it
    #[error("A {kind} value has no JSON representation; register a reversible transformer for it")]
    Unrepresentable { kind: &'static str },

    /// A nested model failed to convert
    #[error("Nested model conversion failed: {0}")]
    Nested(#[source] Box<ConversionError>),

    /// The transformer panicked
    #[error("Transformer '{transformer}' panicked: {message}")]
    Panicked { transformer: String, message: String },

    /// Any other failure raised by a user-supplied transformer
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TransformError {
    /// Create an `InvalidInput` error describing `value`
    pub fn invalid_input(
        transformer: impl Into<String>,
        expected: &'static str,
        value: impl fmt::Debug,
    ) -> Self {
        TransformError::InvalidInput {
            transformer: transformer.into(),
            expected,
            value: format!("{:?}", value),
        }
    }

    fn collect_path(&self, out: &mut Vec<PathSegment>) {
        match self {
            TransformError::Nested(inner) => inner.collect_path(out),
            TransformError::Element { offset, source } => {
                out.push(PathSegment::Index(*offset));
                source.collect_path(out);
            }
            _ => {}
        }
    }
}

impl From<ConversionError> for TransformError {
    fn from(err: ConversionError) -> Self {
        TransformError::Nested(Box::new(err))
    }
}

/// Errors raised while parsing or writing key paths
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyPathError {
    /// The key path string was empty
    #[error("Key path is empty")]
    Empty,

    /// A segment between separators was empty
    #[error("Key path '{path}' has an empty segment at position {position}")]
    EmptySegment { path: String, position: usize },

    /// An intermediate node that must be descended into is not an object
    #[error("Cannot write '{path}': '{segment}' holds {found}, not an object")]
    NotAnObject {
        path: String,
        segment: String,
        found: &'static str,
    },
}

/// Errors raised while loading an [`AdapterConfig`](crate::config::AdapterConfig)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq)]
enum PathSegment {
    Index(usize),
    Property(String),
}

fn render_path(segments: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            PathSegment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
            PathSegment::Property(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform_failed(property: &str, cause: TransformError) -> ConversionError {
        ConversionError::TransformFailed {
            model: "User",
            property: property.to_string(),
            cause,
        }
    }

    #[test]
    fn test_error_display() {
        let err = ConversionError::InvalidSource {
            model: "User",
            found: "array",
        };
        assert_eq!(
            err.to_string(),
            "Invalid JSON source for User: expected an object, found array"
        );
    }

    #[test]
    fn test_path_through_batch_and_nested_model() {
        let inner = transform_failed("homepage", TransformError::Format("bad url".into()));
        let outer = transform_failed("owner", TransformError::Nested(Box::new(inner)));
        let err = ConversionError::NestedFailure {
            index: 1,
            cause: Box::new(outer),
        };

        assert_eq!(err.path(), "[1].owner.homepage");
    }

    #[test]
    fn test_path_through_array_elements() {
        let element = TransformError::Element {
            offset: 2,
            source: Box::new(TransformError::Format("nope".into())),
        };
        let err = transform_failed("links", element);
        assert_eq!(err.path(), "links[2]");
    }

    #[test]
    fn test_path_is_empty_without_location() {
        let err = ConversionError::NoClassFound { model: "Shape" };
        assert_eq!(err.path(), "");
    }

    #[test]
    fn test_root_cause_unwraps_layers() {
        let inner = ConversionError::ValidationFailed {
            model: "Owner",
            cause: anyhow::anyhow!("name missing"),
        };
        let err = ConversionError::NestedFailure {
            index: 0,
            cause: Box::new(transform_failed("owner", TransformError::from(inner))),
        };

        assert!(matches!(
            err.root_cause(),
            ConversionError::ValidationFailed { model: "Owner", .. }
        ));
    }
}
