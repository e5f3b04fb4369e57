//! Value transformation between JSON values and model property values
//!
//! # Module Organization
//!
//! - [`types`] - `ValueTransformer`, `TransformContext` and resolution results
//! - [`registry`] - per-kind transformer registry and precedence resolution
//! - [`built_in`] - ready-made transformers (booleans, URLs, dates, nested models, ...)
//!
//! # Examples
//!
//! ```
//! use modelmap_core::transformer::{built_in, TransformContext};
//! use modelmap_core::PropertyValue;
//!
//! let status = built_in::value_mapping(
//!     [("open", 0i64), ("closed", 1i64)],
//!     None,
//!     None,
//! );
//! let context = TransformContext::detached("status");
//!
//! let decoded = status.transform(&"closed".into(), &context).unwrap();
//! assert_eq!(decoded, PropertyValue::from(1i64));
//!
//! let encoded = status.reverse_transform(&decoded, &context).unwrap();
//! assert_eq!(encoded, PropertyValue::from("closed"));
//! ```
//!
//! Copyright (c) 2025 Modelmap Team
//! Licensed under the Apache-2.0 license

pub mod built_in;
pub mod registry;
pub mod types;


pub use registry::TransformerRegistry;
pub use types::{
    ResolvedTransformer, TransformContext, TransformFn, TransformerSource, ValueTransformer,
};
