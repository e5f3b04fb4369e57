//! Built-in transformers for common value conversions
//!
//! `boolean` and `url` are registered by default (see
//! [`TransformerRegistry::with_built_ins`](super::TransformerRegistry::with_built_ins));
//! the rest are meant to be returned from a model's `transformer_for_key`.
//!
//! Copyright (c) 2025 Modelmap Team
//! Licensed under the Apache-2.0 license

use super::types::{TransformContext, ValueTransformer};
use crate::error::TransformError;
use crate::model::JsonSerializing;
use crate::value::PropertyValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Number;
use std::fmt::Write;
use ::url::Url;

/// JSON booleans or numbers (`0` is false, anything else true) ↔ `bool`
pub fn boolean() -> ValueTransformer {
    const NAME: &str = "boolean";
    ValueTransformer::reversible(
        NAME,
        |value, _| match value {
            PropertyValue::Bool(b) => Ok(PropertyValue::Bool(*b)),
            PropertyValue::Number(n) => Ok(PropertyValue::Bool(n.as_f64().is_some_and(|n| n != 0.0))),
            other => Err(TransformError::invalid_input(NAME, "boolean or number", other)),
        },
        |value, _| match value {
            PropertyValue::Bool(b) => Ok(PropertyValue::Bool(*b)),
            other => Err(TransformError::invalid_input(NAME, "boolean", other)),
        },
    )
}

/// URL strings ↔ [`Url`]
pub fn url() -> ValueTransformer {
    const NAME: &str = "url";
    ValueTransformer::reversible(
        NAME,
        |value, _| match value {
            PropertyValue::String(s) => Url::parse(s)
                .map(PropertyValue::Url)
                .map_err(|e| TransformError::Format(format!("Invalid URL \"{}\": {}", s, e))),
            PropertyValue::Url(url) => Ok(PropertyValue::Url(url.clone())),
            other => Err(TransformError::invalid_input(NAME, "URL string", other)),
        },
        |value, _| match value {
            PropertyValue::Url(url) => Ok(PropertyValue::String(url.as_str().to_string())),
            PropertyValue::String(s) => Ok(PropertyValue::String(s.clone())),
            other => Err(TransformError::invalid_input(NAME, "URL", other)),
        },
    )
}

/// Map JSON values to model values through a fixed table.
///
/// `pairs` lists `(json_value, model_value)`. Unmatched input falls back to
/// `default` (forward) or `reverse_default` (reverse) and fails with
/// `InvalidInput` when no fallback is given.
pub fn value_mapping<I, J, M>(
    pairs: I,
    default: Option<PropertyValue>,
    reverse_default: Option<PropertyValue>,
) -> ValueTransformer
where
    I: IntoIterator<Item = (J, M)>,
    J: Into<PropertyValue>,
    M: Into<PropertyValue>,
{
    const NAME: &str = "value_mapping";
    let table: Vec<(PropertyValue, PropertyValue)> = pairs
        .into_iter()
        .map(|(json, model)| (json.into(), model.into()))
        .collect();
    let reverse_table = table.clone();

    ValueTransformer::reversible(
        NAME,
        move |value, _| {
            table
                .iter()
                .find(|(json, _)| json == value)
                .map(|(_, model)| model.clone())
                .or_else(|| default.clone())
                .ok_or_else(|| TransformError::invalid_input(NAME, "a mapped value", value))
        },
        move |value, _| {
            reverse_table
                .iter()
                .find(|(_, model)| model == value)
                .map(|(json, _)| json.clone())
                .or_else(|| reverse_default.clone())
                .ok_or_else(|| TransformError::invalid_input(NAME, "a mapped value", value))
        },
    )
}

/// Apply `element` to every item of a list. Reversible iff `element` is.
pub fn array_mapping(element: ValueTransformer) -> ValueTransformer {
    let name = format!("array_mapping({})", element.name());
    if element.is_reversible() {
        let forward_element = element.clone();
        ValueTransformer::reversible(
            name,
            move |value, context| map_list(value, |item| forward_element.transform(item, context)),
            move |value, context| map_list(value, |item| element.reverse_transform(item, context)),
        )
    } else {
        ValueTransformer::forward_only(name, move |value, context| {
            map_list(value, |item| element.transform(item, context))
        })
    }
}

fn map_list<F>(value: &PropertyValue, mut apply: F) -> Result<PropertyValue, TransformError>
where
    F: FnMut(&PropertyValue) -> Result<PropertyValue, TransformError>,
{
    let items = value
        .as_list()
        .ok_or_else(|| TransformError::invalid_input("array_mapping", "list", value))?;

    items
        .iter()
        .enumerate()
        .map(|(offset, item)| {
            apply(item).map_err(|e| TransformError::Element {
                offset,
                source: Box::new(e),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(PropertyValue::List)
}

/// Date strings in a `strftime`-style `format` ↔ UTC dates.
///
/// Formats without an offset are read as UTC; formats without a time of day
/// are read as midnight.
pub fn date_format(format: impl Into<String>) -> ValueTransformer {
    let format: String = format.into();
    let reverse_format = format.clone();
    let name = format!("date_format({})", format);

    ValueTransformer::reversible(
        name,
        move |value, _| match value {
            PropertyValue::String(s) => parse_date(s, &format).map(PropertyValue::Date),
            PropertyValue::Date(date) => Ok(PropertyValue::Date(*date)),
            other => Err(TransformError::invalid_input("date_format", "date string", other)),
        },
        move |value, _| match value {
            PropertyValue::Date(date) => {
                let mut out = String::new();
                write!(out, "{}", date.format(&reverse_format)).map_err(|_| {
                    TransformError::Format(format!("Invalid date format \"{}\"", reverse_format))
                })?;
                Ok(PropertyValue::String(out))
            }
            other => Err(TransformError::invalid_input("date_format", "date", other)),
        },
    )
}

fn parse_date(input: &str, format: &str) -> Result<DateTime<Utc>, TransformError> {
    if let Ok(date) = DateTime::parse_from_str(input, format) {
        return Ok(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(input, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| TransformError::Format(format!("The value \"{}\" is invalid.", input)))
}

/// RFC 3339 strings ↔ UTC dates
pub fn rfc3339_date() -> ValueTransformer {
    const NAME: &str = "rfc3339_date";
    ValueTransformer::reversible(
        NAME,
        |value, _| match value {
            PropertyValue::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|date| PropertyValue::Date(date.with_timezone(&Utc)))
                .map_err(|e| TransformError::Format(format!("The value \"{}\" is invalid: {}", s, e))),
            other => Err(TransformError::invalid_input(NAME, "RFC 3339 string", other)),
        },
        |value, _| match value {
            PropertyValue::Date(date) => Ok(PropertyValue::String(
                date.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            )),
            other => Err(TransformError::invalid_input(NAME, "date", other)),
        },
    )
}

/// Decimal strings ↔ JSON numbers
pub fn number_string() -> ValueTransformer {
    const NAME: &str = "number_string";
    ValueTransformer::reversible(
        NAME,
        |value, _| match value {
            PropertyValue::String(s) => parse_number(s.trim())
                .map(PropertyValue::Number)
                .ok_or_else(|| TransformError::Format(format!("The value \"{}\" is invalid.", s))),
            PropertyValue::Number(n) => Ok(PropertyValue::Number(n.clone())),
            other => Err(TransformError::invalid_input(NAME, "numeric string", other)),
        },
        |value, _| match value {
            PropertyValue::Number(n) => Ok(PropertyValue::String(n.to_string())),
            other => Err(TransformError::invalid_input(NAME, "number", other)),
        },
    )
}

fn parse_number(input: &str) -> Option<Number> {
    if let Ok(n) = input.parse::<i64>() {
        return Some(n.into());
    }
    if let Ok(n) = input.parse::<u64>() {
        return Some(n.into());
    }
    input.parse::<f64>().ok().and_then(Number::from_f64)
}

/// JSON objects ↔ nested models of type `M`
pub fn dictionary<M: JsonSerializing>() -> ValueTransformer {
    ValueTransformer::reversible(
        format!("dictionary({})", M::model_name()),
        |value, context| {
            if value.as_map().is_none() {
                return Err(TransformError::invalid_input(M::model_name(), "JSON object", value));
            }
            let json = value.to_json()?;
            let model = context.adapter().decode_one::<M>(&json)?;
            Ok(PropertyValue::model(model))
        },
        |value, context| {
            let model = value
                .as_model::<M>()
                .ok_or_else(|| TransformError::invalid_input(M::model_name(), M::model_name(), value))?;
            let json = context.adapter().encode_one(model)?;
            Ok(PropertyValue::from_json(json))
        },
    )
}

/// Lists of JSON objects ↔ lists of nested models of type `M`
pub fn array_of<M: JsonSerializing>() -> ValueTransformer {
    array_mapping(dictionary::<M>())
}
