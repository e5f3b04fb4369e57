//! Adapter configuration
//!
//! Configuration can be built in code, or loaded from a YAML or JSON file:
//!
//! ```yaml
//! encode_failure: omit_key
//! absent_on_encode: "null"
//! cache_schemas: true
//! ```
//!
//! Copyright (c) 2025 Modelmap Team
//! Licensed under the Apache-2.0 license

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Behaviour of a [`JsonAdapter`](crate::JsonAdapter)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// What to do when a property fails to reverse-transform during encoding
    pub encode_failure: EncodeFailurePolicy,

    /// What to write for properties that hold no value
    pub absent_on_encode: AbsentPolicy,

    /// Compile each model's schema once and reuse it
    pub cache_schemas: bool,
}

/// Handling of per-property failures while encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodeFailurePolicy {
    /// The whole encode fails with `TransformFailed`
    #[default]
    Abort,
    /// The failing key is left out of the JSON and a warning is logged
    OmitKey,
}

/// Encoding of properties holding [`PropertyValue::Absent`](crate::PropertyValue::Absent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentPolicy {
    /// Leave the key out
    #[default]
    Skip,
    /// Write JSON `null` at the key
    Null,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            encode_failure: EncodeFailurePolicy::default(),
            absent_on_encode: AbsentPolicy::default(),
            cache_schemas: true,
        }
    }
}

impl AdapterConfig {
    /// Load configuration from a file; `.yaml`/`.yml` files are read as YAML,
    /// anything else as JSON
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AdapterConfig::default();
        assert_eq!(config.encode_failure, EncodeFailurePolicy::Abort);
        assert_eq!(config.absent_on_encode, AbsentPolicy::Skip);
        assert!(config.cache_schemas);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AdapterConfig::from_json_str(r#"{"encode_failure": "omit_key"}"#).unwrap();
        assert_eq!(config.encode_failure, EncodeFailurePolicy::OmitKey);
        assert_eq!(config.absent_on_encode, AbsentPolicy::Skip);
        assert!(config.cache_schemas);
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "absent_on_encode: \"null\"").unwrap();
        writeln!(file, "cache_schemas: false").unwrap();

        let config = AdapterConfig::from_file(file.path()).unwrap();
        assert_eq!(config.absent_on_encode, AbsentPolicy::Null);
        assert!(!config.cache_schemas);
        assert_eq!(config.encode_failure, EncodeFailurePolicy::Abort);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"encode_failure": "abort", "absent_on_encode": "null"}}"#).unwrap();

        let config = AdapterConfig::from_file(file.path()).unwrap();
        assert_eq!(config.absent_on_encode, AbsentPolicy::Null);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            AdapterConfig::from_json_str(r#"{"encode_failure": "retry"}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            AdapterConfig::from_yaml_str("cache_schemas: [1, 2]"),
            Err(ConfigError::Yaml(_))
        ));
        assert!(matches!(
            AdapterConfig::from_file("/nonexistent/modelmap.yaml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_serializes_snake_case() {
        let config = AdapterConfig {
            encode_failure: EncodeFailurePolicy::OmitKey,
            ..AdapterConfig::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["encode_failure"], "omit_key");
        assert_eq!(json["absent_on_encode"], "skip");
    }
}
