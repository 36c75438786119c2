// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec configuration.
//!
//! Supports both programmatic and file-based configuration.
//!
//! ```toml
//! encode_media_type = "application/yaml"
//! pretty = true
//! serializers = ["application/json", "application/yaml"]
//! binary_max_depth = 32
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::serializer::{DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT, MEDIA_TYPES, MEDIA_TYPE_JSON};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Codec factory configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Media type used by legacy codecs to encode.
    #[serde(default = "default_encode_media_type")]
    pub encode_media_type: String,

    /// Indent text output.
    #[serde(default)]
    pub pretty: bool,

    /// Enabled serializers. Decode preference is always binary, JSON, YAML
    /// among the enabled ones.
    #[serde(default = "default_serializers")]
    pub serializers: Vec<String>,

    /// Nesting limit for the binary format.
    #[serde(default = "default_binary_max_depth")]
    pub binary_max_depth: usize,
}

fn default_encode_media_type() -> String {
    MEDIA_TYPE_JSON.to_string()
}

fn default_serializers() -> Vec<String> {
    MEDIA_TYPES.iter().map(|m| m.to_string()).collect()
}

fn default_binary_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            encode_media_type: default_encode_media_type(),
            pretty: false,
            serializers: default_serializers(),
            binary_max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CodecConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serializers.is_empty() {
            return Err(ConfigError::Invalid("No serializers enabled".into()));
        }

        for (i, media_type) in self.serializers.iter().enumerate() {
            if !MEDIA_TYPES.contains(&media_type.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Unknown serializer media type '{}'",
                    media_type
                )));
            }
            if self.serializers[..i].contains(media_type) {
                return Err(ConfigError::Invalid(format!(
                    "Serializer '{}' listed twice",
                    media_type
                )));
            }
        }

        if !self.serializers.contains(&self.encode_media_type) {
            return Err(ConfigError::Invalid(format!(
                "Encode media type '{}' is not an enabled serializer",
                self.encode_media_type
            )));
        }

        if self.binary_max_depth == 0 || self.binary_max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "binary_max_depth must be between 1 and {}, got {}",
                MAX_DEPTH_LIMIT, self.binary_max_depth
            )));
        }

        Ok(())
    }

    /// Set the media type legacy codecs encode with.
    pub fn encode_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.encode_media_type = media_type.into();
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Replace the enabled serializer set.
    pub fn serializers<I, S>(mut self, media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.serializers = media_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn binary_max_depth(mut self, depth: usize) -> Self {
        self.binary_max_depth = depth;
        self
    }

    /// True if `media_type` is enabled.
    pub fn is_enabled(&self, media_type: &str) -> bool {
        self.serializers.iter().any(|m| m == media_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::{MEDIA_TYPE_BINARY, MEDIA_TYPE_YAML};
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = CodecConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.encode_media_type, MEDIA_TYPE_JSON);
        assert_eq!(config.serializers.len(), 3);
        assert_eq!(config.binary_max_depth, 64);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = CodecConfig::from_toml_str("").unwrap();
        assert_eq!(config, CodecConfig::default());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
encode_media_type = "application/yaml"
pretty = true
serializers = ["application/json", "application/yaml"]
binary_max_depth = 32
"#
        )
        .unwrap();

        let config = CodecConfig::from_file(file.path()).unwrap();
        assert_eq!(config.encode_media_type, MEDIA_TYPE_YAML);
        assert!(config.pretty);
        assert!(!config.is_enabled(MEDIA_TYPE_BINARY));
        assert_eq!(config.binary_max_depth, 32);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CodecConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_bad_toml() {
        let err = CodecConfig::from_toml_str("pretty = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_validation() {
        let unknown = CodecConfig::default().serializers(["application/xml"]);
        assert!(matches!(unknown.validate(), Err(ConfigError::Invalid(_))));

        let twice = CodecConfig::default().serializers([MEDIA_TYPE_JSON, MEDIA_TYPE_JSON]);
        assert!(matches!(twice.validate(), Err(ConfigError::Invalid(_))));

        let empty = CodecConfig::default().serializers(Vec::<String>::new());
        assert!(matches!(empty.validate(), Err(ConfigError::Invalid(_))));

        let disabled = CodecConfig::default()
            .serializers([MEDIA_TYPE_BINARY])
            .encode_media_type(MEDIA_TYPE_JSON);
        assert!(matches!(disabled.validate(), Err(ConfigError::Invalid(_))));

        let zero_depth = CodecConfig::default().binary_max_depth(0);
        assert!(matches!(zero_depth.validate(), Err(ConfigError::Invalid(_))));

        let deepest = CodecConfig::default().binary_max_depth(MAX_DEPTH_LIMIT);
        assert!(deepest.validate().is_ok());

        let too_deep = CodecConfig::default().binary_max_depth(1_000_000);
        assert!(matches!(too_deep.validate(), Err(ConfigError::Invalid(_))));

        let from_toml = CodecConfig::from_toml_str("binary_max_depth = 1000000").unwrap();
        assert!(matches!(from_toml.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_config_serialization() {
        let config = CodecConfig::default()
            .pretty(true)
            .encode_media_type(MEDIA_TYPE_BINARY);
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("pretty = true"));
        let back = CodecConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
