// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec factory.
//!
//! A [`CodecFactory`] owns a finalized `Arc<Scheme>`, the enabled
//! serializers and a [`ConversionRegistry`]. It hands out two kinds of
//! codecs:
//!
//! - [`UniversalDeserializer`]: sniffs the format and decodes into whatever
//!   type the payload names.
//! - [`LegacyCodec`]: bound to one target group version; converts on the
//!   way in and out.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use apischeme::codec::{decode, encode, CodecFactory};
//! use apischeme::{GroupVersion, NoConversions, ObjectMeta, Resource, Scheme, TypeTag};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct Widget {
//!     metadata: ObjectMeta,
//! }
//!
//! impl Resource for Widget {
//!     const TYPE_TAG: TypeTag = TypeTag::new("demo/v1.Widget");
//! }
//!
//! let gv = GroupVersion::new("demo.example.com", "v1");
//! let mut scheme = Scheme::new("demo");
//! scheme.add_known_type::<Widget>(&gv, "Widget")?;
//!
//! let codecs = CodecFactory::new(Arc::new(scheme), Arc::new(NoConversions));
//! let bytes = encode(&codecs.legacy_codec(gv), &Widget::default())?;
//! let object = decode(&codecs.universal_deserializer(), &bytes)?;
//! assert!(object.is::<Widget>());
//! # Ok::<(), apischeme::SchemeError>(())
//! ```

mod legacy;
mod universal;

pub use legacy::LegacyCodec;
pub use universal::UniversalDeserializer;

use std::fmt;
use std::sync::Arc;

use crate::config::{CodecConfig, ConfigError};
use crate::conversion::ConversionRegistry;
use crate::error::Result;
use crate::gvk::{GroupVersion, GroupVersionKind};
use crate::object::Object;
use crate::scheme::Scheme;
use crate::serializer::{
    BinarySerializer, Decoded, JsonSerializer, Serializer, YamlSerializer, MEDIA_TYPES,
    MEDIA_TYPE_BINARY, MEDIA_TYPE_JSON, MEDIA_TYPE_YAML,
};

/// Turns objects into bytes.
pub trait Encoder: Send + Sync {
    fn encode(&self, object: &dyn Object) -> Result<Vec<u8>>;
}

/// Turns bytes into objects.
pub trait Decoder: Send + Sync {
    /// `hint` supplies whatever the payload's type marker leaves out.
    fn decode(&self, data: &[u8], hint: Option<&GroupVersionKind>) -> Result<Decoded>;
}

/// Encode `object` with `encoder`.
pub fn encode(encoder: &dyn Encoder, object: &dyn Object) -> Result<Vec<u8>> {
    encoder.encode(object)
}

/// Decode `data` with `decoder` and no hint, keeping only the object.
pub fn decode(decoder: &dyn Decoder, data: &[u8]) -> Result<Box<dyn Object>> {
    decoder.decode(data, None).map(|decoded| decoded.object)
}

/// Builds codecs over a finalized scheme.
#[derive(Clone)]
pub struct CodecFactory {
    scheme: Arc<Scheme>,
    /// Decode preference order.
    serializers: Vec<Arc<dyn Serializer>>,
    encoder: Arc<dyn Serializer>,
    conversions: Arc<dyn ConversionRegistry>,
}

impl CodecFactory {
    /// Every serializer enabled, legacy codecs encoding JSON.
    pub fn new(scheme: Arc<Scheme>, conversions: Arc<dyn ConversionRegistry>) -> Self {
        let json: Arc<dyn Serializer> = Arc::new(JsonSerializer::new(scheme.clone()));
        let serializers: Vec<Arc<dyn Serializer>> = vec![
            Arc::new(BinarySerializer::new(scheme.clone())),
            json.clone(),
            Arc::new(YamlSerializer::new(scheme.clone())),
        ];
        Self {
            scheme,
            serializers,
            encoder: json,
            conversions,
        }
    }

    /// Build from a [`CodecConfig`], validating it first.
    pub fn with_config(
        scheme: Arc<Scheme>,
        conversions: Arc<dyn ConversionRegistry>,
        config: &CodecConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let serializers: Vec<Arc<dyn Serializer>> = MEDIA_TYPES
            .iter()
            .filter(|media_type| config.is_enabled(media_type))
            .filter_map(|media_type| build_serializer(&scheme, media_type, config))
            .collect();

        let encoder = serializers
            .iter()
            .find(|s| s.info().media_type == config.encode_media_type)
            .cloned()
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "Encode media type '{}' is not an enabled serializer",
                    config.encode_media_type
                ))
            })?;

        tracing::debug!(
            "codec factory for scheme '{}': serializers {:?}, encoding {}",
            scheme.name(),
            serializers.iter().map(|s| s.info().identifier).collect::<Vec<_>>(),
            config.encode_media_type
        );

        Ok(Self {
            scheme,
            serializers,
            encoder,
            conversions,
        })
    }

    pub fn scheme(&self) -> &Arc<Scheme> {
        &self.scheme
    }

    /// Enabled media types in decode preference order.
    pub fn supported_media_types(&self) -> Vec<&'static str> {
        self.serializers.iter().map(|s| s.info().media_type).collect()
    }

    pub fn serializer_for(&self, media_type: &str) -> Option<Arc<dyn Serializer>> {
        self.serializers
            .iter()
            .find(|s| s.info().media_type == media_type)
            .cloned()
    }

    pub fn universal_deserializer(&self) -> UniversalDeserializer {
        UniversalDeserializer::new(self.scheme.clone(), self.serializers.clone())
    }

    /// Codec that encodes at `target` with the default encoder.
    pub fn legacy_codec(&self, target: GroupVersion) -> LegacyCodec {
        self.codec_with(self.encoder.clone(), target)
    }

    /// Like [`CodecFactory::legacy_codec`] but encoding with the serializer
    /// for `media_type`. `None` if that serializer is not enabled.
    pub fn encoder_for_version(&self, media_type: &str, target: GroupVersion) -> Option<LegacyCodec> {
        self.serializer_for(media_type)
            .map(|encoder| self.codec_with(encoder, target))
    }

    fn codec_with(&self, encoder: Arc<dyn Serializer>, target: GroupVersion) -> LegacyCodec {
        LegacyCodec::new(
            self.scheme.clone(),
            encoder,
            self.universal_deserializer(),
            self.conversions.clone(),
            target,
        )
    }
}

fn build_serializer(
    scheme: &Arc<Scheme>,
    media_type: &str,
    config: &CodecConfig,
) -> Option<Arc<dyn Serializer>> {
    let serializer: Arc<dyn Serializer> = match media_type {
        MEDIA_TYPE_BINARY => Arc::new(
            BinarySerializer::new(scheme.clone()).with_max_depth(config.binary_max_depth),
        ),
        MEDIA_TYPE_JSON => {
            Arc::new(JsonSerializer::new(scheme.clone()).with_pretty(config.pretty))
        }
        MEDIA_TYPE_YAML => Arc::new(YamlSerializer::new(scheme.clone())),
        _ => return None,
    };
    Some(serializer)
}

impl fmt::Debug for CodecFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecFactory")
            .field("scheme", &self.scheme.name())
            .field("serializers", &self.supported_media_types())
            .field("encoder", &self.encoder.info().media_type)
            .field("conversions", &self.conversions)
            .finish()
    }
}
