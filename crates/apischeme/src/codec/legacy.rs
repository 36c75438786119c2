// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Version-converting codec bound to one target group version.

use std::sync::Arc;

use super::{Decoder, Encoder, UniversalDeserializer};
use crate::conversion::ConversionRegistry;
use crate::error::{Result, SchemeError};
use crate::gvk::{GroupVersion, GroupVersionKind};
use crate::object::Object;
use crate::scheme::Scheme;
use crate::serializer::{Decoded, Serializer};

/// Encodes objects at `target` and decodes payloads into `target`,
/// converting between versions of the same group when needed.
#[derive(Debug, Clone)]
pub struct LegacyCodec {
    scheme: Arc<Scheme>,
    encoder: Arc<dyn Serializer>,
    decoder: UniversalDeserializer,
    conversions: Arc<dyn ConversionRegistry>,
    target: GroupVersion,
}

impl LegacyCodec {
    pub(crate) fn new(
        scheme: Arc<Scheme>,
        encoder: Arc<dyn Serializer>,
        decoder: UniversalDeserializer,
        conversions: Arc<dyn ConversionRegistry>,
        target: GroupVersion,
    ) -> Self {
        Self {
            scheme,
            encoder,
            decoder,
            conversions,
            target,
        }
    }

    pub fn target(&self) -> &GroupVersion {
        &self.target
    }

    /// Media type of the output.
    pub fn media_type(&self) -> &'static str {
        self.encoder.info().media_type
    }

    fn at_target<'a>(&self, kinds: &'a [GroupVersionKind]) -> Option<&'a GroupVersionKind> {
        kinds
            .iter()
            .find(|k| k.group == self.target.group && k.version == self.target.version)
    }

    fn no_path(&self, from: &GroupVersionKind) -> SchemeError {
        SchemeError::NoConversionPath {
            kind: from.kind.clone(),
            from: from.api_version(),
            to: self.target.api_version(),
        }
    }

    /// Run the converter for `from -> target` and report where the result
    /// landed.
    fn convert(
        &self,
        object: &dyn Object,
        from: &GroupVersionKind,
    ) -> Result<(Box<dyn Object>, GroupVersionKind)> {
        if from.group != self.target.group {
            return Err(self.no_path(from));
        }
        let convert = self
            .conversions
            .lookup(&from.kind, &from.group_version(), &self.target)
            .ok_or_else(|| self.no_path(from))?;

        tracing::debug!("converting {} to {}", from, self.target);
        let converted = convert(object)?;

        let (kinds, _) = self.scheme.object_kinds(&*converted)?;
        let gvk = self.at_target(&kinds).cloned().ok_or_else(|| {
            SchemeError::ConversionFailed {
                reason: format!(
                    "converter for {} produced type {}, which is not registered in {}",
                    from,
                    converted.type_tag(),
                    self.target
                ),
            }
        })?;
        Ok((converted, gvk))
    }
}

impl Encoder for LegacyCodec {
    fn encode(&self, object: &dyn Object) -> Result<Vec<u8>> {
        let (kinds, unversioned) = self.scheme.object_kinds(object)?;
        let native = kinds.first().ok_or_else(|| SchemeError::TypeNotRegistered {
            tag: object.type_tag(),
            scheme: self.scheme.name().to_string(),
        })?;

        if unversioned {
            let gvk = self.at_target(&kinds).unwrap_or(native);
            return self.encoder.encode_as(object, gvk);
        }

        if let Some(gvk) = self.at_target(&kinds) {
            return self.encoder.encode_as(object, gvk);
        }

        // Try every native version in this group before giving up.
        for from in kinds.iter().filter(|k| k.group == self.target.group) {
            match self.convert(object, from) {
                Err(SchemeError::NoConversionPath { .. }) => continue,
                converted => {
                    let (converted, gvk) = converted?;
                    return self.encoder.encode_as(&*converted, &gvk);
                }
            }
        }
        Err(self.no_path(native))
    }
}

impl Decoder for LegacyCodec {
    /// Only the kind of `hint` is used; group and version default to the
    /// target.
    fn decode(&self, data: &[u8], hint: Option<&GroupVersionKind>) -> Result<Decoded> {
        let kind = hint.map(|h| h.kind.as_str()).unwrap_or("");
        let hint = self.target.with_kind(kind);

        let mut decoded = self.decoder.decode(data, Some(&hint))?;
        self.scheme.default_object(&mut *decoded.object);

        let unversioned = self
            .scheme
            .descriptor(&decoded.gvk)
            .is_some_and(|d| d.unversioned);
        if unversioned || decoded.gvk.group_version() == self.target {
            return Ok(decoded);
        }

        let (mut converted, gvk) = self.convert(&*decoded.object, &decoded.gvk)?;
        self.scheme.default_object(&mut *converted);
        Ok(Decoded {
            object: converted,
            gvk,
            warnings: decoded.warnings,
        })
    }
}
