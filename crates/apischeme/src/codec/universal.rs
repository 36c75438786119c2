// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Format-sniffing deserializer.

use std::sync::Arc;

use super::Decoder;
use crate::error::{Result, SchemeError};
use crate::gvk::GroupVersionKind;
use crate::scheme::Scheme;
use crate::serializer::{resolve, Decoded, Serializer};

/// Decodes any enabled format into the type named by the payload.
///
/// Serializers are asked in preference order. The first one that claims the
/// bytes owns the outcome, including a parse failure. No conversion and no
/// defaulting happen here.
#[derive(Debug, Clone)]
pub struct UniversalDeserializer {
    scheme: Arc<Scheme>,
    serializers: Vec<Arc<dyn Serializer>>,
}

impl UniversalDeserializer {
    pub(crate) fn new(scheme: Arc<Scheme>, serializers: Vec<Arc<dyn Serializer>>) -> Self {
        Self {
            scheme,
            serializers,
        }
    }

    pub fn scheme(&self) -> &Arc<Scheme> {
        &self.scheme
    }
}

impl Decoder for UniversalDeserializer {
    fn decode(&self, data: &[u8], hint: Option<&GroupVersionKind>) -> Result<Decoded> {
        for serializer in &self.serializers {
            if let Some(envelope) = serializer.read_envelope(data)? {
                tracing::trace!(
                    "{} serializer claimed {} byte payload",
                    serializer.info().identifier,
                    data.len()
                );
                return resolve(&self.scheme, envelope, hint);
            }
        }
        Err(SchemeError::UnrecognizedFormat)
    }
}
