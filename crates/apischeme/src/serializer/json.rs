// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON serializer (`application/json`).

use std::sync::Arc;

use serde_json::Value;

use super::{Envelope, Serializer, SerializerInfo, MEDIA_TYPE_JSON};
use crate::error::{Result, SchemeError};
use crate::gvk::GroupVersionKind;
use crate::scheme::Scheme;

/// Structured-text serializer writing one JSON object per payload, with
/// `apiVersion` and `kind` next to the object's own fields.
#[derive(Debug, Clone)]
pub struct JsonSerializer {
    scheme: Arc<Scheme>,
    pretty: bool,
}

impl JsonSerializer {
    pub fn new(scheme: Arc<Scheme>) -> Self {
        Self {
            scheme,
            pretty: false,
        }
    }

    /// Indent output for humans.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Serializer for JsonSerializer {
    fn info(&self) -> SerializerInfo {
        SerializerInfo {
            media_type: MEDIA_TYPE_JSON,
            identifier: "json",
            pretty: self.pretty,
        }
    }

    fn scheme(&self) -> &Arc<Scheme> {
        &self.scheme
    }

    fn write_envelope(&self, gvk: &GroupVersionKind, fields: Value) -> Result<Vec<u8>> {
        let map = Envelope::into_map(gvk, fields)?;
        let out = if self.pretty {
            serde_json::to_vec_pretty(&map)
        } else {
            serde_json::to_vec(&map)
        };
        out.map_err(|e| SchemeError::encode(format!("json: {}", e)))
    }

    fn read_envelope(&self, data: &[u8]) -> Result<Option<Envelope>> {
        let first = data.iter().find(|b| !b.is_ascii_whitespace());
        if first != Some(&b'{') {
            return Ok(None);
        }

        match serde_json::from_slice::<Value>(data) {
            Ok(Value::Object(map)) => Envelope::from_map(map).map(Some),
            Ok(_) => Err(SchemeError::decode("json: payload is not an object")),
            Err(e) => Err(SchemeError::decode(format!("json: {}", e))),
        }
    }
}
