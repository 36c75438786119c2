// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! YAML serializer (`application/yaml`).
//!
//! YAML is a superset of JSON, so this serializer sits last in the decode
//! preference order and only claims payloads that parse as a mapping.

use std::sync::Arc;

use serde_json::Value;

use super::{Envelope, Serializer, SerializerInfo, MEDIA_TYPE_YAML};
use crate::error::{Result, SchemeError};
use crate::gvk::GroupVersionKind;
use crate::scheme::Scheme;

#[derive(Debug, Clone)]
pub struct YamlSerializer {
    scheme: Arc<Scheme>,
}

impl YamlSerializer {
    pub fn new(scheme: Arc<Scheme>) -> Self {
        Self { scheme }
    }
}

impl Serializer for YamlSerializer {
    fn info(&self) -> SerializerInfo {
        SerializerInfo {
            media_type: MEDIA_TYPE_YAML,
            identifier: "yaml",
            pretty: true,
        }
    }

    fn scheme(&self) -> &Arc<Scheme> {
        &self.scheme
    }

    fn write_envelope(&self, gvk: &GroupVersionKind, fields: Value) -> Result<Vec<u8>> {
        let map = Envelope::into_map(gvk, fields)?;
        serde_yaml::to_string(&map)
            .map(String::into_bytes)
            .map_err(|e| SchemeError::encode(format!("yaml: {}", e)))
    }

    fn read_envelope(&self, data: &[u8]) -> Result<Option<Envelope>> {
        let Ok(text) = std::str::from_utf8(data) else {
            return Ok(None);
        };
        if text.trim().is_empty() {
            return Ok(None);
        }

        match serde_yaml::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Envelope::from_map(map).map(Some),
            Ok(_) => Ok(None),
            Err(e) if starts_with_mapping_key(text) => {
                Err(SchemeError::decode(format!("yaml: {}", e)))
            }
            Err(_) => Ok(None),
        }
    }
}

/// True if the first content line reads `key:` or `key: value`.
fn starts_with_mapping_key(text: &str) -> bool {
    let Some(line) = text.lines().map(str::trim_end).find(|line| {
        let line = line.trim_start();
        !line.is_empty() && !line.starts_with('#') && !line.starts_with('%') && line != "---"
    }) else {
        return false;
    };
    let Some((key, rest)) = line.split_once(':') else {
        return false;
    };
    !key.is_empty()
        && !key.starts_with(|c: char| c.is_whitespace() || "-[{#&*!|>?".contains(c))
        && (rest.is_empty() || rest.starts_with(char::is_whitespace))
}
