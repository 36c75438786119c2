// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire-format serializers.
//!
//! A serializer turns an [`Object`] into bytes of one concrete format and
//! back. Decoding happens in two steps:
//!
//! 1. [`Serializer::read_envelope`] checks whether the bytes belong to this
//!    format and, if so, splits them into a type marker and a field tree.
//! 2. [`resolve`] merges the marker with the caller's hint, allocates the
//!    registered type through the [`Scheme`] and loads the fields.
//!
//! Step 2 is identical for every format, so the marker-wins rule lives in
//! one place.
//!
//! | Format | Media type | Claims input when |
//! |--------|------------|-------------------|
//! | binary | `application/vnd.apischeme.binary` | it starts with the `ASB\0` magic |
//! | JSON | `application/json` | first non-whitespace byte is `{` |
//! | YAML | `application/yaml` | it parses as a YAML mapping or its first line reads `key:` |

mod binary;
mod json;
mod yaml;

pub use binary::{BinarySerializer, DEFAULT_MAX_DEPTH, FORMAT_VERSION, MAGIC, MAX_DEPTH_LIMIT};
pub use json::JsonSerializer;
pub use yaml::YamlSerializer;

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{Result, SchemeError};
use crate::gvk::{GroupVersion, GroupVersionKind};
use crate::object::{value_kind, Object, API_VERSION_FIELD, KIND_FIELD};
use crate::scheme::Scheme;

pub const MEDIA_TYPE_JSON: &str = "application/json";
pub const MEDIA_TYPE_YAML: &str = "application/yaml";
pub const MEDIA_TYPE_BINARY: &str = "application/vnd.apischeme.binary";

/// Media types in decode preference order (most specific first).
pub const MEDIA_TYPES: [&str; 3] = [MEDIA_TYPE_BINARY, MEDIA_TYPE_JSON, MEDIA_TYPE_YAML];

/// Static description of a serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializerInfo {
    pub media_type: &'static str,
    /// Short name used in logs (`"json"`, `"yaml"`, `"binary"`).
    pub identifier: &'static str,
    pub pretty: bool,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A payload split into its type marker and its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub api_version: Option<String>,
    pub kind: Option<String>,
    /// Field map without `apiVersion`/`kind`.
    pub fields: Value,
}

impl Envelope {
    /// Split a self-describing map. Empty marker strings count as absent.
    pub fn from_map(mut map: Map<String, Value>) -> Result<Self> {
        let api_version = take_marker(&mut map, API_VERSION_FIELD)?;
        let kind = take_marker(&mut map, KIND_FIELD)?;
        Ok(Envelope {
            api_version,
            kind,
            fields: Value::Object(map),
        })
    }

    /// Inverse of [`Envelope::from_map`]: the marker first, then the fields.
    pub(crate) fn into_map(gvk: &GroupVersionKind, fields: Value) -> Result<Map<String, Value>> {
        let fields = match fields {
            Value::Object(map) => map,
            other => {
                return Err(SchemeError::encode(format!(
                    "{} fields must be a map, got {}",
                    gvk.kind,
                    value_kind(&other)
                )))
            }
        };

        let mut map = Map::with_capacity(fields.len() + 2);
        map.insert(API_VERSION_FIELD.into(), Value::String(gvk.api_version()));
        map.insert(KIND_FIELD.into(), Value::String(gvk.kind.clone()));
        map.extend(fields);
        Ok(map)
    }
}

fn take_marker(map: &mut Map<String, Value>, key: &str) -> Result<Option<String>> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(SchemeError::decode(format!(
            "'{}' must be a string, got {}",
            key,
            value_kind(&other)
        ))),
    }
}

// ---------------------------------------------------------------------------
// Decoded
// ---------------------------------------------------------------------------

/// Non-fatal findings of a successful decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// The embedded kind and the caller's hint disagree; the embedded kind
    /// was used.
    KindMismatch { embedded: String, hinted: String },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeWarning::KindMismatch { embedded, hinted } => write!(
                f,
                "payload kind {} overrides requested kind {}",
                embedded, hinted
            ),
        }
    }
}

/// Result of a successful decode.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub object: Box<dyn Object>,
    /// The GVK the payload was resolved to.
    pub gvk: GroupVersionKind,
    pub warnings: Vec<DecodeWarning>,
}

// ---------------------------------------------------------------------------
// Serializer
// ---------------------------------------------------------------------------

/// Encode/decode between objects and one concrete wire format.
pub trait Serializer: Send + Sync + fmt::Debug {
    fn info(&self) -> SerializerInfo;

    fn scheme(&self) -> &Arc<Scheme>;

    /// Write a marker plus field map in this format.
    fn write_envelope(&self, gvk: &GroupVersionKind, fields: Value) -> Result<Vec<u8>>;

    /// `Ok(None)` if the bytes are not in this format, `Err(Decode)` if they
    /// are but cannot be parsed.
    fn read_envelope(&self, data: &[u8]) -> Result<Option<Envelope>>;

    /// Encode at the first GVK the object's type was registered under.
    fn encode(&self, object: &dyn Object) -> Result<Vec<u8>> {
        let (kinds, _) = self.scheme().object_kinds(object)?;
        let gvk = kinds.first().ok_or_else(|| SchemeError::TypeNotRegistered {
            tag: object.type_tag(),
            scheme: self.scheme().name().to_string(),
        })?;
        self.encode_as(object, gvk)
    }

    /// Encode with an explicit type marker.
    ///
    /// # Errors
    ///
    /// - `NotRegistered` if `gvk` is unknown.
    /// - `Encode` if `gvk` belongs to another type or a field cannot be
    ///   represented.
    fn encode_as(&self, object: &dyn Object, gvk: &GroupVersionKind) -> Result<Vec<u8>> {
        let descriptor = self
            .scheme()
            .descriptor(gvk)
            .ok_or_else(|| SchemeError::NotRegistered(gvk.clone()))?;
        if descriptor.type_tag != object.type_tag() {
            return Err(SchemeError::encode(format!(
                "object of type {} cannot be encoded as {} (registered to {})",
                object.type_tag(),
                gvk,
                descriptor.type_tag
            )));
        }
        self.write_envelope(gvk, object.to_fields()?)
    }

    /// Decode bytes that are expected to be in this format.
    fn decode(&self, data: &[u8], hint: Option<&GroupVersionKind>) -> Result<Decoded> {
        match self.read_envelope(data)? {
            Some(envelope) => resolve(self.scheme(), envelope, hint),
            None => Err(SchemeError::decode(format!(
                "payload is not {}",
                self.info().media_type
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve an envelope to a registered type and load its fields.
///
/// The embedded marker wins over the hint field by field. Empty hint fields
/// count as absent.
pub fn resolve(
    scheme: &Scheme,
    envelope: Envelope,
    hint: Option<&GroupVersionKind>,
) -> Result<Decoded> {
    let hint = hint.filter(|h| !h.is_empty());
    let mut warnings = Vec::new();

    let group_version = match &envelope.api_version {
        Some(api_version) => GroupVersion::parse(api_version)
            .map_err(|_| SchemeError::decode(format!("invalid apiVersion {:?}", api_version)))?,
        None => match hint {
            Some(h) if !h.version.is_empty() => h.group_version(),
            _ => return Err(SchemeError::decode("object 'apiVersion' is missing")),
        },
    };

    let hinted_kind = hint.map(|h| h.kind.as_str()).filter(|k| !k.is_empty());
    let kind = match (&envelope.kind, hinted_kind) {
        (Some(embedded), Some(hinted)) => {
            if embedded != hinted {
                tracing::warn!(
                    "payload kind {} disagrees with requested kind {}, using payload kind",
                    embedded,
                    hinted
                );
                warnings.push(DecodeWarning::KindMismatch {
                    embedded: embedded.clone(),
                    hinted: hinted.to_string(),
                });
            }
            embedded.clone()
        }
        (Some(embedded), None) => embedded.clone(),
        (None, Some(hinted)) => hinted.to_string(),
        (None, None) => return Err(SchemeError::decode("object 'kind' is missing")),
    };

    let gvk = group_version.with_kind(kind);
    let mut object = scheme.new_object(&gvk)?;
    object.load_fields(envelope.fields)?;
    tracing::trace!("resolved payload to {}", gvk);

    Ok(Decoded {
        object,
        gvk,
        warnings,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::object::{ObjectMeta, Resource, TypeTag};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    pub const GROUP: &str = "flowcontrol.apiserver.k8s.io";

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FlowSchema {
        #[serde(default)]
        pub metadata: ObjectMeta,
        #[serde(default)]
        pub matching_precedence: i32,
        #[serde(default)]
        pub weight: f64,
        #[serde(default)]
        pub tags: Vec<String>,
    }

    impl Resource for FlowSchema {
        const TYPE_TAG: TypeTag = TypeTag::new("test/v1beta3.FlowSchema");
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct PriorityLevelConfiguration {
        #[serde(default)]
        pub metadata: ObjectMeta,
    }

    impl Resource for PriorityLevelConfiguration {
        const TYPE_TAG: TypeTag = TypeTag::new("test/v1beta3.PriorityLevelConfiguration");
    }

    pub fn gvk(kind: &str) -> GroupVersionKind {
        GroupVersionKind::new(GROUP, "v1beta3", kind)
    }

    pub fn test_scheme() -> Arc<Scheme> {
        let mut scheme = Scheme::new("test");
        let gv = GroupVersion::new(GROUP, "v1beta3");
        scheme.add_known_type::<FlowSchema>(&gv, "FlowSchema").unwrap();
        scheme
            .add_known_type::<PriorityLevelConfiguration>(&gv, "PriorityLevelConfiguration")
            .unwrap();
        Arc::new(scheme)
    }

    pub fn sample() -> FlowSchema {
        FlowSchema {
            metadata: ObjectMeta::named("test-flowschema").with_namespace("default"),
            matching_precedence: 500,
            weight: 0.25,
            tags: vec!["a".into(), "b".into()],
        }
    }

    fn envelope(value: Value) -> Envelope {
        match value {
            Value::Object(map) => Envelope::from_map(map).unwrap(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn envelope_splits_marker_from_fields() {
        let env = envelope(json!({
            "apiVersion": "flowcontrol.apiserver.k8s.io/v1beta3",
            "kind": "FlowSchema",
            "metadata": { "name": "x" }
        }));
        assert_eq!(env.api_version.as_deref(), Some("flowcontrol.apiserver.k8s.io/v1beta3"));
        assert_eq!(env.kind.as_deref(), Some("FlowSchema"));
        assert_eq!(env.fields, json!({ "metadata": { "name": "x" } }));
    }

    #[test]
    fn non_string_marker_is_a_decode_error() {
        let map = match json!({ "kind": 7 }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert!(matches!(Envelope::from_map(map), Err(SchemeError::Decode { .. })));
    }

    #[test]
    fn marker_alone_resolves() {
        let scheme = test_scheme();
        let env = envelope(json!({
            "apiVersion": "flowcontrol.apiserver.k8s.io/v1beta3",
            "kind": "FlowSchema",
            "matchingPrecedence": 7
        }));
        let decoded = resolve(&scheme, env, None).unwrap();
        assert_eq!(decoded.gvk, gvk("FlowSchema"));
        assert!(decoded.warnings.is_empty());
        let fs = decoded.object.downcast_ref::<FlowSchema>().unwrap();
        assert_eq!(fs.matching_precedence, 7);
    }

    #[test]
    fn hint_fills_missing_marker() {
        let scheme = test_scheme();
        let env = envelope(json!({ "metadata": { "name": "typeless" } }));
        let decoded = resolve(&scheme, env, Some(&gvk("FlowSchema"))).unwrap();
        assert_eq!(decoded.gvk, gvk("FlowSchema"));
    }

    #[test]
    fn marker_kind_wins_with_warning() {
        let scheme = test_scheme();
        let env = envelope(json!({
            "apiVersion": "flowcontrol.apiserver.k8s.io/v1beta3",
            "kind": "PriorityLevelConfiguration"
        }));
        let decoded = resolve(&scheme, env, Some(&gvk("FlowSchema"))).unwrap();
        assert_eq!(decoded.gvk, gvk("PriorityLevelConfiguration"));
        assert!(decoded.object.is::<PriorityLevelConfiguration>());
        assert_eq!(
            decoded.warnings,
            vec![DecodeWarning::KindMismatch {
                embedded: "PriorityLevelConfiguration".into(),
                hinted: "FlowSchema".into(),
            }]
        );
    }

    #[test]
    fn marker_version_wins_over_hint_version() {
        let scheme = test_scheme();
        let env = envelope(json!({
            "apiVersion": "flowcontrol.apiserver.k8s.io/v1beta3",
            "kind": "FlowSchema"
        }));
        let hint = GroupVersionKind::new(GROUP, "v1", "FlowSchema");
        let decoded = resolve(&scheme, env, Some(&hint)).unwrap();
        assert_eq!(decoded.gvk, gvk("FlowSchema"));
        assert!(decoded.warnings.is_empty());
    }

    #[test]
    fn missing_kind_or_version_is_a_decode_error() {
        let scheme = test_scheme();
        let no_kind = envelope(json!({ "apiVersion": "flowcontrol.apiserver.k8s.io/v1beta3" }));
        assert!(matches!(
            resolve(&scheme, no_kind, None),
            Err(SchemeError::Decode { .. })
        ));

        let no_version = envelope(json!({ "kind": "FlowSchema" }));
        let hint = GroupVersionKind::new(GROUP, "", "FlowSchema");
        assert!(matches!(
            resolve(&scheme, no_version, Some(&hint)),
            Err(SchemeError::Decode { .. })
        ));
    }

    #[test]
    fn unknown_kind_is_not_registered() {
        let scheme = test_scheme();
        let env = envelope(json!({
            "apiVersion": "flowcontrol.apiserver.k8s.io/v1beta3",
            "kind": "Unknown"
        }));
        let err = resolve(&scheme, env, None).unwrap_err();
        assert_eq!(err, SchemeError::NotRegistered(gvk("Unknown")));
    }

    #[test]
    fn encode_as_rejects_foreign_gvk() {
        let scheme = test_scheme();
        let json = JsonSerializer::new(scheme);
        let err = json
            .encode_as(&sample(), &gvk("PriorityLevelConfiguration"))
            .unwrap_err();
        assert!(matches!(err, SchemeError::Encode { .. }));

        let err = json.encode_as(&sample(), &gvk("Missing")).unwrap_err();
        assert!(matches!(err, SchemeError::NotRegistered(_)));
    }

    #[test]
    fn every_format_roundtrips_fields_and_gvk() {
        let scheme = test_scheme();
        let serializers: Vec<Box<dyn Serializer>> = vec![
            Box::new(JsonSerializer::new(scheme.clone())),
            Box::new(JsonSerializer::new(scheme.clone()).with_pretty(true)),
            Box::new(YamlSerializer::new(scheme.clone())),
            Box::new(BinarySerializer::new(scheme.clone())),
        ];

        for serializer in serializers {
            let bytes = serializer.encode(&sample()).unwrap();
            let decoded = serializer.decode(&bytes, None).unwrap();
            assert_eq!(decoded.gvk, gvk("FlowSchema"), "{}", serializer.info().identifier);
            assert_eq!(
                decoded.object.downcast_ref::<FlowSchema>(),
                Some(&sample()),
                "{}",
                serializer.info().identifier
            );
        }
    }

    #[test]
    fn encoding_an_unregistered_type_fails() {
        let scheme = Arc::new(Scheme::new("empty"));
        let err = JsonSerializer::new(scheme).encode(&sample()).unwrap_err();
        assert!(err.is_not_registered());
    }

    #[test]
    fn serializer_info_describes_each_format() {
        let scheme = test_scheme();
        let infos = [
            BinarySerializer::new(scheme.clone()).info(),
            JsonSerializer::new(scheme.clone()).info(),
            YamlSerializer::new(scheme).info(),
        ];
        assert_eq!(infos.map(|i| i.media_type), MEDIA_TYPES);
        assert_eq!(infos.map(|i| i.identifier), ["binary", "json", "yaml"]);
        assert_eq!(infos.map(|i| i.pretty), [false, false, true]);
    }
}
