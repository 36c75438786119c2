// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Object model.
//!
//! The scheme never inspects live type information. Every concrete type
//! carries an explicit [`TypeTag`] chosen by its author, and instances travel
//! through the registry as `Box<dyn Object>`:
//!
//! ```text
//! Resource (typed, serde)  --blanket impl-->  Object (type-erased)
//!      |                                         |
//!      +-- TYPE_TAG ------------------------------+-- type_tag()
//!      +-- Serialize/Deserialize ----------------+-- to_fields()/load_fields()
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SchemeError};

/// Keys reserved for the type marker of self-describing envelopes.
pub const API_VERSION_FIELD: &str = "apiVersion";
pub const KIND_FIELD: &str = "kind";

// ---------------------------------------------------------------------------
// TypeTag
// ---------------------------------------------------------------------------

/// Stable identity of a concrete type, assigned at registration time.
///
/// Tags must be unique per concrete type within a scheme. The convention is
/// `"<group short name>/<version>.<Kind>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(&'static str);

impl TypeTag {
    pub const fn new(tag: &'static str) -> Self {
        Self(tag)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// A type-erased instance of a registered type.
pub trait Object: Any + Send + Sync + fmt::Debug {
    fn type_tag(&self) -> TypeTag;

    /// Field tree of this instance, without `apiVersion`/`kind`.
    ///
    /// # Errors
    ///
    /// Returns `SchemeError::Encode` if a field cannot be represented (for
    /// example a map with non-string keys) or the instance is not a map.
    fn to_fields(&self) -> Result<Value>;

    /// Replace this instance's fields with the given tree.
    ///
    /// # Errors
    ///
    /// Returns `SchemeError::Decode` if the tree does not match the type.
    fn load_fields(&mut self, fields: Value) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn clone_object(&self) -> Box<dyn Object>;
}

impl dyn Object {
    pub fn is<T: Object>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Object>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Recover the concrete type of a boxed object.
pub fn downcast<T: Object>(object: Box<dyn Object>) -> Option<Box<T>> {
    object.into_any().downcast::<T>().ok()
}

impl Clone for Box<dyn Object> {
    fn clone(&self) -> Self {
        self.clone_object()
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// A typed, serde-backed resource. Implementing it makes the type an
/// [`Object`].
pub trait Resource:
    Serialize + DeserializeOwned + Default + Clone + fmt::Debug + Send + Sync + 'static
{
    const TYPE_TAG: TypeTag;
}

impl<T: Resource> Object for T {
    fn type_tag(&self) -> TypeTag {
        T::TYPE_TAG
    }

    fn to_fields(&self) -> Result<Value> {
        let value = serde_json::to_value(self).map_err(|e| {
            SchemeError::encode(format!("{}: {}", T::TYPE_TAG, e))
        })?;
        // serde_json writes NaN and infinities as null.
        if contains_null(&value) {
            reject_non_finite(T::TYPE_TAG, self)?;
        }
        match value {
            Value::Object(mut map) => {
                map.remove(API_VERSION_FIELD);
                map.remove(KIND_FIELD);
                Ok(Value::Object(map))
            }
            other => Err(SchemeError::encode(format!(
                "{} must serialize to a map, got {}",
                T::TYPE_TAG,
                value_kind(&other)
            ))),
        }
    }

    fn load_fields(&mut self, fields: Value) -> Result<()> {
        *self = serde_json::from_value(fields)
            .map_err(|e| SchemeError::decode(format!("{}: {}", T::TYPE_TAG, e)))?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_object(&self) -> Box<dyn Object> {
        Box::new(self.clone())
    }
}

fn contains_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().any(contains_null),
        Value::Object(map) => map.values().any(contains_null),
        _ => false,
    }
}

/// Re-serialize through `serde_yaml`, whose value tree keeps non-finite
/// floats, and refuse them.
fn reject_non_finite<T: Serialize>(tag: TypeTag, object: &T) -> Result<()> {
    let tree = serde_yaml::to_value(object)
        .map_err(|e| SchemeError::encode(format!("{}: {}", tag, e)))?;
    if has_non_finite(&tree) {
        return Err(SchemeError::encode(format!(
            "{}: unsupported value: non-finite float",
            tag
        )));
    }
    Ok(())
}

fn has_non_finite(value: &serde_yaml::Value) -> bool {
    use serde_yaml::Value as Yaml;
    match value {
        Yaml::Number(n) => n.is_nan() || n.is_infinite(),
        Yaml::Sequence(items) => items.iter().any(has_non_finite),
        Yaml::Mapping(map) => map
            .iter()
            .any(|(k, v)| has_non_finite(k) || has_non_finite(v)),
        Yaml::Tagged(tagged) => has_non_finite(&tagged.value),
        _ => false,
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

// ---------------------------------------------------------------------------
// Common metadata
// ---------------------------------------------------------------------------

/// Metadata carried by every persisted resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_version: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub generation: i64,
}

impl ObjectMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.namespace = namespace.into();
    }
}

/// Metadata carried by list resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_version: String,
    #[serde(default, rename = "continue", skip_serializing_if = "String::is_empty")]
    pub continue_token: String,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}
