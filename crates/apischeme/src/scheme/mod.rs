// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scheme: the registry mapping GVKs to type descriptors and back.
//!
//! # Architecture
//!
//! ```text
//! Scheme
//! +-- groups: BTreeMap<group, TypeTable>        (forward: GVK -> descriptor)
//! |           +-- version -> kind -> TypeDescriptor
//! +-- kinds_by_tag: HashMap<TypeTag, Vec<GVK>>  (reverse, registration order)
//! +-- defaulters: HashMap<TypeTag, Defaulter>
//! ```
//!
//! # Lifecycle
//!
//! Registration takes `&mut self` and happens during process start. Once the
//! scheme is wrapped in an `Arc` and handed to a
//! [`CodecFactory`](crate::codec::CodecFactory) it is read-only and safe for
//! any number of concurrent readers. Registrations are permanent; there is no
//! removal.

mod table;

pub use table::{ObjectFactory, TypeDescriptor, TypeTable};

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use table::Insert;

use crate::error::{Result, SchemeError};
use crate::gvk::{GroupVersion, GroupVersionKind};
use crate::object::{Object, Resource, TypeTag};

type Defaulter = Arc<dyn Fn(&mut dyn Object) + Send + Sync>;

/// Registry of known types, keyed by GVK and by [`TypeTag`].
pub struct Scheme {
    name: String,
    groups: BTreeMap<String, TypeTable>,
    kinds_by_tag: HashMap<TypeTag, Vec<GroupVersionKind>>,
    defaulters: HashMap<TypeTag, Defaulter>,
}

impl Scheme {
    /// Create an empty scheme. The name only appears in errors and logs.
    pub fn new(name: impl Into<String>) -> Self {
        Scheme {
            name: name.into(),
            groups: BTreeMap::new(),
            kinds_by_tag: HashMap::new(),
            defaulters: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Bind `gvk` to a type.
    ///
    /// Re-registering the same type tag under the same GVK is a no-op.
    ///
    /// # Errors
    ///
    /// - `DuplicateRegistration` if `gvk` is bound to a different type tag.
    /// - `InvalidRegistration` if the version or kind is empty.
    pub fn register(
        &mut self,
        gvk: GroupVersionKind,
        type_tag: TypeTag,
        factory: ObjectFactory,
        is_list: bool,
    ) -> Result<()> {
        self.insert(TypeDescriptor::new(gvk, type_tag, factory, is_list))
    }

    /// Register `T` as `kind` in `gv`. List-ness follows the `...List` naming
    /// convention.
    pub fn add_known_type<T: Resource>(&mut self, gv: &GroupVersion, kind: &str) -> Result<()> {
        self.register(
            gv.with_kind(kind),
            T::TYPE_TAG,
            Arc::new(|| Box::new(T::default()) as Box<dyn Object>),
            kind.ends_with("List"),
        )
    }

    /// Register `T` as a type whose instances do not change across versions
    /// of the group. Codecs never convert such objects.
    pub fn add_unversioned_type<T: Resource>(
        &mut self,
        gv: &GroupVersion,
        kind: &str,
    ) -> Result<()> {
        let mut descriptor = TypeDescriptor::new(
            gv.with_kind(kind),
            T::TYPE_TAG,
            Arc::new(|| Box::new(T::default()) as Box<dyn Object>),
            kind.ends_with("List"),
        );
        descriptor.unversioned = true;
        self.insert(descriptor)
    }

    /// Install a defaulting function for `T`, replacing any previous one.
    pub fn add_defaulting_func<T, F>(&mut self, func: F)
    where
        T: Resource,
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        let defaulter: Defaulter = Arc::new(move |object: &mut dyn Object| {
            if let Some(typed) = object.downcast_mut::<T>() {
                func(typed);
            }
        });
        self.defaulters.insert(T::TYPE_TAG, defaulter);
    }

    /// Fix the version preference order of `group`.
    ///
    /// # Errors
    ///
    /// `NotRegistered` if any listed version has no registered kind.
    pub fn set_version_priority(&mut self, group: &str, versions: &[&str]) -> Result<()> {
        let table = self
            .groups
            .get_mut(group)
            .ok_or_else(|| SchemeError::NotRegistered(GroupVersionKind::new(group, "", "")))?;

        for version in versions {
            if !table.has_version(version) {
                return Err(SchemeError::NotRegistered(GroupVersionKind::new(
                    group, *version, "",
                )));
            }
        }
        table.set_priority(versions.iter().map(|v| v.to_string()).collect());
        Ok(())
    }

    fn insert(&mut self, descriptor: TypeDescriptor) -> Result<()> {
        let gvk = descriptor.gvk.clone();
        if gvk.version.is_empty() {
            return Err(SchemeError::InvalidRegistration {
                gvk,
                reason: "version is required".into(),
            });
        }
        if gvk.kind.is_empty() {
            return Err(SchemeError::InvalidRegistration {
                gvk,
                reason: "kind is required".into(),
            });
        }

        let type_tag = descriptor.type_tag;
        let table = self.groups.entry(gvk.group.clone()).or_default();
        match table.insert(descriptor) {
            Insert::Exists(existing) if existing.type_tag == type_tag => {
                tracing::debug!("{} already registered to {}, skipping", gvk, type_tag);
                Ok(())
            }
            Insert::Exists(existing) => Err(SchemeError::DuplicateRegistration {
                gvk,
                existing: existing.type_tag,
                attempted: type_tag,
            }),
            Insert::Added => {
                tracing::debug!("scheme '{}': registered {} as {}", self.name, type_tag, gvk);
                self.kinds_by_tag.entry(type_tag).or_default().push(gvk);
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// True iff a descriptor exists for exactly this GVK.
    pub fn recognizes(&self, gvk: &GroupVersionKind) -> bool {
        self.descriptor(gvk).is_some()
    }

    pub fn descriptor(&self, gvk: &GroupVersionKind) -> Option<&TypeDescriptor> {
        self.groups
            .get(&gvk.group)
            .and_then(|table| table.get(&gvk.version, &gvk.kind))
    }

    /// Every GVK the object's type is registered under, in registration
    /// order, and whether the type is unversioned.
    ///
    /// # Errors
    ///
    /// `TypeNotRegistered` if the object's type tag was never registered.
    pub fn object_kinds(&self, object: &dyn Object) -> Result<(Vec<GroupVersionKind>, bool)> {
        let tag = object.type_tag();
        let kinds = self
            .kinds_by_tag
            .get(&tag)
            .ok_or_else(|| SchemeError::TypeNotRegistered {
                tag,
                scheme: self.name.clone(),
            })?;

        let unversioned = kinds
            .iter()
            .filter_map(|gvk| self.descriptor(gvk))
            .any(|d| d.unversioned);
        Ok((kinds.clone(), unversioned))
    }

    /// Allocate a zero-value instance of the type registered at `gvk`.
    ///
    /// # Errors
    ///
    /// `NotRegistered` if `gvk` is unknown.
    pub fn new_object(&self, gvk: &GroupVersionKind) -> Result<Box<dyn Object>> {
        self.descriptor(gvk)
            .map(TypeDescriptor::new_object)
            .ok_or_else(|| SchemeError::NotRegistered(gvk.clone()))
    }

    pub fn is_unversioned(&self, object: &dyn Object) -> Result<bool> {
        self.object_kinds(object).map(|(_, unversioned)| unversioned)
    }

    /// Apply the defaulting function registered for the object's type, if any.
    pub fn default_object(&self, object: &mut dyn Object) {
        if let Some(defaulter) = self.defaulters.get(&object.type_tag()) {
            defaulter(object);
        }
    }

    /// Kind names registered in `gv`, sorted.
    pub fn known_kinds(&self, gv: &GroupVersion) -> Vec<String> {
        self.groups
            .get(&gv.group)
            .map(|table| table.kinds(&gv.version))
            .unwrap_or_default()
    }

    /// Every registered GVK, sorted.
    pub fn all_known_kinds(&self) -> Vec<GroupVersionKind> {
        let mut all: Vec<GroupVersionKind> = self
            .groups
            .values()
            .flat_map(|table| table.descriptors().map(|d| d.gvk.clone()))
            .collect();
        all.sort();
        all
    }

    pub fn is_group_registered(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    pub fn is_version_registered(&self, gv: &GroupVersion) -> bool {
        self.groups
            .get(&gv.group)
            .is_some_and(|table| table.has_version(&gv.version))
    }

    /// Versions of `group`, most preferred first.
    pub fn prioritized_versions(&self, group: &str) -> Vec<GroupVersion> {
        self.groups
            .get(group)
            .map(|table| {
                table
                    .prioritized_versions()
                    .into_iter()
                    .map(|v| GroupVersion::new(group, v))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The default version of `group`.
    pub fn preferred_version(&self, group: &str) -> Option<GroupVersion> {
        self.groups
            .get(group)
            .and_then(|table| table.default_version())
            .map(|v| GroupVersion::new(group, v))
    }
}

impl Default for Scheme {
    fn default() -> Self {
        Self::new("scheme")
    }
}

impl fmt::Debug for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheme")
            .field("name", &self.name)
            .field("groups", &self.groups.keys().collect::<Vec<_>>())
            .field("types", &self.kinds_by_tag.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectMeta;
    use serde::{Deserialize, Serialize};

    const GROUP: &str = "flowcontrol.apiserver.k8s.io";

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct FlowSchema {
        metadata: ObjectMeta,
        #[serde(default)]
        precedence: i32,
    }

    impl Resource for FlowSchema {
        const TYPE_TAG: TypeTag = TypeTag::new("test/v1beta3.FlowSchema");
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct FlowSchemaList {
        items: Vec<FlowSchema>,
    }

    impl Resource for FlowSchemaList {
        const TYPE_TAG: TypeTag = TypeTag::new("test/v1beta3.FlowSchemaList");
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Status {
        message: String,
    }

    impl Resource for Status {
        const TYPE_TAG: TypeTag = TypeTag::new("test/meta.Status");
    }

    fn v1beta3() -> GroupVersion {
        GroupVersion::new(GROUP, "v1beta3")
    }

    #[test]
    fn recognizes_only_after_register() {
        let mut scheme = Scheme::new("test");
        let gvk = v1beta3().with_kind("FlowSchema");
        assert!(!scheme.recognizes(&gvk));

        scheme.add_known_type::<FlowSchema>(&v1beta3(), "FlowSchema").unwrap();
        assert!(scheme.recognizes(&gvk));
        assert!(!scheme.recognizes(&v1beta3().with_kind("Flow")));
        assert!(!scheme.recognizes(&GroupVersionKind::new("", "v1beta3", "FlowSchema")));
    }

    #[test]
    fn list_types_share_the_table() {
        let mut scheme = Scheme::new("test");
        scheme.add_known_type::<FlowSchema>(&v1beta3(), "FlowSchema").unwrap();
        scheme
            .add_known_type::<FlowSchemaList>(&v1beta3(), "FlowSchemaList")
            .unwrap();

        let list = scheme
            .descriptor(&v1beta3().with_kind("FlowSchemaList"))
            .unwrap();
        assert!(list.is_list);
        assert!(!scheme
            .descriptor(&v1beta3().with_kind("FlowSchema"))
            .unwrap()
            .is_list);
        assert_eq!(
            scheme.known_kinds(&v1beta3()),
            vec!["FlowSchema", "FlowSchemaList"]
        );
    }

    #[test]
    fn new_object_then_object_kinds() {
        let mut scheme = Scheme::new("test");
        scheme.add_known_type::<FlowSchema>(&v1beta3(), "FlowSchema").unwrap();

        let gvk = v1beta3().with_kind("FlowSchema");
        let object = scheme.new_object(&gvk).unwrap();
        assert!(object.is::<FlowSchema>());

        let (kinds, unversioned) = scheme.object_kinds(object.as_ref()).unwrap();
        assert_eq!(kinds, vec![gvk]);
        assert!(!unversioned);
    }

    #[test]
    fn unknown_gvk_and_type_are_not_registered() {
        let scheme = Scheme::new("test");
        let err = scheme
            .new_object(&v1beta3().with_kind("FlowSchema"))
            .unwrap_err();
        assert!(matches!(err, SchemeError::NotRegistered(_)));

        let err = scheme.object_kinds(&FlowSchema::default()).unwrap_err();
        assert!(matches!(err, SchemeError::TypeNotRegistered { .. }));
        assert!(err.is_not_registered());
    }

    #[test]
    fn duplicate_registration_rules() {
        let mut scheme = Scheme::new("test");
        scheme.add_known_type::<FlowSchema>(&v1beta3(), "FlowSchema").unwrap();

        // Same type: idempotent.
        scheme.add_known_type::<FlowSchema>(&v1beta3(), "FlowSchema").unwrap();
        let (kinds, _) = scheme.object_kinds(&FlowSchema::default()).unwrap();
        assert_eq!(kinds.len(), 1);

        // Different type: rejected, original binding kept.
        let err = scheme
            .add_known_type::<FlowSchemaList>(&v1beta3(), "FlowSchema")
            .unwrap_err();
        assert_eq!(
            err,
            SchemeError::DuplicateRegistration {
                gvk: v1beta3().with_kind("FlowSchema"),
                existing: FlowSchema::TYPE_TAG,
                attempted: FlowSchemaList::TYPE_TAG,
            }
        );
        assert!(scheme
            .new_object(&v1beta3().with_kind("FlowSchema"))
            .unwrap()
            .is::<FlowSchema>());
        assert!(scheme.object_kinds(&FlowSchemaList::default()).is_err());
    }

    #[test]
    fn empty_version_or_kind_is_rejected() {
        let mut scheme = Scheme::new("test");
        let err = scheme
            .add_known_type::<FlowSchema>(&GroupVersion::new(GROUP, ""), "FlowSchema")
            .unwrap_err();
        assert!(matches!(err, SchemeError::InvalidRegistration { .. }));
        let err = scheme.add_known_type::<FlowSchema>(&v1beta3(), "").unwrap_err();
        assert!(matches!(err, SchemeError::InvalidRegistration { .. }));
        assert!(!scheme.is_group_registered(GROUP));
    }

    #[test]
    fn type_shared_across_versions_reports_all_kinds_in_order() {
        let mut scheme = Scheme::new("test");
        let v1 = GroupVersion::new(GROUP, "v1");
        scheme.add_known_type::<FlowSchema>(&v1beta3(), "FlowSchema").unwrap();
        scheme.add_known_type::<FlowSchema>(&v1, "FlowSchema").unwrap();

        let (kinds, _) = scheme.object_kinds(&FlowSchema::default()).unwrap();
        assert_eq!(
            kinds,
            vec![v1beta3().with_kind("FlowSchema"), v1.with_kind("FlowSchema")]
        );
    }

    #[test]
    fn unversioned_types_are_flagged() {
        let mut scheme = Scheme::new("test");
        scheme
            .add_unversioned_type::<Status>(&GroupVersion::new("", "v1"), "Status")
            .unwrap();
        assert!(scheme.is_unversioned(&Status::default()).unwrap());
    }

    #[test]
    fn version_priority() {
        let mut scheme = Scheme::new("test");
        let v1 = GroupVersion::new(GROUP, "v1");
        scheme.add_known_type::<FlowSchema>(&v1beta3(), "FlowSchema").unwrap();
        scheme.add_known_type::<FlowSchema>(&v1, "FlowSchema").unwrap();

        assert_eq!(scheme.preferred_version(GROUP), Some(v1beta3()));
        scheme.set_version_priority(GROUP, &["v1", "v1beta3"]).unwrap();
        assert_eq!(scheme.preferred_version(GROUP), Some(v1.clone()));
        assert_eq!(scheme.prioritized_versions(GROUP), vec![v1, v1beta3()]);

        let err = scheme.set_version_priority(GROUP, &["v2"]).unwrap_err();
        assert!(matches!(err, SchemeError::NotRegistered(_)));
        assert!(scheme.set_version_priority("unknown", &["v1"]).is_err());
        assert_eq!(scheme.preferred_version("unknown"), None);
    }

    #[test]
    fn group_and_version_queries() {
        let mut scheme = Scheme::new("test");
        scheme.add_known_type::<FlowSchema>(&v1beta3(), "FlowSchema").unwrap();
        assert!(scheme.is_group_registered(GROUP));
        assert!(!scheme.is_group_registered("apps"));
        assert!(scheme.is_version_registered(&v1beta3()));
        assert!(!scheme.is_version_registered(&GroupVersion::new(GROUP, "v1")));
        assert_eq!(scheme.all_known_kinds(), vec![v1beta3().with_kind("FlowSchema")]);
    }

    #[test]
    fn defaulting_func_applies_to_matching_type() {
        let mut scheme = Scheme::new("test");
        scheme.add_defaulting_func(|fs: &mut FlowSchema| {
            if fs.precedence == 0 {
                fs.precedence = 1000;
            }
        });

        let mut fs = FlowSchema::default();
        scheme.default_object(&mut fs);
        assert_eq!(fs.precedence, 1000);

        // No defaulter registered: untouched.
        let mut status = Status::default();
        scheme.default_object(&mut status);
        assert!(status.message.is_empty());
    }
}
