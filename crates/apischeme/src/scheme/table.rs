// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::gvk::GroupVersionKind;
use crate::object::{Object, TypeTag};

/// Allocates a zero-value instance of one registered type.
pub type ObjectFactory = Arc<dyn Fn() -> Box<dyn Object> + Send + Sync>;

// ---------------------------------------------------------------------------
// TypeDescriptor
// ---------------------------------------------------------------------------

/// One registered (type, GVK) pairing.
#[derive(Clone)]
pub struct TypeDescriptor {
    pub gvk: GroupVersionKind,
    pub type_tag: TypeTag,
    pub is_list: bool,
    /// Instances are identical across all versions of the group.
    pub unversioned: bool,
    factory: ObjectFactory,
}

impl TypeDescriptor {
    pub fn new(
        gvk: GroupVersionKind,
        type_tag: TypeTag,
        factory: ObjectFactory,
        is_list: bool,
    ) -> Self {
        Self {
            gvk,
            type_tag,
            is_list,
            unversioned: false,
            factory,
        }
    }

    /// Allocate a zero-value instance.
    pub fn new_object(&self) -> Box<dyn Object> {
        (self.factory)()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("gvk", &self.gvk)
            .field("type_tag", &self.type_tag)
            .field("is_list", &self.is_list)
            .field("unversioned", &self.unversioned)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TypeTable
// ---------------------------------------------------------------------------

/// Append-only descriptor table for a single group.
///
/// Versions are remembered in registration order; an explicit priority list
/// may be layered on top to pick the group's default version.
#[derive(Debug, Default)]
pub struct TypeTable {
    /// version -> kind -> descriptor
    entries: HashMap<String, HashMap<String, TypeDescriptor>>,
    versions: Vec<String>,
    priority: Vec<String>,
}

/// Outcome of [`TypeTable::insert`].
#[derive(Debug)]
pub(crate) enum Insert<'a> {
    Added,
    /// The GVK was already bound; the existing descriptor is returned.
    Exists(&'a TypeDescriptor),
}

impl TypeTable {
    pub(crate) fn insert(&mut self, descriptor: TypeDescriptor) -> Insert<'_> {
        let version = descriptor.gvk.version.clone();
        let kind = descriptor.gvk.kind.clone();

        if !self.entries.contains_key(&version) {
            self.versions.push(version.clone());
        }
        match self.entries.entry(version).or_default().entry(kind) {
            Entry::Occupied(existing) => Insert::Exists(existing.into_mut()),
            Entry::Vacant(slot) => {
                slot.insert(descriptor);
                Insert::Added
            }
        }
    }

    pub fn get(&self, version: &str, kind: &str) -> Option<&TypeDescriptor> {
        self.entries.get(version).and_then(|kinds| kinds.get(kind))
    }

    pub fn has_version(&self, version: &str) -> bool {
        self.entries.contains_key(version)
    }

    /// Kind names registered at `version`, sorted.
    pub fn kinds(&self, version: &str) -> Vec<String> {
        let mut kinds: Vec<String> = self
            .entries
            .get(version)
            .map(|k| k.keys().cloned().collect())
            .unwrap_or_default();
        kinds.sort();
        kinds
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.entries.values().flat_map(|kinds| kinds.values())
    }

    pub(crate) fn set_priority(&mut self, versions: Vec<String>) {
        self.priority = versions;
    }

    /// Explicit priority first, then the remaining versions in registration
    /// order.
    pub fn prioritized_versions(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.priority.iter().map(String::as_str).collect();
        for version in &self.versions {
            if !self.priority.contains(version) {
                out.push(version.as_str());
            }
        }
        out
    }

    pub fn default_version(&self) -> Option<&str> {
        self.prioritized_versions().first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ObjectMeta, Resource};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Gadget {
        metadata: ObjectMeta,
    }

    impl Resource for Gadget {
        const TYPE_TAG: TypeTag = TypeTag::new("test/v1.Gadget");
    }

    fn descriptor(version: &str, kind: &str) -> TypeDescriptor {
        TypeDescriptor::new(
            GroupVersionKind::new("test", version, kind),
            Gadget::TYPE_TAG,
            Arc::new(|| Box::new(Gadget::default()) as Box<dyn Object>),
            kind.ends_with("List"),
        )
    }

    #[test]
    fn insert_then_get() {
        let mut table = TypeTable::default();
        assert!(matches!(table.insert(descriptor("v1", "Gadget")), Insert::Added));
        let found = table.get("v1", "Gadget").unwrap();
        assert_eq!(found.type_tag, Gadget::TYPE_TAG);
        assert!(!found.is_list);
        assert!(found.new_object().is::<Gadget>());
        assert!(table.get("v2", "Gadget").is_none());
    }

    #[test]
    fn second_insert_returns_existing() {
        let mut table = TypeTable::default();
        table.insert(descriptor("v1", "Gadget"));
        match table.insert(descriptor("v1", "Gadget")) {
            Insert::Exists(existing) => assert_eq!(existing.gvk.kind, "Gadget"),
            Insert::Added => panic!("expected existing entry"),
        }
    }

    #[test]
    fn versions_follow_registration_then_priority() {
        let mut table = TypeTable::default();
        table.insert(descriptor("v1beta3", "Gadget"));
        table.insert(descriptor("v1", "Gadget"));
        table.insert(descriptor("v1beta3", "GadgetList"));
        assert_eq!(table.prioritized_versions(), vec!["v1beta3", "v1"]);
        assert_eq!(table.default_version(), Some("v1beta3"));

        table.set_priority(vec!["v1".into()]);
        assert_eq!(table.prioritized_versions(), vec!["v1", "v1beta3"]);
        assert_eq!(table.default_version(), Some("v1"));
        assert_eq!(table.kinds("v1beta3"), vec!["Gadget", "GadgetList"]);
    }
}
