// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Version conversion functions.
//!
//! The codecs never know how to turn one version of a kind into another.
//! They ask a [`ConversionRegistry`] for a [`ConvertFn`] keyed by kind and
//! the source/target group versions. [`ConversionFuncs`] is the table-backed
//! implementation that API packages fill in at registration time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, SchemeError};
use crate::gvk::GroupVersion;
use crate::object::{Object, Resource};

/// Converts an object of one version into a new object of another.
pub type ConvertFn = Arc<dyn Fn(&dyn Object) -> Result<Box<dyn Object>> + Send + Sync>;

/// Source of conversion functions.
pub trait ConversionRegistry: Send + Sync + fmt::Debug {
    fn lookup(&self, kind: &str, from: &GroupVersion, to: &GroupVersion) -> Option<ConvertFn>;
}

/// A registry without conversions. Objects only encode at versions their
/// type is registered under.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConversions;

impl ConversionRegistry for NoConversions {
    fn lookup(&self, _kind: &str, _from: &GroupVersion, _to: &GroupVersion) -> Option<ConvertFn> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    kind: String,
    from: GroupVersion,
    to: GroupVersion,
}

/// Table of conversion functions keyed by `(kind, from, to)`.
#[derive(Default, Clone)]
pub struct ConversionFuncs {
    funcs: HashMap<Key, ConvertFn>,
}

impl ConversionFuncs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a type-erased conversion. Replaces any previous function for
    /// the same key.
    pub fn add_raw(&mut self, kind: &str, from: &GroupVersion, to: &GroupVersion, func: ConvertFn) {
        let key = Key {
            kind: kind.to_string(),
            from: from.clone(),
            to: to.clone(),
        };
        if self.funcs.insert(key, func).is_some() {
            tracing::debug!("replaced conversion for {} from {} to {}", kind, from, to);
        }
    }

    /// Install an infallible conversion from `A` to `B`.
    pub fn add<A, B, F>(&mut self, kind: &str, from: &GroupVersion, to: &GroupVersion, func: F)
    where
        A: Resource,
        B: Resource,
        F: Fn(&A) -> B + Send + Sync + 'static,
    {
        self.add_fallible(kind, from, to, move |a: &A| Ok(func(a)));
    }

    /// Install a conversion from `A` to `B` that may reject its input.
    pub fn add_fallible<A, B, F>(
        &mut self,
        kind: &str,
        from: &GroupVersion,
        to: &GroupVersion,
        func: F,
    ) where
        A: Resource,
        B: Resource,
        F: Fn(&A) -> Result<B> + Send + Sync + 'static,
    {
        let convert: ConvertFn = Arc::new(move |object: &dyn Object| {
            let input = object.downcast_ref::<A>().ok_or_else(|| SchemeError::ConversionFailed {
                reason: format!(
                    "expected input of type {}, got {}",
                    A::TYPE_TAG,
                    object.type_tag()
                ),
            })?;
            Ok(Box::new(func(input)?) as Box<dyn Object>)
        });
        self.add_raw(kind, from, to, convert);
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

impl ConversionRegistry for ConversionFuncs {
    fn lookup(&self, kind: &str, from: &GroupVersion, to: &GroupVersion) -> Option<ConvertFn> {
        let key = Key {
            kind: kind.to_string(),
            from: from.clone(),
            to: to.clone(),
        };
        self.funcs.get(&key).cloned()
    }
}

impl fmt::Debug for ConversionFuncs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .funcs
            .keys()
            .map(|k| format!("{} {}->{}", k.kind, k.from, k.to))
            .collect();
        keys.sort();
        f.debug_struct("ConversionFuncs").field("funcs", &keys).finish()
    }
}
