// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Group/Version/Kind identifiers.
//!
//! A [`GroupVersionKind`] names one schema of one resource type. The
//! [`GroupVersion`] projection selects "the version to encode as" and renders
//! to the `apiVersion` string carried by self-describing payloads:
//!
//! ```text
//! flowcontrol.apiserver.k8s.io/v1beta3   (named group)
//! v1                                     (core group, empty name)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemeError};

// ---------------------------------------------------------------------------
// GroupVersion
// ---------------------------------------------------------------------------

/// A group and one of its versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupVersion {
    pub group: String,
    pub version: String,
}

impl GroupVersion {
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }

    /// Parse an `apiVersion` string (`"group/version"` or `"version"`).
    pub fn parse(api_version: &str) -> Result<Self> {
        let invalid = || SchemeError::InvalidGroupVersion(api_version.to_string());

        match api_version.split_once('/') {
            None if api_version.is_empty() => Err(invalid()),
            None => Ok(Self::new("", api_version)),
            Some((group, version)) => {
                if group.is_empty() || version.is_empty() || version.contains('/') {
                    return Err(invalid());
                }
                Ok(Self::new(group, version))
            }
        }
    }

    /// Render as an `apiVersion` string.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn with_kind(&self, kind: impl Into<String>) -> GroupVersionKind {
        GroupVersionKind {
            group: self.group.clone(),
            version: self.version.clone(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.api_version())
    }
}

// ---------------------------------------------------------------------------
// GroupVersionKind
// ---------------------------------------------------------------------------

/// Universal object identifier: group, version and kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Build from an `apiVersion` string and a kind.
    pub fn from_api_version(api_version: &str, kind: impl Into<String>) -> Result<Self> {
        Ok(GroupVersion::parse(api_version)?.with_kind(kind))
    }

    pub fn group_version(&self) -> GroupVersion {
        GroupVersion::new(self.group.clone(), self.version.clone())
    }

    pub fn api_version(&self) -> String {
        self.group_version().api_version()
    }

    /// True when no field is set (used for "no hint").
    pub fn is_empty(&self) -> bool {
        self.group.is_empty() && self.version.is_empty() && self.kind.is_empty()
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Kind={}", self.api_version(), self.kind)
    }
}
