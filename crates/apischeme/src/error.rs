// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy shared by the scheme, serializers and codecs.
//!
//! Every error is returned to the immediate caller. Nothing in this crate
//! logs-and-swallows an error or retries an operation.

use thiserror::Error;

use crate::gvk::GroupVersionKind;
use crate::object::TypeTag;

/// Errors produced by the scheme and its codecs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemeError {
    #[error("{gvk} is already registered to type {existing}, cannot register type {attempted}")]
    DuplicateRegistration {
        gvk: GroupVersionKind,
        existing: TypeTag,
        attempted: TypeTag,
    },

    #[error("cannot register {gvk}: {reason}")]
    InvalidRegistration {
        gvk: GroupVersionKind,
        reason: String,
    },

    #[error("no kind is registered for {0}")]
    NotRegistered(GroupVersionKind),

    #[error("type {tag} is not registered in scheme {scheme:?}")]
    TypeNotRegistered { tag: TypeTag, scheme: String },

    #[error("no serializer recognizes the payload format")]
    UnrecognizedFormat,

    #[error("decode error: {reason}")]
    Decode { reason: String },

    #[error("encode error: {reason}")]
    Encode { reason: String },

    #[error("no conversion for kind {kind} from {from} to {to}")]
    NoConversionPath {
        kind: String,
        from: String,
        to: String,
    },

    #[error("conversion failed: {reason}")]
    ConversionFailed { reason: String },

    #[error("invalid apiVersion {0:?}")]
    InvalidGroupVersion(String),
}

impl SchemeError {
    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        SchemeError::Decode {
            reason: reason.into(),
        }
    }

    pub(crate) fn encode(reason: impl Into<String>) -> Self {
        SchemeError::Encode {
            reason: reason.into(),
        }
    }

    /// True for both "unknown kind" and "unknown concrete type".
    pub fn is_not_registered(&self) -> bool {
        matches!(
            self,
            SchemeError::NotRegistered(_) | SchemeError::TypeNotRegistered { .. }
        )
    }
}

/// Convenient alias for results carrying a [`SchemeError`].
pub type Result<T> = std::result::Result<T, SchemeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_registered_covers_both_variants() {
        let by_kind = SchemeError::NotRegistered(GroupVersionKind::new("x", "v1", "A"));
        let by_type = SchemeError::TypeNotRegistered {
            tag: TypeTag::new("x/v1.A"),
            scheme: "test".into(),
        };
        assert!(by_kind.is_not_registered());
        assert!(by_type.is_not_registered());
        assert!(!SchemeError::UnrecognizedFormat.is_not_registered());
    }

    #[test]
    fn messages_name_the_offender() {
        let err = SchemeError::NoConversionPath {
            kind: "FlowSchema".into(),
            from: "v1".into(),
            to: "v1beta3".into(),
        };
        assert_eq!(
            err.to_string(),
            "no conversion for kind FlowSchema from v1 to v1beta3"
        );

        let err = SchemeError::NotRegistered(GroupVersionKind::new("x", "v1beta3", "FlowSchema"));
        assert_eq!(err.to_string(), "no kind is registered for x/v1beta3, Kind=FlowSchema");
    }
}
