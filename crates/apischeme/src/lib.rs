// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed object scheme registry with multi-version codecs.
//!
//! Maps `(group, version, kind)` identifiers to concrete Rust types, so that
//! serialized payloads can be decoded into the right type and typed values
//! can be encoded with the right type marker.
//!
//! # Features
//!
//! - **Scheme**: register types per GVK, allocate instances by GVK, and find
//!   every GVK a type is registered under
//! - **Serializers**: JSON, YAML and a checksummed binary format, all
//!   carrying an `apiVersion`/`kind` marker
//! - **Universal deserializer**: sniffs the format and decodes into whatever
//!   type the payload names
//! - **Legacy codec**: encodes and decodes at one target version, converting
//!   through registered conversion functions
//!
//! # Architecture
//!
//! ```text
//! API packages
//!      |  add_to_scheme(&mut Scheme), conversion funcs
//!      v
//!   Scheme ---- Arc ----> CodecFactory
//!                           |-- UniversalDeserializer (binary > JSON > YAML)
//!                           +-- LegacyCodec(target GroupVersion)
//! ```
//!
//! Registration needs `&mut Scheme`. Once wrapped in an `Arc` the scheme is
//! read-only and every codec built from it is `Send + Sync`.

pub mod codec;
pub mod config;
pub mod conversion;
pub mod error;
pub mod gvk;
pub mod object;
pub mod scheme;
pub mod serializer;

pub use codec::{CodecFactory, Decoder, Encoder, LegacyCodec, UniversalDeserializer};
pub use config::{CodecConfig, ConfigError};
pub use conversion::{ConversionFuncs, ConversionRegistry, ConvertFn, NoConversions};
pub use error::{Result, SchemeError};
pub use gvk::{GroupVersion, GroupVersionKind};
pub use object::{downcast, ListMeta, Object, ObjectMeta, Resource, TypeTag};
pub use scheme::{ObjectFactory, Scheme, TypeDescriptor};
pub use serializer::{Decoded, DecodeWarning, Serializer, SerializerInfo};
