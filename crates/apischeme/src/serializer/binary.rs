// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compact binary serializer (`application/vnd.apischeme.binary`).
//!
//! # Payload Layout
//!
//! ```text
//! +---------------------------------------------------------+
//! | Magic "ASB\0" (4) | Version (1)                          |
//! | ApiVersionLen (2) | ApiVersion (var, UTF-8)              |
//! | KindLen (2)       | Kind (var, UTF-8)                    |
//! | Body (tagged value tree)                                 |
//! | CRC32 (4) over every preceding byte                      |
//! +---------------------------------------------------------+
//! ```
//!
//! All integers are little-endian.
//!
//! # Value Encoding
//!
//! | Tag | Value | Payload |
//! |-----|-------|---------|
//! | 0 | null | - |
//! | 1 | false | - |
//! | 2 | true | - |
//! | 3 | signed integer | i64 |
//! | 4 | unsigned integer | u64 |
//! | 5 | float | f64 |
//! | 6 | string | u32 length + UTF-8 |
//! | 7 | array | u32 count + values |
//! | 8 | map | u32 count + (u32 key length + key + value) pairs |

use std::io::{self, Cursor, Read};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde_json::{Map, Number, Value};

use super::{Envelope, Serializer, SerializerInfo, MEDIA_TYPE_BINARY};
use crate::error::{Result, SchemeError};
use crate::gvk::GroupVersionKind;
use crate::object::value_kind;
use crate::scheme::Scheme;

/// Magic bytes: "ASB\0"
pub const MAGIC: [u8; 4] = [0x41, 0x53, 0x42, 0x00];

/// Current payload format version.
pub const FORMAT_VERSION: u8 = 1;

/// Default limit on nested arrays/maps.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Highest nesting limit accepted. Decoding recurses once per level.
pub const MAX_DEPTH_LIMIT: usize = 1024;

const TAG_NULL: u8 = 0;
const TAG_FALSE: u8 = 1;
const TAG_TRUE: u8 = 2;
const TAG_I64: u8 = 3;
const TAG_U64: u8 = 4;
const TAG_F64: u8 = 5;
const TAG_STRING: u8 = 6;
const TAG_ARRAY: u8 = 7;
const TAG_MAP: u8 = 8;

const CRC_SIZE: usize = 4;

/// Length-prefixed, checksummed binary encoding of an object.
#[derive(Debug, Clone)]
pub struct BinarySerializer {
    scheme: Arc<Scheme>,
    max_depth: usize,
}

impl BinarySerializer {
    pub fn new(scheme: Arc<Scheme>) -> Self {
        Self {
            scheme,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit container nesting on both encode and decode, capped at
    /// [`MAX_DEPTH_LIMIT`].
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.min(MAX_DEPTH_LIMIT);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Serializer for BinarySerializer {
    fn info(&self) -> SerializerInfo {
        SerializerInfo {
            media_type: MEDIA_TYPE_BINARY,
            identifier: "binary",
            pretty: false,
        }
    }

    fn scheme(&self) -> &Arc<Scheme> {
        &self.scheme
    }

    fn write_envelope(&self, gvk: &GroupVersionKind, fields: Value) -> Result<Vec<u8>> {
        if !fields.is_object() {
            return Err(SchemeError::encode(format!(
                "{} fields must be a map, got {}",
                gvk.kind,
                value_kind(&fields)
            )));
        }

        let mut buf = Vec::with_capacity(256);
        buf.extend_from_slice(&MAGIC);
        buf.push(FORMAT_VERSION);
        write_str16(&mut buf, &gvk.api_version())?;
        write_str16(&mut buf, &gvk.kind)?;
        Writer {
            buf: &mut buf,
            max_depth: self.max_depth,
        }
        .value(&fields, 0)?;

        let crc = crc32fast::hash(&buf);
        buf.write_u32::<LittleEndian>(crc).map_err(write_failed)?;
        Ok(buf)
    }

    fn read_envelope(&self, data: &[u8]) -> Result<Option<Envelope>> {
        if !data.starts_with(&MAGIC) {
            return Ok(None);
        }
        if data.len() < MAGIC.len() + 1 + CRC_SIZE {
            return Err(SchemeError::decode("binary: truncated payload"));
        }

        let (body, trailer) = data.split_at(data.len() - CRC_SIZE);
        let stored = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let computed = crc32fast::hash(body);
        if stored != computed {
            return Err(SchemeError::decode(format!(
                "binary: checksum mismatch (stored {:#010x}, computed {:#010x})",
                stored, computed
            )));
        }

        let mut reader = Reader {
            cursor: Cursor::new(body),
            max_depth: self.max_depth,
        };
        reader.cursor.set_position(MAGIC.len() as u64);

        let version = reader.cursor.read_u8().map_err(truncated)?;
        if version != FORMAT_VERSION {
            return Err(SchemeError::decode(format!(
                "binary: unsupported format version {} (expected {})",
                version, FORMAT_VERSION
            )));
        }

        let api_version = reader.str16()?;
        let kind = reader.str16()?;
        let fields = match reader.value(0)? {
            Value::Object(map) => map,
            other => {
                return Err(SchemeError::decode(format!(
                    "binary: body must be a map, got {}",
                    value_kind(&other)
                )))
            }
        };

        let consumed = reader.cursor.position() as usize;
        if consumed != body.len() {
            return Err(SchemeError::decode(format!(
                "binary: {} trailing bytes after body",
                body.len() - consumed
            )));
        }

        Ok(Some(Envelope {
            api_version: Some(api_version).filter(|s| !s.is_empty()),
            kind: Some(kind).filter(|s| !s.is_empty()),
            fields: Value::Object(fields),
        }))
    }
}

fn write_failed(e: io::Error) -> SchemeError {
    SchemeError::encode(format!("binary: {}", e))
}

fn truncated(_: io::Error) -> SchemeError {
    SchemeError::decode("binary: truncated payload")
}

fn write_str16(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    let len = u16::try_from(s.len())
        .map_err(|_| SchemeError::encode(format!("binary: marker of {} bytes is too long", s.len())))?;
    buf.write_u16::<LittleEndian>(len).map_err(write_failed)?;
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

fn len32(len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| SchemeError::encode(format!("binary: length {} exceeds u32", len)))
}

struct Writer<'a> {
    buf: &'a mut Vec<u8>,
    max_depth: usize,
}

impl Writer<'_> {
    fn str32(&mut self, s: &str) -> Result<()> {
        self.buf
            .write_u32::<LittleEndian>(len32(s.len())?)
            .map_err(write_failed)?;
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    fn enter(&self, level: usize) -> Result<usize> {
        let inner = level + 1;
        if inner > self.max_depth {
            return Err(SchemeError::encode(format!(
                "binary: nesting exceeds {} levels",
                self.max_depth
            )));
        }
        Ok(inner)
    }

    fn value(&mut self, value: &Value, level: usize) -> Result<()> {
        match value {
            Value::Null => self.buf.push(TAG_NULL),
            Value::Bool(false) => self.buf.push(TAG_FALSE),
            Value::Bool(true) => self.buf.push(TAG_TRUE),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    self.buf.push(TAG_I64);
                    self.buf.write_i64::<LittleEndian>(i).map_err(write_failed)?;
                } else if let Some(u) = n.as_u64() {
                    self.buf.push(TAG_U64);
                    self.buf.write_u64::<LittleEndian>(u).map_err(write_failed)?;
                } else if let Some(f) = n.as_f64() {
                    self.buf.push(TAG_F64);
                    self.buf.write_f64::<LittleEndian>(f).map_err(write_failed)?;
                } else {
                    return Err(SchemeError::encode(format!("binary: unsupported number {}", n)));
                }
            }
            Value::String(s) => {
                self.buf.push(TAG_STRING);
                self.str32(s)?;
            }
            Value::Array(items) => {
                let inner = self.enter(level)?;
                self.buf.push(TAG_ARRAY);
                self.buf
                    .write_u32::<LittleEndian>(len32(items.len())?)
                    .map_err(write_failed)?;
                for item in items {
                    self.value(item, inner)?;
                }
            }
            Value::Object(map) => {
                let inner = self.enter(level)?;
                self.buf.push(TAG_MAP);
                self.buf
                    .write_u32::<LittleEndian>(len32(map.len())?)
                    .map_err(write_failed)?;
                for (key, item) in map {
                    self.str32(key)?;
                    self.value(item, inner)?;
                }
            }
        }
        Ok(())
    }
}

struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
    max_depth: usize,
}

impl Reader<'_> {
    fn remaining(&self) -> usize {
        let total = self.cursor.get_ref().len() as u64;
        total.saturating_sub(self.cursor.position()) as usize
    }

    fn bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        if len > self.remaining() {
            return Err(SchemeError::decode("binary: truncated payload"));
        }
        let mut out = vec![0u8; len];
        self.cursor.read_exact(&mut out).map_err(truncated)?;
        Ok(out)
    }

    fn utf8(&mut self, len: usize) -> Result<String> {
        String::from_utf8(self.bytes(len)?)
            .map_err(|e| SchemeError::decode(format!("binary: invalid UTF-8: {}", e)))
    }

    fn str16(&mut self) -> Result<String> {
        let len = self.cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        self.utf8(len as usize)
    }

    fn str32(&mut self) -> Result<String> {
        let len = self.cursor.read_u32::<LittleEndian>().map_err(truncated)?;
        self.utf8(len as usize)
    }

    fn count(&mut self) -> Result<usize> {
        let count = self.cursor.read_u32::<LittleEndian>().map_err(truncated)? as usize;
        // Every element takes at least one byte.
        if count > self.remaining() {
            return Err(SchemeError::decode("binary: truncated payload"));
        }
        Ok(count)
    }

    fn enter(&self, level: usize) -> Result<usize> {
        let inner = level + 1;
        if inner > self.max_depth {
            return Err(SchemeError::decode(format!(
                "binary: nesting exceeds {} levels",
                self.max_depth
            )));
        }
        Ok(inner)
    }

    fn value(&mut self, level: usize) -> Result<Value> {
        let tag = self.cursor.read_u8().map_err(truncated)?;
        let value = match tag {
            TAG_NULL => Value::Null,
            TAG_FALSE => Value::Bool(false),
            TAG_TRUE => Value::Bool(true),
            TAG_I64 => Value::from(self.cursor.read_i64::<LittleEndian>().map_err(truncated)?),
            TAG_U64 => Value::from(self.cursor.read_u64::<LittleEndian>().map_err(truncated)?),
            TAG_F64 => {
                let f = self.cursor.read_f64::<LittleEndian>().map_err(truncated)?;
                Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| SchemeError::decode("binary: non-finite float"))?
            }
            TAG_STRING => Value::String(self.str32()?),
            TAG_ARRAY => {
                let inner = self.enter(level)?;
                let count = self.count()?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.value(inner)?);
                }
                Value::Array(items)
            }
            TAG_MAP => {
                let inner = self.enter(level)?;
                let count = self.count()?;
                let mut map = Map::new();
                for _ in 0..count {
                    let key = self.str32()?;
                    let item = self.value(inner)?;
                    map.insert(key, item);
                }
                Value::Object(map)
            }
            other => {
                return Err(SchemeError::decode(format!(
                    "binary: unknown value tag {}",
                    other
                )))
            }
        };
        Ok(value)
    }
}
