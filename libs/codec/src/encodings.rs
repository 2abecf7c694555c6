//! # Wire Codecs - Encoding/Decoding Primitives
//!
//! ## Purpose
//!
//! The [`TypeCodec`] contract is the compiled unit of conversion between
//! typed [`Value`]s and the contiguous byte layout the remote ledger
//! stores. Leaf codecs cover fixed-width integers, booleans, strings and
//! byte blobs; composite codecs concatenate field codecs in declared order
//! with no padding. The [`Builder`] selects the byte order once and hands
//! out codecs sharing it, mirroring how the schema compiler walks a type
//! definition.
//!
//! ## Architecture Role
//!
//! ```text
//! Schema Builder → [TypeCodec graph] → RemoteCodec surface
//!       ↓                ↓                    ↓
//! IDL walk        leaf + struct codecs   named account entries
//! ```
//!
//! Decode is incremental: each codec consumes its bytes and returns the
//! remainder, so struct and array codecs simply chain their children.

use std::sync::Arc;

use byteorder::ByteOrder as _;

use crate::error::{CodecError, CodecResult};
use crate::value::{RuntimeType, StructValue, Value};

/// Byte order applied to all multi-byte wire integers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

/// The compiled unit of conversion for one schema type
pub trait TypeCodec: Send + Sync {
    /// Append the wire form of `value` to `into`
    fn encode(&self, value: &Value, into: &mut Vec<u8>) -> CodecResult<()>;

    /// Consume this codec's bytes from the front of `encoded`, returning
    /// the decoded value and the remaining bytes
    fn decode<'a>(&self, encoded: &'a [u8]) -> CodecResult<(Value, &'a [u8])>;

    /// The shape of values this codec produces and accepts
    fn runtime_type(&self) -> RuntimeType;

    /// Byte length for a payload of `elements` dynamic elements
    fn size(&self, elements: usize) -> CodecResult<usize>;

    /// Byte length when the layout is fixed, `None` otherwise
    fn fixed_size(&self) -> Option<usize>;
}

/// A struct field: exposed name plus the codec for its wire segment
#[derive(Clone)]
pub struct NamedCodec {
    pub name: String,
    pub codec: Arc<dyn TypeCodec>,
}

/// Split `needed` bytes off the front of `encoded` or fail with the exact
/// shortfall
pub fn take(encoded: &[u8], needed: usize) -> CodecResult<(&[u8], &[u8])> {
    if encoded.len() < needed {
        return Err(CodecError::ShortBuffer {
            needed,
            got: encoded.len(),
        });
    }
    Ok(encoded.split_at(needed))
}

/// Hands out leaf and composite codecs sharing one byte order
#[derive(Debug, Clone, Copy)]
pub struct Builder {
    order: ByteOrder,
}

macro_rules! fixed_int_codec {
    ($codec:ident, $ty:ty, $variant:ident, $size:expr, $write:ident, $read:ident) => {
        struct $codec {
            order: ByteOrder,
        }

        impl TypeCodec for $codec {
            fn encode(&self, value: &Value, into: &mut Vec<u8>) -> CodecResult<()> {
                let v = match value {
                    Value::$variant(v) => *v,
                    other => {
                        return Err(CodecError::invalid_type(
                            stringify!($ty),
                            stringify!($ty),
                            other.kind_name(),
                        ))
                    }
                };
                let mut buf = [0u8; $size];
                match self.order {
                    ByteOrder::LittleEndian => byteorder::LittleEndian::$write(&mut buf, v),
                    ByteOrder::BigEndian => byteorder::BigEndian::$write(&mut buf, v),
                }
                into.extend_from_slice(&buf);
                Ok(())
            }

            fn decode<'a>(&self, encoded: &'a [u8]) -> CodecResult<(Value, &'a [u8])> {
                let (raw, rest) = take(encoded, $size)?;
                let v = match self.order {
                    ByteOrder::LittleEndian => byteorder::LittleEndian::$read(raw),
                    ByteOrder::BigEndian => byteorder::BigEndian::$read(raw),
                };
                Ok((Value::$variant(v), rest))
            }

            fn runtime_type(&self) -> RuntimeType {
                RuntimeType::$variant
            }

            fn size(&self, _elements: usize) -> CodecResult<usize> {
                Ok($size)
            }

            fn fixed_size(&self) -> Option<usize> {
                Some($size)
            }
        }
    };
}

fixed_int_codec!(U16Codec, u16, U16, 2, write_u16, read_u16);
fixed_int_codec!(U32Codec, u32, U32, 4, write_u32, read_u32);
fixed_int_codec!(U64Codec, u64, U64, 8, write_u64, read_u64);
fixed_int_codec!(U128Codec, u128, U128, 16, write_u128, read_u128);
fixed_int_codec!(I16Codec, i16, I16, 2, write_i16, read_i16);
fixed_int_codec!(I32Codec, i32, I32, 4, write_i32, read_i32);
fixed_int_codec!(I64Codec, i64, I64, 8, write_i64, read_i64);
fixed_int_codec!(I128Codec, i128, I128, 16, write_i128, read_i128);

struct BoolCodec;

impl TypeCodec for BoolCodec {
    fn encode(&self, value: &Value, into: &mut Vec<u8>) -> CodecResult<()> {
        match value {
            Value::Bool(b) => {
                into.push(u8::from(*b));
                Ok(())
            }
            other => Err(CodecError::invalid_type("bool", "bool", other.kind_name())),
        }
    }

    fn decode<'a>(&self, encoded: &'a [u8]) -> CodecResult<(Value, &'a [u8])> {
        let (raw, rest) = take(encoded, 1)?;
        Ok((Value::Bool(raw[0] != 0), rest))
    }

    fn runtime_type(&self) -> RuntimeType {
        RuntimeType::Bool
    }

    fn size(&self, _elements: usize) -> CodecResult<usize> {
        Ok(1)
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(1)
    }
}

struct U8Codec;

impl TypeCodec for U8Codec {
    fn encode(&self, value: &Value, into: &mut Vec<u8>) -> CodecResult<()> {
        match value {
            Value::U8(v) => {
                into.push(*v);
                Ok(())
            }
            other => Err(CodecError::invalid_type("u8", "u8", other.kind_name())),
        }
    }

    fn decode<'a>(&self, encoded: &'a [u8]) -> CodecResult<(Value, &'a [u8])> {
        let (raw, rest) = take(encoded, 1)?;
        Ok((Value::U8(raw[0]), rest))
    }

    fn runtime_type(&self) -> RuntimeType {
        RuntimeType::U8
    }

    fn size(&self, _elements: usize) -> CodecResult<usize> {
        Ok(1)
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(1)
    }
}

struct I8Codec;

impl TypeCodec for I8Codec {
    fn encode(&self, value: &Value, into: &mut Vec<u8>) -> CodecResult<()> {
        match value {
            Value::I8(v) => {
                into.push(*v as u8);
                Ok(())
            }
            other => Err(CodecError::invalid_type("i8", "i8", other.kind_name())),
        }
    }

    fn decode<'a>(&self, encoded: &'a [u8]) -> CodecResult<(Value, &'a [u8])> {
        let (raw, rest) = take(encoded, 1)?;
        Ok((Value::I8(raw[0] as i8), rest))
    }

    fn runtime_type(&self) -> RuntimeType {
        RuntimeType::I8
    }

    fn size(&self, _elements: usize) -> CodecResult<usize> {
        Ok(1)
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(1)
    }
}

/// Length-bounded string with a u32 byte-length prefix
struct StringCodec {
    order: ByteOrder,
    max_len: usize,
}

impl StringCodec {
    fn write_len(&self, len: usize, into: &mut Vec<u8>) {
        let mut buf = [0u8; 4];
        match self.order {
            ByteOrder::LittleEndian => byteorder::LittleEndian::write_u32(&mut buf, len as u32),
            ByteOrder::BigEndian => byteorder::BigEndian::write_u32(&mut buf, len as u32),
        }
        into.extend_from_slice(&buf);
    }

    fn read_len<'a>(&self, encoded: &'a [u8]) -> CodecResult<(usize, &'a [u8])> {
        let (raw, rest) = take(encoded, 4)?;
        let len = match self.order {
            ByteOrder::LittleEndian => byteorder::LittleEndian::read_u32(raw),
            ByteOrder::BigEndian => byteorder::BigEndian::read_u32(raw),
        };
        Ok((len as usize, rest))
    }
}

impl TypeCodec for StringCodec {
    fn encode(&self, value: &Value, into: &mut Vec<u8>) -> CodecResult<()> {
        let s = match value {
            Value::String(s) => s,
            other => {
                return Err(CodecError::invalid_type(
                    "string",
                    "string",
                    other.kind_name(),
                ))
            }
        };
        if s.len() > self.max_len {
            return Err(CodecError::invalid_type(
                "string",
                format!("at most {} bytes", self.max_len),
                format!("{} bytes", s.len()),
            ));
        }
        self.write_len(s.len(), into);
        into.extend_from_slice(s.as_bytes());
        Ok(())
    }

    fn decode<'a>(&self, encoded: &'a [u8]) -> CodecResult<(Value, &'a [u8])> {
        let (len, rest) = self.read_len(encoded)?;
        if len > self.max_len {
            return Err(CodecError::invalid_encoding(format!(
                "string length {len} exceeds maximum {}",
                self.max_len
            )));
        }
        let (raw, rest) = take(rest, len)?;
        let s = std::str::from_utf8(raw)
            .map_err(|e| CodecError::invalid_encoding(format!("string is not utf-8: {e}")))?;
        Ok((Value::String(s.to_string()), rest))
    }

    fn runtime_type(&self) -> RuntimeType {
        RuntimeType::String
    }

    fn size(&self, elements: usize) -> CodecResult<usize> {
        Ok(4 + elements)
    }

    fn fixed_size(&self) -> Option<usize> {
        None
    }
}

/// Contiguous byte vector with a u32 length prefix
struct BytesCodec {
    order: ByteOrder,
}

impl TypeCodec for BytesCodec {
    fn encode(&self, value: &Value, into: &mut Vec<u8>) -> CodecResult<()> {
        let raw = match value {
            Value::Bytes(raw) => raw,
            other => {
                return Err(CodecError::invalid_type(
                    "bytes",
                    "bytes",
                    other.kind_name(),
                ))
            }
        };
        let mut buf = [0u8; 4];
        match self.order {
            ByteOrder::LittleEndian => {
                byteorder::LittleEndian::write_u32(&mut buf, raw.len() as u32)
            }
            ByteOrder::BigEndian => byteorder::BigEndian::write_u32(&mut buf, raw.len() as u32),
        }
        into.extend_from_slice(&buf);
        into.extend_from_slice(raw);
        Ok(())
    }

    fn decode<'a>(&self, encoded: &'a [u8]) -> CodecResult<(Value, &'a [u8])> {
        let (raw, rest) = take(encoded, 4)?;
        let len = match self.order {
            ByteOrder::LittleEndian => byteorder::LittleEndian::read_u32(raw),
            ByteOrder::BigEndian => byteorder::BigEndian::read_u32(raw),
        } as usize;
        let (body, rest) = take(rest, len)?;
        Ok((Value::Bytes(body.to_vec()), rest))
    }

    fn runtime_type(&self) -> RuntimeType {
        RuntimeType::Bytes
    }

    fn size(&self, elements: usize) -> CodecResult<usize> {
        Ok(4 + elements)
    }

    fn fixed_size(&self) -> Option<usize> {
        None
    }
}

/// Exactly `len` raw bytes with no prefix (public keys, hashes, `[u8; N]`)
struct FixedBytesCodec {
    len: usize,
}

impl TypeCodec for FixedBytesCodec {
    fn encode(&self, value: &Value, into: &mut Vec<u8>) -> CodecResult<()> {
        let raw = match value {
            Value::Bytes(raw) => raw,
            other => {
                return Err(CodecError::invalid_type(
                    "fixed bytes",
                    format!("{} bytes", self.len),
                    other.kind_name(),
                ))
            }
        };
        if raw.len() != self.len {
            return Err(CodecError::invalid_type(
                "fixed bytes",
                format!("{} bytes", self.len),
                format!("{} bytes", raw.len()),
            ));
        }
        into.extend_from_slice(raw);
        Ok(())
    }

    fn decode<'a>(&self, encoded: &'a [u8]) -> CodecResult<(Value, &'a [u8])> {
        let (raw, rest) = take(encoded, self.len)?;
        Ok((Value::Bytes(raw.to_vec()), rest))
    }

    fn runtime_type(&self) -> RuntimeType {
        RuntimeType::Bytes
    }

    fn size(&self, _elements: usize) -> CodecResult<usize> {
        Ok(self.len)
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(self.len)
    }
}

/// Exactly `len` repetitions of the element codec, no prefix
struct ArrayCodec {
    len: usize,
    elem: Arc<dyn TypeCodec>,
}

impl TypeCodec for ArrayCodec {
    fn encode(&self, value: &Value, into: &mut Vec<u8>) -> CodecResult<()> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(CodecError::invalid_type(
                    "array",
                    format!("array of {}", self.len),
                    other.kind_name(),
                ))
            }
        };
        if items.len() != self.len {
            return Err(CodecError::invalid_type(
                "array",
                format!("{} elements", self.len),
                format!("{} elements", items.len()),
            ));
        }
        for item in items {
            self.elem.encode(item, into)?;
        }
        Ok(())
    }

    fn decode<'a>(&self, encoded: &'a [u8]) -> CodecResult<(Value, &'a [u8])> {
        let mut items = Vec::with_capacity(self.len);
        let mut rest = encoded;
        for _ in 0..self.len {
            let (item, remaining) = self.elem.decode(rest)?;
            items.push(item);
            rest = remaining;
        }
        Ok((Value::Array(items), rest))
    }

    fn runtime_type(&self) -> RuntimeType {
        RuntimeType::Array {
            len: self.len,
            elem: Box::new(self.elem.runtime_type()),
        }
    }

    fn size(&self, elements: usize) -> CodecResult<usize> {
        Ok(self.elem.size(elements)? * self.len)
    }

    fn fixed_size(&self) -> Option<usize> {
        self.elem.fixed_size().map(|s| s * self.len)
    }
}

/// Dynamic repetition with a u32 element-count prefix
struct VectorCodec {
    order: ByteOrder,
    elem: Arc<dyn TypeCodec>,
}

impl TypeCodec for VectorCodec {
    fn encode(&self, value: &Value, into: &mut Vec<u8>) -> CodecResult<()> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(CodecError::invalid_type(
                    "vector",
                    "array",
                    other.kind_name(),
                ))
            }
        };
        let mut buf = [0u8; 4];
        match self.order {
            ByteOrder::LittleEndian => {
                byteorder::LittleEndian::write_u32(&mut buf, items.len() as u32)
            }
            ByteOrder::BigEndian => byteorder::BigEndian::write_u32(&mut buf, items.len() as u32),
        }
        into.extend_from_slice(&buf);
        for item in items {
            self.elem.encode(item, into)?;
        }
        Ok(())
    }

    fn decode<'a>(&self, encoded: &'a [u8]) -> CodecResult<(Value, &'a [u8])> {
        let (raw, mut rest) = take(encoded, 4)?;
        let count = match self.order {
            ByteOrder::LittleEndian => byteorder::LittleEndian::read_u32(raw),
            ByteOrder::BigEndian => byteorder::BigEndian::read_u32(raw),
        } as usize;
        let mut items = Vec::new();
        for _ in 0..count {
            let (item, remaining) = self.elem.decode(rest)?;
            items.push(item);
            rest = remaining;
        }
        Ok((Value::Array(items), rest))
    }

    fn runtime_type(&self) -> RuntimeType {
        RuntimeType::Vector {
            elem: Box::new(self.elem.runtime_type()),
        }
    }

    fn size(&self, elements: usize) -> CodecResult<usize> {
        let elem_size = self.elem.fixed_size().ok_or_else(|| {
            CodecError::invalid_type("vector", "fixed size element", "dynamic element")
        })?;
        Ok(4 + elem_size * elements)
    }

    fn fixed_size(&self) -> Option<usize> {
        None
    }
}

/// Named fields concatenated in declared order with no padding
struct StructCodec {
    name: String,
    fields: Vec<NamedCodec>,
}

impl TypeCodec for StructCodec {
    fn encode(&self, value: &Value, into: &mut Vec<u8>) -> CodecResult<()> {
        let fields = match value {
            Value::Struct(s) => s,
            other => {
                return Err(CodecError::invalid_type(
                    &self.name,
                    "struct",
                    other.kind_name(),
                ))
            }
        };
        for field in &self.fields {
            let field_codec_optional =
                matches!(field.codec.runtime_type(), RuntimeType::Option { .. });
            match fields.get(&field.name) {
                // absent optionals are only encodable when the codec itself
                // understands absence (the discriminator injects its tag)
                Some(Value::Option(None)) | None if field_codec_optional => {
                    field.codec.encode(&Value::Option(None), into)?;
                }
                Some(Value::Option(None)) | None => {
                    return Err(CodecError::invalid_type(
                        format!("{}.{}", self.name, field.name),
                        "a present value",
                        "absent",
                    ));
                }
                Some(Value::Option(Some(inner))) if !field_codec_optional => {
                    field.codec.encode(inner, into)?;
                }
                Some(v) => field.codec.encode(v, into)?,
            }
        }
        Ok(())
    }

    fn decode<'a>(&self, encoded: &'a [u8]) -> CodecResult<(Value, &'a [u8])> {
        let mut out = StructValue::new(self.name.clone());
        let mut rest = encoded;
        for field in &self.fields {
            let (val, remaining) = field.codec.decode(rest)?;
            out.insert(field.name.clone(), val)?;
            rest = remaining;
        }
        Ok((Value::Struct(out), rest))
    }

    fn runtime_type(&self) -> RuntimeType {
        RuntimeType::Struct {
            name: self.name.clone(),
            fields: self
                .fields
                .iter()
                .map(|f| (f.name.clone(), f.codec.runtime_type()))
                .collect(),
        }
    }

    fn size(&self, elements: usize) -> CodecResult<usize> {
        let mut total = 0;
        for field in &self.fields {
            total += field.codec.size(elements)?;
        }
        Ok(total)
    }

    fn fixed_size(&self) -> Option<usize> {
        self.fields
            .iter()
            .map(|f| f.codec.fixed_size())
            .try_fold(0usize, |acc, s| s.map(|s| acc + s))
    }
}

impl Builder {
    pub fn little_endian() -> Self {
        Self {
            order: ByteOrder::LittleEndian,
        }
    }

    pub fn big_endian() -> Self {
        Self {
            order: ByteOrder::BigEndian,
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn bool_codec(&self) -> Arc<dyn TypeCodec> {
        Arc::new(BoolCodec)
    }

    pub fn uint8(&self) -> Arc<dyn TypeCodec> {
        Arc::new(U8Codec)
    }

    pub fn uint16(&self) -> Arc<dyn TypeCodec> {
        Arc::new(U16Codec { order: self.order })
    }

    pub fn uint32(&self) -> Arc<dyn TypeCodec> {
        Arc::new(U32Codec { order: self.order })
    }

    pub fn uint64(&self) -> Arc<dyn TypeCodec> {
        Arc::new(U64Codec { order: self.order })
    }

    pub fn uint128(&self) -> Arc<dyn TypeCodec> {
        Arc::new(U128Codec { order: self.order })
    }

    pub fn int8(&self) -> Arc<dyn TypeCodec> {
        Arc::new(I8Codec)
    }

    pub fn int16(&self) -> Arc<dyn TypeCodec> {
        Arc::new(I16Codec { order: self.order })
    }

    pub fn int32(&self) -> Arc<dyn TypeCodec> {
        Arc::new(I32Codec { order: self.order })
    }

    pub fn int64(&self) -> Arc<dyn TypeCodec> {
        Arc::new(I64Codec { order: self.order })
    }

    pub fn int128(&self) -> Arc<dyn TypeCodec> {
        Arc::new(I128Codec { order: self.order })
    }

    pub fn string(&self, max_len: usize) -> Arc<dyn TypeCodec> {
        Arc::new(StringCodec {
            order: self.order,
            max_len,
        })
    }

    pub fn bytes(&self) -> Arc<dyn TypeCodec> {
        Arc::new(BytesCodec { order: self.order })
    }

    pub fn fixed_bytes(&self, len: usize) -> Arc<dyn TypeCodec> {
        Arc::new(FixedBytesCodec { len })
    }

    pub fn array(&self, len: usize, elem: Arc<dyn TypeCodec>) -> Arc<dyn TypeCodec> {
        Arc::new(ArrayCodec { len, elem })
    }

    pub fn vector(&self, elem: Arc<dyn TypeCodec>) -> Arc<dyn TypeCodec> {
        Arc::new(VectorCodec {
            order: self.order,
            elem,
        })
    }

    pub fn struct_of(
        &self,
        name: impl Into<String>,
        fields: Vec<NamedCodec>,
    ) -> CodecResult<Arc<dyn TypeCodec>> {
        let name = name.into();
        let mut seen = std::collections::HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.clone()) {
                return Err(CodecError::invalid_config(format!(
                    "duplicate field {} in struct {name}",
                    field.name
                )));
            }
        }
        Ok(Arc::new(StructCodec { name, fields }))
    }
}
