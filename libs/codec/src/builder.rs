//! # Schema-to-Codec Compilation
//!
//! ## Purpose
//!
//! Compiles a parsed IDL document into named [`TypeCodec`]s by recursive
//! descent over field types. Defined-type references resolve against a
//! memoization map so shared sub-types compile once regardless of how many
//! places reference them; an explicit in-progress set rejects cyclic
//! references instead of recursing forever.
//!
//! Two entry points exist: [`build_idl_codec`] compiles the plain struct
//! layout, [`build_idl_account_codec`] additionally prefixes every account
//! with its 8-byte discriminator field, which is the layout on-chain
//! records actually carry.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::discriminator::Discriminator;
use crate::encodings::{Builder, NamedCodec, TypeCodec};
use crate::error::{CodecError, CodecResult};
use crate::remote::CodecEntry;
use crate::schema::{Idl, IdlPrimitive, IdlType, IdlTypeDef, IdlTypeDefTy};
use crate::time::{DurationCodec, TimestampCodec};

/// Byte length of public keys and hashes
pub const DEFAULT_HASH_BYTE_LENGTH: usize = 32;

/// Upper bound accepted for string payloads
pub const MAX_STRING_LENGTH: usize = u32::MAX as usize;

/// Wire byte order named in configuration; unknown values default to
/// little endian
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum EncodingKind {
    #[default]
    #[serde(rename = "littleendian", alias = "little_endian")]
    LittleEndian,
    #[serde(rename = "bigendian", alias = "big_endian")]
    BigEndian,
}

impl EncodingKind {
    pub fn builder(self) -> Builder {
        match self {
            EncodingKind::LittleEndian => Builder::little_endian(),
            EncodingKind::BigEndian => Builder::big_endian(),
        }
    }
}

/// Compile one codec per account definition, without discriminator prefixes
pub fn build_idl_codec(idl: &Idl, builder: Builder) -> CodecResult<CodecEntry> {
    build(idl, builder, false)
}

/// Compile one codec per account definition, each prefixed with the 8-byte
/// account discriminator field
pub fn build_idl_account_codec(idl: &Idl, builder: Builder) -> CodecResult<CodecEntry> {
    build(idl, builder, true)
}

fn build(idl: &Idl, builder: Builder, with_discriminator: bool) -> CodecResult<CodecEntry> {
    let mut refs = CodecRefs {
        builder,
        codecs: HashMap::new(),
        in_progress: HashSet::new(),
        type_defs: &idl.types,
    };

    let mut accounts = HashMap::new();
    for account in &idl.accounts {
        let (name, codec) = create_named_codec(account, &mut refs, with_discriminator)?;
        debug!(account = %name, "compiled account codec");
        accounts.insert(name, codec);
    }

    Ok(CodecEntry::new(accounts))
}

struct CodecRefs<'a> {
    builder: Builder,
    codecs: HashMap<String, Arc<dyn TypeCodec>>,
    in_progress: HashSet<String>,
    type_defs: &'a [IdlTypeDef],
}

fn create_named_codec(
    def: &IdlTypeDef,
    refs: &mut CodecRefs<'_>,
    with_discriminator: bool,
) -> CodecResult<(String, Arc<dyn TypeCodec>)> {
    match &def.ty {
        IdlTypeDefTy::Struct { fields } => {
            let mut named = Vec::with_capacity(fields.len() + 1);
            if with_discriminator {
                named.push(NamedCodec {
                    name: "Discriminator".to_string(),
                    codec: Arc::new(Discriminator::new(&def.name)),
                });
            }
            for field in fields {
                named.push(NamedCodec {
                    name: title_case(&field.name),
                    codec: process_field_type(&field.ty, refs)?,
                });
            }
            let codec = refs.builder.struct_of(def.name.clone(), named)?;
            Ok((def.name.clone(), codec))
        }
        IdlTypeDefTy::Enum { .. } => Err(CodecError::unsupported(format!(
            "unsupported schema kind enum for type {}",
            def.name
        ))),
    }
}

fn process_field_type(ty: &IdlType, refs: &mut CodecRefs<'_>) -> CodecResult<Arc<dyn TypeCodec>> {
    match ty {
        IdlType::Primitive(primitive) => codec_by_primitive(*primitive, &refs.builder),
        // absence has no wire form; the option layer compiles to the
        // inner codec and the struct boundary handles present/absent
        IdlType::Option { option } => process_field_type(option, refs),
        IdlType::Defined { defined } => as_defined(defined, refs),
        IdlType::Array { array: (inner, len) } => as_array(inner, *len, refs),
        IdlType::Vec { vec } => {
            let elem = process_field_type(vec, refs)?;
            Ok(refs.builder.vector(elem))
        }
    }
}

fn as_defined(name: &str, refs: &mut CodecRefs<'_>) -> CodecResult<Arc<dyn TypeCodec>> {
    // already compiled as a shared sub-type
    if let Some(saved) = refs.codecs.get(name) {
        return Ok(Arc::clone(saved));
    }

    if refs.in_progress.contains(name) {
        return Err(CodecError::invalid_config(format!(
            "cyclic type reference involving {name}"
        )));
    }

    let next_def = refs
        .type_defs
        .iter()
        .find(|def| def.name == name)
        .ok_or_else(|| {
            CodecError::invalid_config(format!("IDL type does not exist for name {name}"))
        })?
        .clone();

    refs.in_progress.insert(name.to_string());
    let (new_name, codec) = create_named_codec(&next_def, refs, false)?;
    refs.in_progress.remove(name);

    refs.codecs.insert(new_name, Arc::clone(&codec));
    Ok(codec)
}

fn as_array(inner: &IdlType, len: usize, refs: &mut CodecRefs<'_>) -> CodecResult<Arc<dyn TypeCodec>> {
    // arrays of u8 compile to one contiguous byte codec
    if matches!(inner, IdlType::Primitive(IdlPrimitive::U8)) {
        return Ok(refs.builder.fixed_bytes(len));
    }
    let elem = process_field_type(inner, refs)?;
    Ok(refs.builder.array(len, elem))
}

fn codec_by_primitive(
    primitive: IdlPrimitive,
    builder: &Builder,
) -> CodecResult<Arc<dyn TypeCodec>> {
    Ok(match primitive {
        IdlPrimitive::Bool => builder.bool_codec(),
        IdlPrimitive::U8 => builder.uint8(),
        IdlPrimitive::U16 => builder.uint16(),
        IdlPrimitive::U32 => builder.uint32(),
        IdlPrimitive::U64 => builder.uint64(),
        IdlPrimitive::U128 => builder.uint128(),
        IdlPrimitive::I8 => builder.int8(),
        IdlPrimitive::I16 => builder.int16(),
        IdlPrimitive::I32 => builder.int32(),
        IdlPrimitive::I64 => builder.int64(),
        IdlPrimitive::I128 => builder.int128(),
        IdlPrimitive::String => builder.string(MAX_STRING_LENGTH),
        IdlPrimitive::Bytes => builder.bytes(),
        IdlPrimitive::PublicKey | IdlPrimitive::Hash => {
            builder.fixed_bytes(DEFAULT_HASH_BYTE_LENGTH)
        }
        IdlPrimitive::UnixTimestamp => Arc::new(TimestampCodec::new(builder)),
        IdlPrimitive::Duration => Arc::new(DurationCodec::new(builder)),
    })
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteCodec;
    use crate::value::{StructValue, Value};

    fn two_level_idl() -> Idl {
        Idl::from_json(
            r#"{
                "accounts": [
                    {
                        "name": "Outer",
                        "type": {
                            "kind": "struct",
                            "fields": [
                                {"name": "value", "type": "u8"},
                                {"name": "first", "type": {"defined": "Shared"}},
                                {"name": "second", "type": {"defined": "Shared"}}
                            ]
                        }
                    }
                ],
                "types": [
                    {
                        "name": "Shared",
                        "type": {
                            "kind": "struct",
                            "fields": [{"name": "prop", "type": "i64"}]
                        }
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn shared_sub_types_compile_once_and_round_trip() {
        let entry = build_idl_codec(&two_level_idl(), Builder::little_endian()).unwrap();

        let mut shared = StructValue::new("Shared");
        shared.insert("Prop", Value::I64(7)).unwrap();
        let mut outer = StructValue::new("Outer");
        outer.insert("Value", Value::U8(1)).unwrap();
        outer
            .insert("First", Value::Struct(shared.clone()))
            .unwrap();
        outer.insert("Second", Value::Struct(shared)).unwrap();

        let bytes = entry.encode(&Value::Struct(outer.clone()), "Outer").unwrap();
        assert_eq!(bytes.len(), 1 + 8 + 8);

        let decoded = entry.decode(&bytes, "Outer").unwrap();
        assert_eq!(decoded, Value::Struct(outer));
    }

    #[test]
    fn field_names_are_title_cased() {
        let entry = build_idl_codec(&two_level_idl(), Builder::little_endian()).unwrap();
        let ty = entry.create_type("Outer", false).unwrap();
        let (_, fields) = ty.as_struct().unwrap();
        let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Value", "First", "Second"]);
    }

    #[test]
    fn account_codec_prefixes_the_discriminator() {
        let entry = build_idl_account_codec(&two_level_idl(), Builder::little_endian()).unwrap();
        let ty = entry.create_type("Outer", false).unwrap();
        let (_, fields) = ty.as_struct().unwrap();
        assert_eq!(fields[0].0, "Discriminator");

        let mut outer = StructValue::new("Outer");
        outer.insert("Value", Value::U8(1)).unwrap();
        let mut shared = StructValue::new("Shared");
        shared.insert("Prop", Value::I64(7)).unwrap();
        outer
            .insert("First", Value::Struct(shared.clone()))
            .unwrap();
        outer.insert("Second", Value::Struct(shared)).unwrap();

        // the absent discriminator field is injected on encode
        let bytes = entry.encode(&Value::Struct(outer), "Outer").unwrap();
        assert_eq!(bytes.len(), 8 + 1 + 8 + 8);

        // and validated on decode
        let mut tampered = bytes.clone();
        tampered[0] ^= 0xFF;
        let err = entry.decode(&tampered, "Outer").unwrap_err();
        assert!(err.is_invalid_encoding());
    }

    #[test]
    fn missing_defined_type_is_a_config_error() {
        let idl = Idl::from_json(
            r#"{
                "accounts": [
                    {
                        "name": "Broken",
                        "type": {
                            "kind": "struct",
                            "fields": [{"name": "x", "type": {"defined": "Missing"}}]
                        }
                    }
                ],
                "types": []
            }"#,
        )
        .unwrap();

        let err = build_idl_codec(&idl, Builder::little_endian()).unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[test]
    fn circular_dependency_is_a_config_error() {
        let idl = Idl::from_json(
            r#"{
                "accounts": [
                    {
                        "name": "Top",
                        "type": {
                            "kind": "struct",
                            "fields": [{"name": "a", "type": {"defined": "A"}}]
                        }
                    }
                ],
                "types": [
                    {
                        "name": "A",
                        "type": {
                            "kind": "struct",
                            "fields": [{"name": "b", "type": {"defined": "B"}}]
                        }
                    },
                    {
                        "name": "B",
                        "type": {
                            "kind": "struct",
                            "fields": [{"name": "a", "type": {"defined": "A"}}]
                        }
                    }
                ]
            }"#,
        )
        .unwrap();

        let err = build_idl_codec(&idl, Builder::little_endian()).unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[test]
    fn enum_kind_is_unsupported() {
        let idl = Idl::from_json(
            r#"{
                "accounts": [
                    {
                        "name": "Simple",
                        "type": {
                            "kind": "enum",
                            "variants": [{"name": "A"}, {"name": "B"}]
                        }
                    }
                ],
                "types": []
            }"#,
        )
        .unwrap();

        let err = build_idl_codec(&idl, Builder::little_endian()).unwrap_err();
        assert!(matches!(err, CodecError::Unsupported { .. }));
    }
}
