//! # Output Modifier Pipeline
//!
//! ## Purpose
//!
//! Wraps a compiled codec with an ordered list of declarative, field-level
//! transformations: rename a field, extract one field as the entire
//! decoded value, inject an off-chain constant field with no wire
//! representation, or present 32-byte address fields as base58 strings.
//! Modifiers only reshape the in-memory value and its
//! runtime type; the wire bytes produced by encode are identical to what
//! the unmodified codec would produce for an equivalent unmodified value.
//!
//! Decode applies each transform in declared order; encode applies each
//! transform's inverse in the same declared order.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::builder::DEFAULT_HASH_BYTE_LENGTH;
use crate::error::{CodecError, CodecResult};
use crate::remote::RemoteCodec;
use crate::value::{RuntimeType, StructValue, Value};

/// Declarative modifier entry as it appears in configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModifierConfig {
    /// Rename struct fields; keys are on-chain names, values exposed names
    Rename { fields: HashMap<String, String> },
    /// The named field becomes the entire decoded value
    Extract { field: String },
    /// Inject a constant field that has no on-wire representation
    Hardcode {
        field: String,
        value: serde_json::Value,
    },
    /// Present 32-byte address fields as base58 strings
    AddressToString { fields: Vec<String> },
}

/// A resolved modifier ready to transform values and types
#[derive(Debug, Clone)]
enum Modifier {
    Rename { fields: HashMap<String, String> },
    Extract { field: String },
    Hardcode { field: String, value: Value },
    AddressToString { fields: Vec<String> },
}

impl Modifier {
    fn from_config(config: &ModifierConfig) -> CodecResult<Self> {
        Ok(match config {
            ModifierConfig::Rename { fields } => Modifier::Rename {
                fields: fields.clone(),
            },
            ModifierConfig::Extract { field } => Modifier::Extract {
                field: field.clone(),
            },
            ModifierConfig::Hardcode { field, value } => Modifier::Hardcode {
                field: field.clone(),
                value: Value::from_json(value)?,
            },
            ModifierConfig::AddressToString { fields } => Modifier::AddressToString {
                fields: fields.clone(),
            },
        })
    }

    /// On-chain shape to off-chain shape
    fn transform_decoded(&self, value: Value) -> CodecResult<Value> {
        match self {
            Modifier::Rename { fields } => {
                let mut s = require_struct(value, "rename modifier")?;
                for (from, to) in fields {
                    s.rename(from, to)?;
                }
                Ok(Value::Struct(s))
            }
            Modifier::Extract { field } => {
                let mut s = require_struct(value, "extract modifier")?;
                s.remove(field).ok_or_else(|| {
                    CodecError::invalid_config(format!("no field named {field} to extract"))
                })
            }
            Modifier::Hardcode {
                field,
                value: constant,
            } => {
                let mut s = require_struct(value, "hardcode modifier")?;
                s.insert(field.clone(), constant.clone())?;
                Ok(Value::Struct(s))
            }
            Modifier::AddressToString { fields } => {
                let mut s = require_struct(value, "address modifier")?;
                for field in fields {
                    let slot = s.get_mut(field).ok_or_else(|| {
                        CodecError::invalid_config(format!(
                            "no field named {field} to present as an address"
                        ))
                    })?;
                    let text = match slot {
                        Value::Bytes(raw) if raw.len() == DEFAULT_HASH_BYTE_LENGTH => {
                            bs58::encode(&*raw).into_string()
                        }
                        Value::Bytes(raw) => {
                            return Err(CodecError::invalid_type(
                                format!("address field {field}"),
                                format!("{DEFAULT_HASH_BYTE_LENGTH} bytes"),
                                format!("{} bytes", raw.len()),
                            ))
                        }
                        other => {
                            return Err(CodecError::invalid_type(
                                format!("address field {field}"),
                                "bytes",
                                other.kind_name(),
                            ))
                        }
                    };
                    *slot = Value::String(text);
                }
                Ok(Value::Struct(s))
            }
        }
    }

    /// Off-chain shape back to on-chain shape
    fn transform_for_encoding(&self, value: Value) -> CodecResult<Value> {
        match self {
            Modifier::Rename { fields } => {
                let mut s = require_struct(value, "rename modifier")?;
                for (from, to) in fields {
                    // inverse mapping; the exposed name may be absent when
                    // the caller omitted an optional field
                    if s.get(to).is_some() {
                        s.rename(to, from)?;
                    }
                }
                Ok(Value::Struct(s))
            }
            Modifier::Extract { field } => {
                // extraction loses sibling fields; re-wrap and let the
                // wire codec fail if the layout needs more than this field
                let mut s = StructValue::new("");
                s.insert(field.clone(), value)?;
                Ok(Value::Struct(s))
            }
            Modifier::Hardcode { field, .. } => {
                let mut s = require_struct(value, "hardcode modifier")?;
                s.remove(field);
                Ok(Value::Struct(s))
            }
            Modifier::AddressToString { fields } => {
                let mut s = require_struct(value, "address modifier")?;
                for field in fields {
                    // absent fields fall through to the wire codec's own
                    // presence handling
                    let Some(slot) = s.get_mut(field) else {
                        continue;
                    };
                    let raw = match slot {
                        Value::String(text) => {
                            bs58::decode(text.as_str()).into_vec().map_err(|e| {
                                CodecError::invalid_encoding(format!(
                                    "address field {field} is not base58: {e}"
                                ))
                            })?
                        }
                        other => {
                            return Err(CodecError::invalid_type(
                                format!("address field {field}"),
                                "base58 string",
                                other.kind_name(),
                            ))
                        }
                    };
                    if raw.len() != DEFAULT_HASH_BYTE_LENGTH {
                        return Err(CodecError::invalid_type(
                            format!("address field {field}"),
                            format!("{DEFAULT_HASH_BYTE_LENGTH} bytes"),
                            format!("{} bytes", raw.len()),
                        ));
                    }
                    *slot = Value::Bytes(raw);
                }
                Ok(Value::Struct(s))
            }
        }
    }

    fn transform_type(&self, ty: RuntimeType) -> CodecResult<RuntimeType> {
        match self {
            Modifier::Rename { fields } => {
                let RuntimeType::Struct { name, fields: mut tys } = ty else {
                    return Err(CodecError::invalid_type(
                        "rename modifier",
                        "struct",
                        ty.describe(),
                    ));
                };
                for (from, to) in fields {
                    match tys.iter_mut().find(|(n, _)| n == from) {
                        Some((n, _)) => *n = to.clone(),
                        None => {
                            return Err(CodecError::invalid_config(format!(
                                "no field named {from} to rename"
                            )))
                        }
                    }
                }
                Ok(RuntimeType::Struct { name, fields: tys })
            }
            Modifier::Extract { field } => {
                let RuntimeType::Struct { fields: tys, .. } = &ty else {
                    return Err(CodecError::invalid_type(
                        "extract modifier",
                        "struct",
                        ty.describe(),
                    ));
                };
                tys.iter()
                    .find(|(n, _)| n == field)
                    .map(|(_, t)| t.clone())
                    .ok_or_else(|| {
                        CodecError::invalid_config(format!("no field named {field} to extract"))
                    })
            }
            Modifier::Hardcode { field, value } => {
                let RuntimeType::Struct { name, fields: mut tys } = ty else {
                    return Err(CodecError::invalid_type(
                        "hardcode modifier",
                        "struct",
                        ty.describe(),
                    ));
                };
                if tys.iter().any(|(n, _)| n == field) {
                    return Err(CodecError::invalid_config(format!(
                        "field name overlap on {field}"
                    )));
                }
                tys.push((field.clone(), infer_type(value)));
                Ok(RuntimeType::Struct { name, fields: tys })
            }
            Modifier::AddressToString { fields } => {
                let RuntimeType::Struct { name, fields: mut tys } = ty else {
                    return Err(CodecError::invalid_type(
                        "address modifier",
                        "struct",
                        ty.describe(),
                    ));
                };
                for field in fields {
                    let slot = tys.iter_mut().find(|(n, _)| n == field).ok_or_else(|| {
                        CodecError::invalid_config(format!(
                            "no field named {field} to present as an address"
                        ))
                    })?;
                    if !matches!(slot.1, RuntimeType::Bytes) {
                        return Err(CodecError::invalid_type(
                            format!("address field {field}"),
                            "bytes",
                            slot.1.describe(),
                        ));
                    }
                    slot.1 = RuntimeType::String;
                }
                Ok(RuntimeType::Struct { name, fields: tys })
            }
        }
    }
}

fn require_struct(value: Value, context: &str) -> CodecResult<StructValue> {
    let kind = value.kind_name();
    value
        .into_struct()
        .ok_or_else(|| CodecError::invalid_type(context, "struct", kind))
}

/// Best-effort type descriptor for an injected constant
fn infer_type(value: &Value) -> RuntimeType {
    match value {
        Value::Bool(_) => RuntimeType::Bool,
        Value::U8(_) => RuntimeType::U8,
        Value::U16(_) => RuntimeType::U16,
        Value::U32(_) => RuntimeType::U32,
        Value::U64(_) => RuntimeType::U64,
        Value::U128(_) => RuntimeType::U128,
        Value::I8(_) => RuntimeType::I8,
        Value::I16(_) => RuntimeType::I16,
        Value::I32(_) => RuntimeType::I32,
        Value::I64(_) => RuntimeType::I64,
        Value::I128(_) => RuntimeType::I128,
        Value::String(_) => RuntimeType::String,
        Value::Bytes(_) => RuntimeType::Bytes,
        Value::Timestamp(_) => RuntimeType::Timestamp,
        Value::Duration(_) => RuntimeType::Duration,
        Value::Array(items) => RuntimeType::Vector {
            elem: Box::new(items.first().map(infer_type).unwrap_or(RuntimeType::Bytes)),
        },
        Value::Option(inner) => RuntimeType::Option {
            inner: Box::new(
                inner
                    .as_ref()
                    .map(|v| infer_type(v))
                    .unwrap_or(RuntimeType::Bytes),
            ),
        },
        Value::Struct(s) => RuntimeType::Struct {
            name: s.name().to_string(),
            fields: s
                .iter()
                .map(|(n, v)| (n.to_string(), infer_type(v)))
                .collect(),
        },
    }
}

/// A codec wrapped with per-item-type modifier lists
pub struct ModifierCodec {
    inner: Arc<dyn RemoteCodec>,
    modifiers: HashMap<String, Vec<Modifier>>,
}

impl std::fmt::Debug for ModifierCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModifierCodec")
            .field("modifiers", &self.modifiers)
            .finish_non_exhaustive()
    }
}

/// Wrap `inner` with the given modifiers for one item type, validating the
/// configuration eagerly by resolving the modified type once.
pub fn with_named_modifiers(
    inner: Arc<dyn RemoteCodec>,
    item_type: &str,
    configs: &[ModifierConfig],
) -> CodecResult<ModifierCodec> {
    let resolved = configs
        .iter()
        .map(Modifier::from_config)
        .collect::<CodecResult<Vec<_>>>()?;

    let codec = ModifierCodec {
        inner,
        modifiers: HashMap::from([(item_type.to_string(), resolved)]),
    };

    codec.create_type(item_type, true)?;
    Ok(codec)
}

impl RemoteCodec for ModifierCodec {
    fn encode(&self, value: &Value, item_type: &str) -> CodecResult<Vec<u8>> {
        let mut value = value.clone();
        if let Some(mods) = self.modifiers.get(item_type) {
            for modifier in mods {
                value = modifier.transform_for_encoding(value)?;
            }
        }
        self.inner.encode(&value, item_type)
    }

    fn decode(&self, bytes: &[u8], item_type: &str) -> CodecResult<Value> {
        let mut value = self.inner.decode(bytes, item_type)?;
        if let Some(mods) = self.modifiers.get(item_type) {
            for modifier in mods {
                value = modifier.transform_decoded(value)?;
            }
        }
        Ok(value)
    }

    fn create_type(&self, item_type: &str, for_encoding: bool) -> CodecResult<RuntimeType> {
        let mut ty = self.inner.create_type(item_type, for_encoding)?;
        if let Some(mods) = self.modifiers.get(item_type) {
            for modifier in mods {
                ty = modifier.transform_type(ty)?;
            }
        }
        Ok(ty)
    }
}
