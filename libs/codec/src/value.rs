//! # Dynamic Values and Runtime Type Descriptors
//!
//! ## Purpose
//!
//! Decoded account data moves through the system as [`Value`], a tagged
//! dynamic value, instead of concrete Rust structs: the shape of the data
//! is only known at runtime, after the schema document has been compiled.
//! [`RuntimeType`] is the matching type descriptor a codec reports for the
//! values it produces and accepts, and is what the binding registry merges
//! when several physical reads are presented as one logical record.
//!
//! ## Integration Points
//!
//! - **Codecs** consume and produce `Value` and report a `RuntimeType`
//! - **Modifiers** reshape `Value::Struct` field lists without touching bytes
//! - **Registry merging** concatenates `RuntimeType::Struct` field lists
//!
//! Struct fields are kept in declaration order; the wire layout depends on
//! that order, so `StructValue` never reorders on insert or rename.

use chrono::{DateTime, Duration, Utc};

use crate::error::{CodecError, CodecResult};

/// A dynamically typed decoded value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Option(Option<Box<Value>>),
    Struct(StructValue),
    Timestamp(DateTime<Utc>),
    Duration(Duration),
}

impl Value {
    /// Short kind name used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::U128(_) => "u128",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::I128(_) => "i128",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Option(_) => "option",
            Value::Struct(_) => "struct",
            Value::Timestamp(_) => "timestamp",
            Value::Duration(_) => "duration",
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_struct(self) -> Option<StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a JSON constant from configuration into a `Value`.
    ///
    /// Floats have no wire representation and are rejected.
    pub fn from_json(json: &serde_json::Value) -> CodecResult<Value> {
        match json {
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Ok(Value::U64(u))
                } else if let Some(i) = n.as_i64() {
                    Ok(Value::I64(i))
                } else {
                    Err(CodecError::invalid_config(format!(
                        "non-integer constant {n} has no wire representation"
                    )))
                }
            }
            serde_json::Value::String(s) => Ok(Value::String(s.clone())),
            serde_json::Value::Array(items) => Ok(Value::Array(
                items
                    .iter()
                    .map(Value::from_json)
                    .collect::<CodecResult<_>>()?,
            )),
            serde_json::Value::Object(map) => {
                let mut fields = StructValue::new("");
                for (name, item) in map {
                    fields.insert(name.clone(), Value::from_json(item)?)?;
                }
                Ok(Value::Struct(fields))
            }
            serde_json::Value::Null => Ok(Value::Option(None)),
        }
    }
}

/// An ordered collection of named field values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructValue {
    name: String,
    fields: Vec<(String, Value)>,
}

impl StructValue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Append a field, rejecting duplicate names
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> CodecResult<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(CodecError::invalid_config(format!(
                "field name overlap on {name}"
            )));
        }
        self.fields.push((name, value));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Mutable access for in-place rewrites that must keep field order
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Remove and return a field, preserving the order of the rest
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(idx).1)
    }

    /// Rename a field in place; the original order is preserved
    pub fn rename(&mut self, from: &str, to: &str) -> CodecResult<()> {
        if from != to && self.get(to).is_some() {
            return Err(CodecError::invalid_config(format!(
                "rename target {to} already exists"
            )));
        }
        match self.fields.iter_mut().find(|(n, _)| n == from) {
            Some((n, _)) => {
                *n = to.to_string();
                Ok(())
            }
            None => Err(CodecError::invalid_config(format!(
                "no field named {from} to rename"
            ))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn into_fields(self) -> Vec<(String, Value)> {
        self.fields
    }
}

/// A type descriptor for the values a codec produces or accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeType {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    I8,
    I16,
    I32,
    I64,
    I128,
    String,
    Bytes,
    Timestamp,
    Duration,
    Array {
        len: usize,
        elem: Box<RuntimeType>,
    },
    Vector {
        elem: Box<RuntimeType>,
    },
    Option {
        inner: Box<RuntimeType>,
    },
    Struct {
        name: String,
        fields: Vec<(String, RuntimeType)>,
    },
}

impl RuntimeType {
    /// Human-readable shape name used in error messages
    pub fn describe(&self) -> String {
        match self {
            RuntimeType::Array { len, elem } => format!("[{}; {len}]", elem.describe()),
            RuntimeType::Vector { elem } => format!("vec<{}>", elem.describe()),
            RuntimeType::Option { inner } => format!("option<{}>", inner.describe()),
            RuntimeType::Struct { name, .. } if !name.is_empty() => format!("struct {name}"),
            RuntimeType::Struct { .. } => "struct".to_string(),
            RuntimeType::Bool => "bool".to_string(),
            RuntimeType::U8 => "u8".to_string(),
            RuntimeType::U16 => "u16".to_string(),
            RuntimeType::U32 => "u32".to_string(),
            RuntimeType::U64 => "u64".to_string(),
            RuntimeType::U128 => "u128".to_string(),
            RuntimeType::I8 => "i8".to_string(),
            RuntimeType::I16 => "i16".to_string(),
            RuntimeType::I32 => "i32".to_string(),
            RuntimeType::I64 => "i64".to_string(),
            RuntimeType::I128 => "i128".to_string(),
            RuntimeType::String => "string".to_string(),
            RuntimeType::Bytes => "bytes".to_string(),
            RuntimeType::Timestamp => "timestamp".to_string(),
            RuntimeType::Duration => "duration".to_string(),
        }
    }

    pub fn as_struct(&self) -> Option<(&str, &[(String, RuntimeType)])> {
        match self {
            RuntimeType::Struct { name, fields } => Some((name.as_str(), fields.as_slice())),
            _ => None,
        }
    }
}

/// Builds a synthesized struct type from an ordered list of fields.
///
/// Used by the binding registry to present several independently decoded
/// records as one merged logical type. Field order follows insertion order
/// and duplicate names are rejected.
#[derive(Debug, Default)]
pub struct StructTypeBuilder {
    name: String,
    fields: Vec<(String, RuntimeType)>,
}

impl StructTypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn add_field(&mut self, name: impl Into<String>, ty: RuntimeType) -> CodecResult<()> {
        let name = name.into();
        if self.fields.iter().any(|(n, _)| *n == name) {
            return Err(CodecError::invalid_config(format!(
                "field name overlap on {name}"
            )));
        }
        self.fields.push((name, ty));
        Ok(())
    }

    pub fn build(self) -> RuntimeType {
        RuntimeType::Struct {
            name: self.name,
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_value_preserves_insertion_order() {
        let mut val = StructValue::new("Test");
        val.insert("B", Value::U8(1)).unwrap();
        val.insert("A", Value::U8(2)).unwrap();

        let names: Vec<&str> = val.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn struct_value_rejects_duplicate_fields() {
        let mut val = StructValue::new("Test");
        val.insert("A", Value::U8(1)).unwrap();

        let err = val.insert("A", Value::U8(2)).unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[test]
    fn rename_keeps_field_order() {
        let mut val = StructValue::new("Test");
        val.insert("A", Value::U8(1)).unwrap();
        val.insert("B", Value::U8(2)).unwrap();
        val.rename("A", "Z").unwrap();

        let names: Vec<&str> = val.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Z", "B"]);
        assert_eq!(val.get("Z"), Some(&Value::U8(1)));
    }

    #[test]
    fn struct_type_builder_rejects_overlap() {
        let mut builder = StructTypeBuilder::new("Merged");
        builder.add_field("A", RuntimeType::U8).unwrap();

        let err = builder.add_field("A", RuntimeType::Bool).unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[test]
    fn json_constants_convert_to_values() {
        let json = serde_json::json!({"Chain": "solana", "Version": 2});
        let val = Value::from_json(&json).unwrap();

        let s = val.as_struct().unwrap();
        assert_eq!(s.get("Chain"), Some(&Value::String("solana".into())));
        assert_eq!(s.get("Version"), Some(&Value::U64(2)));
    }

    #[test]
    fn json_floats_are_rejected() {
        let err = Value::from_json(&serde_json::json!(1.5)).unwrap_err();
        assert!(err.is_invalid_config());
    }
}
