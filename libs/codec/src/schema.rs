//! Serde model of the IDL schema document.
//!
//! The document carries two collections: `accounts` are the top-level
//! decodable entities, `types` are named sub-types referenced by accounts
//! or by each other. Field types are either a bare primitive name or a
//! single-key object selecting `option`, `defined`, `array` or `vec`.

use serde::Deserialize;

/// A parsed IDL document
#[derive(Debug, Clone, Deserialize)]
pub struct Idl {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub accounts: Vec<IdlTypeDef>,
    #[serde(default)]
    pub types: Vec<IdlTypeDef>,
}

impl Idl {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Look up a shared sub-type by name
    pub fn type_by_name(&self, name: &str) -> Option<&IdlTypeDef> {
        self.types.iter().find(|def| def.name == name)
    }
}

/// A named type definition
#[derive(Debug, Clone, Deserialize)]
pub struct IdlTypeDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: IdlTypeDefTy,
}

/// The body of a type definition, discriminated by `kind`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IdlTypeDefTy {
    Struct { fields: Vec<IdlField> },
    Enum { variants: Vec<IdlEnumVariant> },
}

/// One named struct field
#[derive(Debug, Clone, Deserialize)]
pub struct IdlField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: IdlType,
}

/// An enum variant; variants carry no representation in this core
#[derive(Debug, Clone, Deserialize)]
pub struct IdlEnumVariant {
    pub name: String,
}

/// A field type reference
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdlType {
    Primitive(IdlPrimitive),
    Option { option: Box<IdlType> },
    Defined { defined: String },
    Array { array: (Box<IdlType>, usize) },
    Vec { vec: Box<IdlType> },
}

/// Primitive scalar names plus the two semantic aliases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum IdlPrimitive {
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "u8")]
    U8,
    #[serde(rename = "u16")]
    U16,
    #[serde(rename = "u32")]
    U32,
    #[serde(rename = "u64")]
    U64,
    #[serde(rename = "u128")]
    U128,
    #[serde(rename = "i8")]
    I8,
    #[serde(rename = "i16")]
    I16,
    #[serde(rename = "i32")]
    I32,
    #[serde(rename = "i64")]
    I64,
    #[serde(rename = "i128")]
    I128,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "bytes")]
    Bytes,
    #[serde(rename = "publicKey")]
    PublicKey,
    #[serde(rename = "hash")]
    Hash,
    #[serde(rename = "unixTimestamp")]
    UnixTimestamp,
    #[serde(rename = "duration")]
    Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_field_types() {
        let json = r#"{
            "version": "0.1.0",
            "name": "some_test_idl",
            "accounts": [
                {
                    "name": "Account",
                    "type": {
                        "kind": "struct",
                        "fields": [
                            {"name": "value", "type": "u8"},
                            {"name": "inner", "type": {"defined": "Ref"}},
                            {"name": "grid", "type": {"array": [{"array": ["u32", 3]}, 3]}},
                            {"name": "maybe", "type": {"option": "string"}},
                            {"name": "items", "type": {"vec": "string"}},
                            {"name": "when", "type": "unixTimestamp"}
                        ]
                    }
                }
            ],
            "types": [
                {
                    "name": "Ref",
                    "type": {"kind": "struct", "fields": [{"name": "prop", "type": "i64"}]}
                },
                {
                    "name": "Simple",
                    "type": {"kind": "enum", "variants": [{"name": "A"}, {"name": "B"}]}
                }
            ]
        }"#;

        let idl = Idl::from_json(json).unwrap();
        assert_eq!(idl.accounts.len(), 1);
        assert_eq!(idl.types.len(), 2);
        assert!(idl.type_by_name("Ref").is_some());
        assert!(idl.type_by_name("Missing").is_none());

        let IdlTypeDefTy::Struct { fields } = &idl.accounts[0].ty else {
            panic!("expected struct kind");
        };
        assert!(matches!(
            fields[0].ty,
            IdlType::Primitive(IdlPrimitive::U8)
        ));
        assert!(matches!(fields[1].ty, IdlType::Defined { .. }));
        assert!(matches!(
            fields[2].ty,
            IdlType::Array {
                array: (_, 3)
            }
        ));
        assert!(matches!(fields[3].ty, IdlType::Option { .. }));
        assert!(matches!(fields[4].ty, IdlType::Vec { .. }));
        assert!(matches!(
            fields[5].ty,
            IdlType::Primitive(IdlPrimitive::UnixTimestamp)
        ));
    }
}
