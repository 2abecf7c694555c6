//! Account discriminator codec.
//!
//! A decodable on-chain record is self-describing: its first 8 bytes are
//! a truncated SHA-256 of `"account:" + <type name>`. The codec injects
//! the canonical tag when the caller provides no value, refuses to encode
//! a mismatched tag, and rejects payloads that do not open with the
//! expected bytes, guarding against bytes being routed to the wrong codec.

use sha2::{Digest, Sha256};

use crate::encodings::{take, TypeCodec};
use crate::error::{CodecError, CodecResult};
use crate::value::{RuntimeType, Value};

pub const DISCRIMINATOR_LENGTH: usize = 8;

/// Codec for the fixed 8-byte account-type tag
pub struct Discriminator {
    hash_prefix: [u8; DISCRIMINATOR_LENGTH],
}

impl Discriminator {
    pub fn new(account_name: &str) -> Self {
        let digest = Sha256::digest(format!("account:{account_name}").as_bytes());
        let mut hash_prefix = [0u8; DISCRIMINATOR_LENGTH];
        hash_prefix.copy_from_slice(&digest[..DISCRIMINATOR_LENGTH]);
        Self { hash_prefix }
    }

    /// The canonical tag for this account type
    pub fn hash_prefix(&self) -> &[u8; DISCRIMINATOR_LENGTH] {
        &self.hash_prefix
    }
}

impl TypeCodec for Discriminator {
    fn encode(&self, value: &Value, into: &mut Vec<u8>) -> CodecResult<()> {
        let raw = match value {
            // inject if not specified
            Value::Option(None) => {
                into.extend_from_slice(&self.hash_prefix);
                return Ok(());
            }
            Value::Option(Some(inner)) => match inner.as_ref() {
                Value::Bytes(raw) => raw,
                other => {
                    return Err(CodecError::invalid_type(
                        "discriminator",
                        "bytes",
                        other.kind_name(),
                    ))
                }
            },
            Value::Bytes(raw) => raw,
            other => {
                return Err(CodecError::invalid_type(
                    "discriminator",
                    "bytes",
                    other.kind_name(),
                ))
            }
        };

        if raw.as_slice() != self.hash_prefix {
            return Err(CodecError::invalid_type(
                "discriminator",
                hex::encode(self.hash_prefix),
                hex::encode(raw),
            ));
        }

        into.extend_from_slice(raw);
        Ok(())
    }

    fn decode<'a>(&self, encoded: &'a [u8]) -> CodecResult<(Value, &'a [u8])> {
        let (raw, rest) = take(encoded, DISCRIMINATOR_LENGTH)?;
        if raw != self.hash_prefix {
            return Err(CodecError::invalid_encoding(format!(
                "invalid discriminator: expected {}, got {}",
                hex::encode(self.hash_prefix),
                hex::encode(raw)
            )));
        }
        Ok((
            Value::Option(Some(Box::new(Value::Bytes(raw.to_vec())))),
            rest,
        ))
    }

    fn runtime_type(&self) -> RuntimeType {
        // optional so that an absent value can inject the canonical tag
        RuntimeType::Option {
            inner: Box::new(RuntimeType::Bytes),
        }
    }

    fn size(&self, _elements: usize) -> CodecResult<usize> {
        Ok(DISCRIMINATOR_LENGTH)
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(DISCRIMINATOR_LENGTH)
    }
}
