//! Ledger account addresses.
//!
//! Addresses are 32-byte keys carried as base58 text in configuration and
//! bind calls. Parsing validates both the alphabet and the decoded length
//! so a bad address fails at bind time, not at read time.

use std::fmt;
use std::str::FromStr;

use crate::error::ReaderError;

pub const ADDRESS_LENGTH: usize = 32;

/// A 32-byte ledger account key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = ReaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = bs58::decode(s)
            .into_vec()
            .map_err(|e| ReaderError::invalid_config(format!("invalid address {s}: {e}")))?;
        let bytes: [u8; ADDRESS_LENGTH] = decoded.try_into().map_err(|v: Vec<u8>| {
            ReaderError::invalid_config(format!(
                "invalid address {s}: expected {ADDRESS_LENGTH} bytes, got {}",
                v.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(&self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
