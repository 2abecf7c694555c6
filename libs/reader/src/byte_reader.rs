//! The external byte-source contract.
//!
//! Everything above this trait is transport-agnostic: bindings ask for
//! the full account payload at an address and optionally constrain the
//! read with a byte-range slice or a consistency level. Implementations
//! talk to whatever RPC surface actually holds the ledger.

use async_trait::async_trait;
use serde::Deserialize;

use crate::address::Address;
use crate::error::ReaderResult;

/// A byte range within the stored account payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DataSlice {
    pub offset: usize,
    pub length: usize,
}

/// Consistency level a read should be served at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

/// Per-procedure read overrides
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReadOpts {
    #[serde(default)]
    pub data_slice: Option<DataSlice>,
    #[serde(default)]
    pub commitment: Option<Commitment>,
}

/// Source of raw account bytes
#[async_trait]
pub trait BinaryDataReader: Send + Sync {
    /// Read the complete stored payload for `address`
    async fn read_all(&self, address: Address, opts: Option<&ReadOpts>) -> ReaderResult<Vec<u8>>;
}
