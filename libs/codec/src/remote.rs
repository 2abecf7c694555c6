//! The externally consumed codec surface.
//!
//! A [`CodecEntry`] keys compiled [`TypeCodec`]s by account name and is
//! what bindings hold after schema compilation and modifier application.
//! The [`RemoteCodec`] trait is the stable contract: encode or decode one
//! named item type, or ask for its runtime type descriptor.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::encodings::TypeCodec;
use crate::error::{CodecError, CodecResult};
use crate::value::{RuntimeType, Value};

/// A named-account-keyed collection of codecs
pub trait RemoteCodec: Send + Sync {
    /// Produce the wire bytes for `value` under the named item type
    fn encode(&self, value: &Value, item_type: &str) -> CodecResult<Vec<u8>>;

    /// Decode account bytes under the named item type
    fn decode(&self, bytes: &[u8], item_type: &str) -> CodecResult<Value>;

    /// The shape callers pass in (`for_encoding`) or receive back
    fn create_type(&self, item_type: &str, for_encoding: bool) -> CodecResult<RuntimeType>;
}

/// Compiled codecs keyed by account name
pub struct CodecEntry {
    codecs: HashMap<String, Arc<dyn TypeCodec>>,
}

impl std::fmt::Debug for CodecEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecEntry")
            .field("codecs", &self.codecs.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CodecEntry {
    pub fn new(codecs: HashMap<String, Arc<dyn TypeCodec>>) -> Self {
        Self { codecs }
    }

    pub fn account_names(&self) -> impl Iterator<Item = &str> {
        self.codecs.keys().map(String::as_str)
    }

    fn codec_for(&self, item_type: &str) -> CodecResult<&Arc<dyn TypeCodec>> {
        self.codecs.get(item_type).ok_or_else(|| {
            CodecError::invalid_type("codec entry", "a known item type", item_type)
        })
    }
}

impl RemoteCodec for CodecEntry {
    fn encode(&self, value: &Value, item_type: &str) -> CodecResult<Vec<u8>> {
        let codec = self.codec_for(item_type)?;
        let mut buf = match codec.fixed_size() {
            Some(size) => Vec::with_capacity(size),
            None => Vec::new(),
        };
        codec.encode(value, &mut buf)?;
        Ok(buf)
    }

    fn decode(&self, bytes: &[u8], item_type: &str) -> CodecResult<Value> {
        let codec = self.codec_for(item_type)?;
        let (value, remaining) = codec.decode(bytes)?;
        if !remaining.is_empty() {
            // accounts may be over-allocated on chain; trailing bytes are
            // not an error for the declared layout
            debug!(
                item_type,
                trailing = remaining.len(),
                "decoded account left trailing bytes"
            );
        }
        Ok(value)
    }

    fn create_type(&self, item_type: &str, _for_encoding: bool) -> CodecResult<RuntimeType> {
        Ok(self.codec_for(item_type)?.runtime_type())
    }
}
