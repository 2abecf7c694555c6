//! # Schema-Driven Account Codec
//!
//! ## Purpose
//!
//! Compiles an interface definition document (IDL) into binary codecs for
//! on-chain account data. Each named account type becomes a [`TypeCodec`]
//! that encodes and decodes a dynamically typed [`Value`] against the
//! Borsh-style little-endian wire layout the schema declares, with an
//! 8-byte discriminator tag prepended to every account record.
//!
//! ## Architecture Role
//!
//! ```text
//! IDL JSON ──> schema model ──> codec compiler ──> CodecEntry
//!                                                      │
//!                              modifier pipeline <─────┘
//!                                      │
//!                              chain reader bindings
//! ```
//!
//! The compiler resolves defined-type references with memoization and
//! cycle detection, so shared sub-types compile once and self-referential
//! schemas fail with a configuration error instead of recursing forever.
//!
//! ## Example
//!
//! ```no_run
//! use solreader_codec::{build_idl_account_codec, EncodingKind, Idl, RemoteCodec};
//!
//! # fn main() -> Result<(), solreader_codec::CodecError> {
//! # let idl_json = "";
//! let idl = Idl::from_json(idl_json)?;
//! let entry = build_idl_account_codec(&idl, EncodingKind::LittleEndian.builder())?;
//! let decoded = entry.decode(&[0u8; 16], "DataAccount")?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod discriminator;
pub mod encodings;
pub mod error;
pub mod modifier;
pub mod remote;
pub mod schema;
pub mod time;
pub mod value;

pub use builder::{
    build_idl_account_codec, build_idl_codec, EncodingKind, DEFAULT_HASH_BYTE_LENGTH,
    MAX_STRING_LENGTH,
};
pub use discriminator::{Discriminator, DISCRIMINATOR_LENGTH};
pub use encodings::{Builder, ByteOrder, NamedCodec, TypeCodec};
pub use error::{CodecError, CodecResult};
pub use modifier::{with_named_modifiers, ModifierCodec, ModifierConfig};
pub use remote::{CodecEntry, RemoteCodec};
pub use schema::{Idl, IdlField, IdlType, IdlTypeDef, IdlTypeDefTy};
pub use time::{DurationCodec, TimestampCodec};
pub use value::{RuntimeType, StructTypeBuilder, StructValue, Value};
