//! # Chain Reader
//!
//! ## Purpose
//!
//! Reads and decodes on-chain account state through schema-compiled
//! codecs. Configuration declares namespaces of methods; each method
//! carries an IDL document and one or more account-read procedures. The
//! [`ChainReaderService`] compiles everything up front, routes reads by
//! `namespace`/`method`, and merges multi-account methods into one
//! logical record.
//!
//! ## Architecture Role
//!
//! ```text
//! ReaderConfig ──> ChainReaderService ──> NamespaceBindings
//!                        │                      │
//!                  lifecycle state        AccountReadBinding (per procedure)
//!                                               │
//!                                  BinaryDataReader  +  solreader-codec
//! ```
//!
//! Fetches are cancellable through cause-carrying tokens ([`cancel`]) and
//! may be started ahead of consumption through single-use preload results
//! ([`loaded`]).

pub mod address;
pub mod binding;
pub mod bindings;
pub mod byte_reader;
pub mod cancel;
pub mod error;
pub mod loaded;
pub mod reader;

pub use address::{Address, ADDRESS_LENGTH};
pub use binding::{AccountReadBinding, ReadBinding};
pub use bindings::{BoundContract, NamespaceBindings};
pub use byte_reader::{BinaryDataReader, Commitment, DataSlice, ReadOpts};
pub use cancel::{CancelHandle, CancellationToken};
pub use error::{ReaderError, ReaderResult};
pub use loaded::LoadedResult;
pub use reader::{
    ChainReaderService, MethodConfig, NamespaceConfig, ProcedureConfig, ReaderConfig,
    SERVICE_NAME,
};
