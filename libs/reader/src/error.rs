//! Error types for the chain reader service
//!
//! Codec failures pass through unchanged; everything else distinguishes
//! configuration problems, read-path failures, cancellation and lifecycle
//! misuse so callers can route on the class of failure. Nothing here is
//! retried internally.

use thiserror::Error;

use solreader_codec::CodecError;

/// Result alias used throughout the reader crate
pub type ReaderResult<T> = Result<T, ReaderError>;

/// Errors produced by bindings, the registry and the service facade
#[derive(Debug, Error)]
pub enum ReaderError {
    /// A schema or codec failure from the codec layer
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The reader configuration or a routing key is invalid
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// A decoded result had the wrong runtime shape
    #[error("invalid type: {reason}")]
    InvalidType { reason: String },

    /// The external byte source failed
    #[error("read failed: {reason}")]
    Read { reason: String },

    /// The operation was cancelled; `cause` names who and why
    #[error("cancelled: {cause}")]
    Cancelled { cause: String },

    /// The binding has no contract address yet
    #[error("binding has not been bound to an address")]
    Unbound,

    /// A single-use preload result was filled or awaited twice
    #[error("preload result already consumed")]
    PreloadConsumed,

    #[error("service already started")]
    AlreadyStarted,

    #[error("service already closed")]
    AlreadyClosed,

    #[error("service not started")]
    NotStarted,
}

impl ReaderError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub fn invalid_type(reason: impl Into<String>) -> Self {
        Self::InvalidType {
            reason: reason.into(),
        }
    }

    pub fn read(reason: impl Into<String>) -> Self {
        Self::Read {
            reason: reason.into(),
        }
    }

    pub fn cancelled(cause: impl Into<String>) -> Self {
        Self::Cancelled {
            cause: cause.into(),
        }
    }

    /// True for configuration-class failures, including those raised by
    /// the codec layer
    pub fn is_invalid_config(&self) -> bool {
        match self {
            Self::InvalidConfig { .. } => true,
            Self::Codec(inner) => inner.is_invalid_config(),
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn is_invalid_type(&self) -> bool {
        match self {
            Self::InvalidType { .. } => true,
            Self::Codec(inner) => inner.is_invalid_type(),
            _ => false,
        }
    }
}
