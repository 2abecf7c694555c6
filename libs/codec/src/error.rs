//! Error types for schema compilation and codec operation
//!
//! Every failure mode carries enough context (type name, field name,
//! byte counts) to diagnose a bad schema or payload without re-deriving
//! state at the call site. Nothing here is retried internally.

use thiserror::Error;

/// Result alias used throughout the codec crate
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors produced while compiling a schema or running a codec
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The schema document or modifier configuration is invalid
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// A value with the wrong runtime shape was passed to a codec
    #[error("invalid type for {context}: expected {expected}, got {got}")]
    InvalidType {
        context: String,
        expected: String,
        got: String,
    },

    /// The byte payload cannot be interpreted by the codec
    #[error("invalid encoding: {reason}")]
    InvalidEncoding { reason: String },

    /// The byte payload ended before the codec consumed all declared bytes
    #[error("invalid encoding: need {needed} bytes, got {got}")]
    ShortBuffer { needed: usize, got: usize },

    /// A schema construct without a defined representation
    #[error("unsupported: {feature}")]
    Unsupported { feature: String },
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig {
            reason: err.to_string(),
        }
    }
}

impl CodecError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub fn invalid_type(
        context: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        Self::InvalidType {
            context: context.into(),
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn invalid_encoding(reason: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            reason: reason.into(),
        }
    }

    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    /// True for configuration-class failures
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// True for payload-class failures, including undersized buffers
    pub fn is_invalid_encoding(&self) -> bool {
        matches!(
            self,
            Self::InvalidEncoding { .. } | Self::ShortBuffer { .. }
        )
    }

    /// True for wrong-runtime-shape failures
    pub fn is_invalid_type(&self) -> bool {
        matches!(self, Self::InvalidType { .. })
    }
}
