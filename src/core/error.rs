//! Error types for tonechain.
//!
//! Uses thiserror for structured errors. The chain itself never
//! propagates a failure out of an editing operation: construction-time
//! configuration mistakes are the only fatal path, everything else
//! degrades to fewer stages or a no-op (see the chain docs).

use crate::core::types::ParamKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type.
///
/// Encompasses every error category the library or the CLI can surface
/// and enables automatic conversion from the specific types.
#[derive(Error, Debug)]
pub enum TonechainError {
    /// Invalid configuration requested at construction time.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// I/O failure while reading or writing image files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Decode/encode failure from the image codecs.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// State snapshot (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Errors from requesting something the closed catalog does not contain.
///
/// Raised when a caller names a filter the registry does not know, at a
/// point that expects a valid entry. This is fatal to the construction
/// attempt that triggered it; it is never swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigurationError {
    /// The identifier is not registered.
    #[error("unknown filter identifier '{0}'")]
    UnknownFilter(String),
}

/// A stage rejecting a parameter write of the wrong kind.
///
/// Chains never see this in practice: the registry's conversion function
/// produces the kind its own factory's stage accepts, an invariant the
/// builtin table is tested for. Direct [`crate::core::stage::AdjustmentStage`]
/// users get the typed rejection instead of a silent coercion.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamError {
    /// The value's kind does not match what the stage tunes on.
    #[error("parameter kind mismatch: expected {expected}, got {got}")]
    KindMismatch {
        /// Kind the stage accepts.
        expected: ParamKind,
        /// Kind that was supplied.
        got: ParamKind,
    },
}

/// Result type alias for tonechain operations.
pub type TonechainResult<T> = Result<T, TonechainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = ConfigurationError::UnknownFilter("sepia".to_string());
        assert_eq!(err.to_string(), "unknown filter identifier 'sepia'");

        let top: TonechainError = err.into();
        assert!(top.to_string().starts_with("Configuration error:"));
    }

    #[test]
    fn test_param_error_display() {
        let err = ParamError::KindMismatch {
            expected: ParamKind::Vector2,
            got: ParamKind::Scalar,
        };
        assert_eq!(
            err.to_string(),
            "parameter kind mismatch: expected vector2, got scalar"
        );
    }
}
