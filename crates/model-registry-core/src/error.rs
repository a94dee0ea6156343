//! Errors raised while converting custom properties

use thiserror::Error;

/// Errors from the custom-property codec
///
/// Every per-entry variant names the offending property key so that a
/// failed response decode points at the exact envelope.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Custom property '{key}' has no metadataType")]
    MissingType { key: String },

    #[error("Custom property '{key}' of type {metadata_type} has no usable value field")]
    MissingValue { key: String, metadata_type: String },

    #[error("Custom property '{key}' has unknown metadataType {metadata_type}")]
    UnknownType { key: String, metadata_type: String },

    #[error("Custom property '{key}' is not an object")]
    MalformedEnvelope { key: String },

    #[error("customProperties must be an object, found {0}")]
    NotAnObject(&'static str),

    #[error("Custom property '{key}' holds a non-finite float")]
    NonFiniteFloat { key: String },

    #[error("Custom property '{key}' holds an unsupported {kind} value")]
    UnsupportedValue { key: String, kind: &'static str },
}

impl CodecError {
    /// The property key this error refers to, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            CodecError::MissingType { key }
            | CodecError::MissingValue { key, .. }
            | CodecError::UnknownType { key, .. }
            | CodecError::MalformedEnvelope { key }
            | CodecError::NonFiniteFloat { key }
            | CodecError::UnsupportedValue { key, .. } => Some(key),
            CodecError::NotAnObject(_) => None,
        }
    }
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
