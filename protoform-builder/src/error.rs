//! Error types for the builder.

use protoform_model::{MessageError, ValueError};
use thiserror::Error;

/// Result type for builder operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Caller-input errors. All are raised at the point of detection; mutations
/// already applied to the current scope are kept.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The current scope's type has no field with this name.
    #[error("unknown field {field} on {message_type}")]
    UnknownField { message_type: String, field: String },

    /// A nested-population callback was supplied for a non-message field.
    #[error("can't pass block to non-message field {field}")]
    InvalidBlockUsage { field: String },

    /// Wrong number of positional arguments for the selected branch.
    #[error("wrong number of arguments for {field}: {found} (expected {expected})")]
    ArityMismatch {
        field: String,
        expected: &'static str,
        found: usize,
    },

    /// A snapshot (or one of its values) has the wrong shape.
    #[error("can't merge {found} into {target}: expected {expected}")]
    MergeTypeMismatch {
        target: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A repeated callback or extract needs a sequence to iterate.
    #[error("field {field} expects a collection, got {found}")]
    ExpectedCollection { field: String, found: &'static str },

    /// The extract source has no such attribute.
    #[error("element has no attribute {attribute}")]
    MissingAttribute { attribute: String },

    /// Extract attribute names must be strings.
    #[error("attribute names must be strings, got {found}")]
    InvalidAttributeName { found: &'static str },

    /// An empty snapshot value under [`crate::EmptyValuePolicy::Reject`].
    #[error("empty value for {field} rejected by merge policy")]
    EmptyValue { field: String },

    /// Nested scopes or snapshot payloads exceed the configured depth.
    #[error("nesting exceeds {max_depth} levels")]
    DepthExceeded { max_depth: usize },

    /// The message runtime rejected a write.
    #[error(transparent)]
    Message(MessageError),

    #[error("snapshot conversion error: {0}")]
    Value(#[from] ValueError),
}

impl From<MessageError> for BuildError {
    fn from(err: MessageError) -> Self {
        match err {
            MessageError::UnknownField {
                message_type,
                field,
            } => Self::UnknownField {
                message_type,
                field,
            },
            MessageError::Value(e) => Self::Value(e),
            other => Self::Message(other),
        }
    }
}

/// Errors loading a [`crate::BuilderConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
