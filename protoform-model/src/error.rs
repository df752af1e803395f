//! Error types for schemas, messages and value conversion.

use thiserror::Error;

/// Result type for schema construction and loading.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for message reflection operations.
pub type MessageResult<T> = Result<T, MessageError>;

/// Errors raised while building a [`crate::DescriptorPool`].
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Two message types share a name.
    #[error("duplicate message type: {0}")]
    DuplicateType(String),

    /// A message declares the same field name twice.
    #[error("duplicate field '{field}' in message {message}")]
    DuplicateField { message: String, field: String },

    /// Empty type or field name.
    #[error("invalid name {0:?}")]
    InvalidName(String),

    /// A message-typed field points at a type the pool does not contain.
    #[error("field '{field}' in message {message} references unknown type {target}")]
    UnresolvedType {
        message: String,
        field: String,
        target: String,
    },

    /// Map fields are always repeated.
    #[error("map field '{field}' in message {message} must be repeated")]
    MapNotRepeated { message: String, field: String },

    /// A schema file field definition is incomplete or contradictory.
    #[error("field '{field}' in message {message}: {reason}")]
    InvalidField {
        message: String,
        field: String,
        reason: String,
    },

    /// Unrecognized scalar type name in a schema file.
    #[error("unknown scalar type: {0}")]
    UnknownScalarType(String),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the message runtime.
#[derive(Debug, Error)]
pub enum MessageError {
    /// The message type has no field with this name.
    #[error("unknown field {field} on {message_type}")]
    UnknownField { message_type: String, field: String },

    /// The value's shape or scalar kind does not fit the field.
    #[error("field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },

    /// A numeric value does not fit the field's integer type.
    #[error("value {value} out of range for {expected} field '{field}'")]
    OutOfRange {
        field: String,
        expected: &'static str,
        value: String,
    },

    /// A prefab message of another type was assigned to a message field.
    #[error("field '{field}' expects message {expected}, got {found}")]
    WrongMessageType {
        field: String,
        expected: String,
        found: String,
    },

    /// The operation does not apply to this field's cardinality or kind.
    #[error("field '{field}' is not a {expected} field")]
    WrongShape {
        field: String,
        expected: &'static str,
    },

    /// Constructor payloads must be mappings keyed by field name.
    #[error("cannot construct {message_type} from {found}")]
    InvalidPayload {
        message_type: String,
        found: &'static str,
    },

    /// The nested type named by a field is missing from the pool.
    #[error("field '{field}' references unknown type {target}")]
    UnresolvedType { field: String, target: String },

    #[error("value conversion error: {0}")]
    Value(#[from] ValueError),
}

/// Errors converting plain JSON into [`crate::Value`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    /// `null` has no counterpart in the value model.
    #[error("null is not a value")]
    Null,

    /// A number that is neither an integer nor a finite float.
    #[error("unsupported number: {0}")]
    UnsupportedNumber(String),
}
