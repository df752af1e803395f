//! Schema and message runtime for protoform.
//!
//! Defines the reflection surface the builder consumes:
//! - [`DescriptorPool`] / [`MessageType`]: validated message schemas, looked up by name
//! - [`FieldDescriptor`]: per-field cardinality and kind (scalar, message, map)
//! - [`Message`]: a mutable, schema-typed record with get/set/push/replace and map entries
//! - [`Value`] / [`Scalar`]: the tagged value model used for arguments, storage and snapshots
//!
//! Schemas can be declared in code with the [`FieldDescriptor`] shorthands or
//! loaded from TOML/JSON documents through [`SchemaFile`].

mod error;
mod file;
mod message;
mod schema;
mod value;

pub use error::{MessageError, MessageResult, SchemaError, SchemaResult, ValueError};
pub use file::{FieldDef, MessageDef, SchemaFile};
pub use message::Message;
pub use schema::{
    Cardinality, DescriptorPool, FieldDescriptor, FieldKind, MapValue, MessageDescriptor,
    MessageSchema, MessageType, ScalarType,
};
pub use value::{Scalar, Value};
