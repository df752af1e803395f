use crate::error::{SchemaError, SchemaResult};
use crate::message::Message;
use crate::value::Scalar;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Primitive field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Bool,
    Int32,
    Int64,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "uint64")]
    UInt64,
    Float,
    Double,
    String,
}

impl ScalarType {
    /// Schema-file spelling of the type.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
        }
    }

    /// The value a freshly constructed message holds for this type.
    #[must_use]
    pub fn default_value(self) -> Scalar {
        match self {
            Self::Bool => Scalar::Bool(false),
            Self::Int32 | Self::Int64 => Scalar::Int(0),
            Self::UInt32 | Self::UInt64 => Scalar::UInt(0),
            Self::Float | Self::Double => Scalar::Float(0.0),
            Self::String => Scalar::String(String::new()),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScalarType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" => Ok(Self::Bool),
            "int32" => Ok(Self::Int32),
            "int64" => Ok(Self::Int64),
            "uint32" => Ok(Self::UInt32),
            "uint64" => Ok(Self::UInt64),
            "float" => Ok(Self::Float),
            "double" => Ok(Self::Double),
            "string" => Ok(Self::String),
            other => Err(SchemaError::UnknownScalarType(other.to_string())),
        }
    }
}

/// Zero-or-one versus ordered multi-valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Singular,
    Repeated,
}

/// Value type of a map field. Map keys are always strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapValue {
    Scalar(ScalarType),
    Message(String),
}

/// What a field holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Scalar(ScalarType),
    /// Nested message, by fully qualified type name.
    Message(String),
    Map(MapValue),
}

/// Schema metadata for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub cardinality: Cardinality,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    fn singular(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::Singular,
            kind,
        }
    }

    /// Singular scalar field of the given type.
    pub fn scalar(name: &str, scalar: ScalarType) -> Self {
        Self::singular(name, FieldKind::Scalar(scalar))
    }

    /// Shorthand for a string field.
    pub fn string(name: &str) -> Self {
        Self::scalar(name, ScalarType::String)
    }

    /// Shorthand for a boolean field.
    pub fn bool(name: &str) -> Self {
        Self::scalar(name, ScalarType::Bool)
    }

    /// Shorthand for a 64-bit signed integer field.
    pub fn int64(name: &str) -> Self {
        Self::scalar(name, ScalarType::Int64)
    }

    /// Shorthand for a double field.
    pub fn double(name: &str) -> Self {
        Self::scalar(name, ScalarType::Double)
    }

    /// Singular nested message field.
    pub fn message(name: &str, type_name: &str) -> Self {
        Self::singular(name, FieldKind::Message(type_name.into()))
    }

    /// Map field with string keys and scalar values.
    pub fn map(name: &str, value: ScalarType) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::Repeated,
            kind: FieldKind::Map(MapValue::Scalar(value)),
        }
    }

    /// Map field with string keys and message values.
    pub fn message_map(name: &str, type_name: &str) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::Repeated,
            kind: FieldKind::Map(MapValue::Message(type_name.into())),
        }
    }

    /// Turns this field into a repeated field.
    #[must_use]
    pub fn repeated(mut self) -> Self {
        self.cardinality = Cardinality::Repeated;
        self
    }

    #[must_use]
    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }

    /// True for singular or repeated message fields (not maps).
    #[must_use]
    pub fn is_message(&self) -> bool {
        matches!(self.kind, FieldKind::Message(_))
    }

    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self.kind, FieldKind::Map(_))
    }

    /// The nested message type this field instantiates, if any.
    #[must_use]
    pub fn message_type_name(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Message(name) | FieldKind::Map(MapValue::Message(name)) => Some(name),
            _ => None,
        }
    }
}

/// Declaration of one message type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSchema {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl MessageSchema {
    pub fn new(name: &str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// A validated message type with an index over its fields.
#[derive(Debug)]
pub struct MessageDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
    by_name: HashMap<String, usize>,
}

impl MessageDescriptor {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Case-sensitive exact lookup.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&idx| &self.fields[idx])
    }

    /// Declaration index of a field.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }
}

/// Immutable set of message types whose cross references all resolve.
#[derive(Debug)]
pub struct DescriptorPool {
    messages: Vec<MessageDescriptor>,
    by_name: HashMap<String, usize>,
}

impl DescriptorPool {
    /// Validates the schemas and builds the pool.
    pub fn new(schemas: Vec<MessageSchema>) -> SchemaResult<Arc<Self>> {
        let mut by_name = HashMap::new();
        for (idx, schema) in schemas.iter().enumerate() {
            if schema.name.is_empty() {
                return Err(SchemaError::InvalidName(schema.name.clone()));
            }
            if by_name.insert(schema.name.clone(), idx).is_some() {
                return Err(SchemaError::DuplicateType(schema.name.clone()));
            }
        }

        let mut messages = Vec::with_capacity(schemas.len());
        for schema in schemas {
            validate_fields(&schema, &by_name)?;

            let field_index = schema
                .fields
                .iter()
                .enumerate()
                .map(|(idx, f)| (f.name.clone(), idx))
                .collect();
            messages.push(MessageDescriptor {
                name: schema.name,
                fields: schema.fields,
                by_name: field_index,
            });
        }

        Ok(Arc::new(Self { messages, by_name }))
    }

    /// Handle to a message type by fully qualified name.
    pub fn message_type(self: &Arc<Self>, name: &str) -> Option<MessageType> {
        self.by_name.get(name).map(|&index| MessageType {
            pool: Arc::clone(self),
            index,
        })
    }

    /// Type names in declaration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|m| m.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn validate_fields(schema: &MessageSchema, types: &HashMap<String, usize>) -> SchemaResult<()> {
    let mut seen = HashSet::new();
    for field in &schema.fields {
        if field.name.is_empty() {
            return Err(SchemaError::InvalidName(field.name.clone()));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                message: schema.name.clone(),
                field: field.name.clone(),
            });
        }
        if field.is_map() && !field.is_repeated() {
            return Err(SchemaError::MapNotRepeated {
                message: schema.name.clone(),
                field: field.name.clone(),
            });
        }
        if let Some(target) = field.message_type_name() {
            if !types.contains_key(target) {
                return Err(SchemaError::UnresolvedType {
                    message: schema.name.clone(),
                    field: field.name.clone(),
                    target: target.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Cheap, clonable handle to one type inside a [`DescriptorPool`].
#[derive(Clone)]
pub struct MessageType {
    pool: Arc<DescriptorPool>,
    index: usize,
}

impl MessageType {
    #[must_use]
    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.pool.messages[self.index]
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor().name()
    }

    /// Case-sensitive exact field lookup.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.descriptor().field(name)
    }

    /// Resolves another type from the same pool.
    #[must_use]
    pub fn resolve(&self, type_name: &str) -> Option<MessageType> {
        self.pool.message_type(type_name)
    }

    /// The nested type instantiated by a message or message-map field.
    #[must_use]
    pub fn nested_type(&self, field: &FieldDescriptor) -> Option<MessageType> {
        field
            .message_type_name()
            .and_then(|name| self.resolve(name))
    }

    #[must_use]
    pub fn pool(&self) -> &Arc<DescriptorPool> {
        &self.pool
    }

    /// An empty, default-initialized instance.
    #[must_use]
    pub fn new_instance(&self) -> Message {
        Message::new(self.clone())
    }
}

impl PartialEq for MessageType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.pool, &other.pool) && self.index == other.index
    }
}

impl Eq for MessageType {}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageType").field(&self.name()).finish()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
