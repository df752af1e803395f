//! Schema documents in TOML or JSON.
//!
//! ```toml
//! package = "shop"
//!
//! [[messages]]
//! name = "Person"
//! fields = [
//!     { name = "name", type = "string" },
//!     { name = "friends", type = "message", message = "Person", repeated = true },
//!     { name = "favourite_foods", type = "map", value = "string" },
//! ]
//! ```

use crate::error::{SchemaError, SchemaResult};
use crate::schema::{
    Cardinality, DescriptorPool, FieldDescriptor, FieldKind, MapValue, MessageSchema, ScalarType,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Raw schema document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaFile {
    /// Prefix applied to every type name and unqualified message reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default)]
    pub messages: Vec<MessageDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// One field line. `type` is a scalar name, `message` or `map`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub repeated: bool,
    /// Nested type for `message` fields and message-valued maps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Value type for `map` fields: a scalar name or `message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl SchemaFile {
    pub fn from_toml_str(contents: &str) -> SchemaResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_json_str(contents: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Reads a schema document; `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: &Path) -> SchemaResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let file = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&contents)?,
            _ => Self::from_toml_str(&contents)?,
        };
        debug!(
            "Loaded schema file {:?} ({} message types)",
            path,
            file.messages.len()
        );
        Ok(file)
    }

    fn qualify(&self, name: &str) -> String {
        match &self.package {
            Some(pkg) if !pkg.is_empty() && !name.contains('.') => format!("{pkg}.{name}"),
            _ => name.to_string(),
        }
    }

    /// Converts the document into message schemas with qualified names.
    pub fn into_schemas(self) -> SchemaResult<Vec<MessageSchema>> {
        self.messages
            .iter()
            .map(|def| {
                let name = self.qualify(&def.name);
                let fields = def
                    .fields
                    .iter()
                    .map(|field| self.field_descriptor(&name, field))
                    .collect::<SchemaResult<Vec<_>>>()?;
                Ok(MessageSchema { name, fields })
            })
            .collect()
    }

    /// Parses and validates the document into a pool.
    pub fn into_pool(self) -> SchemaResult<Arc<DescriptorPool>> {
        DescriptorPool::new(self.into_schemas()?)
    }

    fn field_descriptor(&self, message: &str, def: &FieldDef) -> SchemaResult<FieldDescriptor> {
        let invalid = |reason: &str| SchemaError::InvalidField {
            message: message.to_string(),
            field: def.name.clone(),
            reason: reason.to_string(),
        };
        let nested = || {
            def.message
                .as_deref()
                .map(|m| self.qualify(m))
                .ok_or_else(|| invalid("missing `message` type"))
        };

        let (kind, cardinality) = match def.type_name.as_str() {
            "message" => (FieldKind::Message(nested()?), def.repeated),
            "map" => {
                let value = match def.value.as_deref() {
                    Some("message") => MapValue::Message(nested()?),
                    Some(scalar) => MapValue::Scalar(scalar.parse::<ScalarType>()?),
                    None => return Err(invalid("missing map `value` type")),
                };
                (FieldKind::Map(value), true)
            }
            scalar => (FieldKind::Scalar(scalar.parse::<ScalarType>()?), def.repeated),
        };

        Ok(FieldDescriptor {
            name: def.name.clone(),
            cardinality: if cardinality {
                Cardinality::Repeated
            } else {
                Cardinality::Singular
            },
            kind,
        })
    }
}

impl DescriptorPool {
    /// Loads and validates a schema document from disk.
    pub fn load(path: &Path) -> SchemaResult<Arc<Self>> {
        SchemaFile::load(path)?.into_pool()
    }
}
